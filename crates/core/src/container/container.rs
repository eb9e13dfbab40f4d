use crate::container::descriptor::{downcast, Descriptor, DescriptorHandle, Factory, Value};
use crate::errors::{ContainerError, ContainerResult, ProviderError};
use crate::providers::ServiceProvider;
use futures::future::BoxFuture;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Name-keyed dependency container
///
/// Names map to raw values, lazily resolved factories, or aliases of other
/// names. The container also owns the registered service providers and
/// drives them through register, boot and close.
///
/// Resolution takes `&mut self`, so a container is resolved by one caller at
/// a time. Share it behind `tokio::sync::Mutex` when several tasks need it.
pub struct Container {
    descriptors: HashMap<String, Descriptor>,
    instances: HashMap<String, Value>,
    factories: HashMap<String, Factory>,
    aliases: HashMap<String, String>,
    providers: Vec<Arc<dyn ServiceProvider>>,
    booted: bool,
}

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            instances: HashMap::new(),
            factories: HashMap::new(),
            aliases: HashMap::new(),
            providers: Vec::new(),
            booted: false,
        }
    }

    /// Register a ready-made value under `name`, replacing any previous
    /// registration for that name.
    pub fn set_value<T>(&mut self, name: impl Into<String>, value: T) -> ContainerResult<()>
    where
        T: Any + Send + Sync,
    {
        let name = name.into();
        self.remove(&name)?;

        tracing::debug!(name = %name, "Registering value");
        self.instances.insert(name, Arc::new(value));
        Ok(())
    }

    /// Register a factory under `name`, replacing any previous registration.
    ///
    /// The factory runs on resolution; the returned handle configures the
    /// registration before it is first resolved.
    pub fn set_factory<T, F, Fut>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> ContainerResult<DescriptorHandle<'_, T>>
    where
        T: Any + Send + Sync,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ContainerResult<T>> + Send + 'static,
    {
        let name = name.into();
        self.remove(&name)?;

        tracing::debug!(name = %name, "Registering factory");
        let factory: Factory = Arc::new(move || -> BoxFuture<'static, ContainerResult<Value>> {
            let pending = factory();
            Box::pin(async move { pending.await.map(|value| Arc::new(value) as Value) })
        });
        self.factories.insert(name.clone(), factory);

        let descriptor = self.descriptors.entry(name.clone()).or_default();
        Ok(DescriptorHandle::new(name, descriptor))
    }

    /// Redirect `name` to `target`. Aliases are chased at resolution time,
    /// so the target does not need to exist yet.
    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> ContainerResult<()> {
        let name = name.into();
        let target = target.into();
        self.remove(&name)?;

        tracing::debug!(name = %name, target = %target, "Registering alias");
        self.aliases.insert(name, target);
        Ok(())
    }

    /// Resolve `name` and downcast it to `T`
    pub async fn get<T>(&mut self, name: &str) -> ContainerResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let value = self.get_any(name).await?;
        downcast(name, value)
    }

    /// Resolve `name` without a type check.
    ///
    /// The requested name is frozen, aliases are followed, and a cached
    /// instance wins over the factory. Otherwise the factory runs, its result
    /// is threaded through the after-handlers, and the final value is cached
    /// unless the registration carries the singleton flag.
    pub async fn get_any(&mut self, name: &str) -> ContainerResult<Value> {
        if let Some(descriptor) = self.descriptors.get_mut(name) {
            descriptor.freeze();
        }

        let resolved = self.resolve_alias(name).to_string();

        if let Some(instance) = self.instances.get(&resolved) {
            tracing::trace!(name = %resolved, "Resolved cached instance");
            return Ok(Arc::clone(instance));
        }

        let (factory, handlers, cache) =
            match (self.factories.get(&resolved), self.descriptors.get(&resolved)) {
                (Some(factory), Some(descriptor)) => (
                    Arc::clone(factory),
                    descriptor.after_handlers().to_vec(),
                    !descriptor.is_singleton(),
                ),
                _ => return Err(ContainerError::not_defined(resolved)),
            };

        tracing::debug!(name = %resolved, handlers = handlers.len(), "Invoking factory");
        let mut value = factory().await?;
        for handler in handlers {
            value = handler(value).await?;
        }

        if cache {
            self.instances.insert(resolved, Arc::clone(&value));
        }

        Ok(value)
    }

    /// Remove every registration for the given names.
    ///
    /// Stops at the first frozen name; names before it stay removed.
    pub fn delete<I, S>(&mut self, names: I) -> ContainerResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.remove(name.as_ref())?;
        }
        Ok(())
    }

    /// Check whether anything is registered under `name`
    pub fn has(&self, name: &str) -> bool {
        self.instances.contains_key(name)
            || self.factories.contains_key(name)
            || self.aliases.contains_key(name)
    }

    /// Descriptor of a factory-backed name
    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.get(name)
    }

    /// Mutable descriptor of a factory-backed name, for configuring it after
    /// `set_factory` returned. Flags set once the name is cached have no
    /// effect on the cached instance.
    pub fn descriptor_mut(&mut self, name: &str) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(name)
    }

    /// Queue a provider for the next [`boot`](Self::boot)
    pub fn register<P>(&mut self, provider: P)
    where
        P: ServiceProvider + 'static,
    {
        tracing::debug!(provider = provider.name(), "Adding service provider");
        self.providers.push(Arc::new(provider));
    }

    /// Run `register` on every provider, then `boot` on every provider, in
    /// the order they were added. Does nothing when already booted.
    pub async fn boot(&mut self) -> Result<(), ProviderError> {
        if self.booted {
            return Ok(());
        }

        tracing::info!("Booting {} service providers", self.providers.len());

        let mut index = 0;
        while let Some(provider) = self.providers.get(index).cloned() {
            provider
                .register(self)
                .await
                .map_err(|e| ProviderError::RegistrationFailed {
                    provider: provider.name().to_string(),
                    error: Box::new(e),
                })?;
            index += 1;
        }

        let mut index = 0;
        while let Some(provider) = self.providers.get(index).cloned() {
            provider
                .boot(self)
                .await
                .map_err(|e| ProviderError::BootFailed {
                    provider: provider.name().to_string(),
                    error: Box::new(e),
                })?;
            index += 1;
        }

        self.booted = true;
        tracing::info!("Service providers booted");
        Ok(())
    }

    /// Run `close` on every provider in the order they were added. Does
    /// nothing unless booted; afterwards the container may be booted again.
    pub async fn close(&mut self) -> Result<(), ProviderError> {
        if !self.booted {
            return Ok(());
        }

        let mut index = 0;
        while let Some(provider) = self.providers.get(index).cloned() {
            provider
                .close(self)
                .await
                .map_err(|e| ProviderError::CloseFailed {
                    provider: provider.name().to_string(),
                    error: Box::new(e),
                })?;
            index += 1;
        }

        self.booted = false;
        tracing::info!("Service providers closed");
        Ok(())
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    fn resolve_alias<'a>(&'a self, mut name: &'a str) -> &'a str {
        while let Some(target) = self.aliases.get(name) {
            name = target;
        }
        name
    }

    fn remove(&mut self, name: &str) -> ContainerResult<()> {
        if self.descriptors.get(name).is_some_and(Descriptor::is_frozen) {
            return Err(ContainerError::frozen(name));
        }

        self.descriptors.remove(name);
        self.instances.remove(name);
        self.factories.remove(name);
        self.aliases.remove(name);
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("instances", &self.instances.len())
            .field("factories", &self.factories.len())
            .field("aliases", &self.aliases.len())
            .field("providers", &self.providers.len())
            .field("booted", &self.booted)
            .finish()
    }
}
