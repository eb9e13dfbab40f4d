use crate::errors::{ContainerError, ContainerResult};
use futures::future::BoxFuture;
use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A value held by the container
pub type Value = Arc<dyn Any + Send + Sync>;

/// Type-erased factory registered under a name
pub(crate) type Factory = Arc<dyn Fn() -> BoxFuture<'static, ContainerResult<Value>> + Send + Sync>;

/// Type-erased handler applied to a freshly constructed value
pub(crate) type AfterHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, ContainerResult<Value>> + Send + Sync>;

/// Downcast a stored value to the type the caller asked for
pub(crate) fn downcast<T: Any + Send + Sync>(name: &str, value: Value) -> ContainerResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

/// Registration metadata for a factory-backed name
#[derive(Default)]
pub struct Descriptor {
    frozen: bool,
    singleton: bool,
    after_handlers: Vec<AfterHandler>,
}

impl Descriptor {
    /// Create an unfrozen, non-singleton descriptor with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the registration as resolved. Frozen names can no longer be
    /// deleted or replaced.
    pub fn freeze(&mut self) -> &mut Self {
        self.frozen = true;
        self
    }

    /// Set the singleton flag.
    ///
    /// The container caches a resolved value only while this flag is unset,
    /// so a flagged registration runs its factory on every resolution.
    pub fn singleton(&mut self) -> &mut Self {
        self.singleton = true;
        self
    }

    pub(crate) fn push_after(&mut self, handler: AfterHandler) -> &mut Self {
        self.after_handlers.push(handler);
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Number of registered after-handlers
    pub fn handler_count(&self) -> usize {
        self.after_handlers.len()
    }

    pub(crate) fn after_handlers(&self) -> &[AfterHandler] {
        &self.after_handlers
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("frozen", &self.frozen)
            .field("singleton", &self.singleton)
            .field("after_handlers", &self.after_handlers.len())
            .finish()
    }
}

/// Fluent handle returned by [`Container::set_factory`](crate::Container::set_factory)
///
/// The handle carries the registered type so after-handlers work on typed
/// values instead of raw `Any`.
pub struct DescriptorHandle<'a, T> {
    name: String,
    descriptor: &'a mut Descriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> DescriptorHandle<'a, T>
where
    T: Any + Send + Sync,
{
    pub(crate) fn new(name: String, descriptor: &'a mut Descriptor) -> Self {
        Self {
            name,
            descriptor,
            _marker: PhantomData,
        }
    }

    /// See [`Descriptor::freeze`]
    pub fn freeze(self) -> Self {
        self.descriptor.freeze();
        self
    }

    /// See [`Descriptor::singleton`]
    pub fn singleton(self) -> Self {
        self.descriptor.singleton();
        self
    }

    /// Append a handler run after the factory, in registration order.
    ///
    /// Each handler receives the previous handler's output (the factory
    /// result for the first one) and returns its replacement.
    pub fn after<F, Fut, R>(self, handler: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ContainerResult<R>> + Send + 'static,
        R: Into<Arc<T>>,
    {
        let handler = Arc::new(handler);
        let name = self.name.clone();
        let erased: AfterHandler = Arc::new(move |value: Value| -> BoxFuture<'static, ContainerResult<Value>> {
            let handler = Arc::clone(&handler);
            let name = name.clone();
            Box::pin(async move {
                let typed = downcast::<T>(&name, value)?;
                let next: Arc<T> = handler(typed).await?.into();
                Ok(next as Value)
            })
        });
        self.descriptor.push_after(erased);
        self
    }

    /// Name this handle configures
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inspect the underlying descriptor
    pub fn descriptor(&self) -> &Descriptor {
        self.descriptor
    }
}
