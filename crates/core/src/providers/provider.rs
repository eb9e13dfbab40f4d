use crate::container::Container;
use crate::errors::ProviderError;
use async_trait::async_trait;

/// A unit that plugs services into a [`Container`] and takes part in its
/// lifecycle.
///
/// `register` runs for every provider before any `boot`; `close` runs when
/// the container shuts down. All three receive the container and may change
/// its registrations.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Provider name used in logs and lifecycle errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Register services in the container
    async fn register(&self, container: &mut Container) -> Result<(), ProviderError>;

    /// Boot the provider once every provider has registered
    async fn boot(&self, container: &mut Container) -> Result<(), ProviderError> {
        let _ = container;
        Ok(())
    }

    /// Release resources when the container closes
    async fn close(&self, container: &mut Container) -> Result<(), ProviderError> {
        let _ = container;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct ConfigProvider;

    #[async_trait]
    impl ServiceProvider for ConfigProvider {
        fn name(&self) -> &str {
            "config"
        }

        async fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
            container.set_value("app.name", String::from("keystone"))?;
            Ok(())
        }
    }

    struct UnnamedProvider;

    #[async_trait]
    impl ServiceProvider for UnnamedProvider {
        async fn register(&self, _container: &mut Container) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_provider_registers_services() {
        let mut container = Container::new();
        container.register(ConfigProvider);
        container.boot().await.unwrap();

        let name: Arc<String> = container.get("app.name").await.unwrap();
        assert_eq!(name.as_str(), "keystone");
    }

    #[tokio::test]
    async fn test_default_lifecycle_hooks_succeed() {
        let mut container = Container::new();
        let provider = UnnamedProvider;

        provider.boot(&mut container).await.unwrap();
        provider.close(&mut container).await.unwrap();
        assert!(provider.name().ends_with("UnnamedProvider"));
    }
}
