use crate::config::AppConfig;
use crate::container::Container;
use crate::errors::ProviderError;
use crate::logging::init_logging;
use crate::providers::ServiceProvider;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Container name the application config is registered under
pub const APP_CONFIG_NAME: &str = "config";

/// Registers the [`AppConfig`] and installs the global tracing subscriber it
/// describes when the container boots.
///
/// The subscriber is installed once per provider; later boots only register
/// the config again.
pub struct LoggingProvider {
    config: AppConfig,
    installed: AtomicBool,
}

impl LoggingProvider {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            installed: AtomicBool::new(false),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ServiceProvider for LoggingProvider {
    fn name(&self) -> &str {
        "logging"
    }

    async fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
        container.set_value(APP_CONFIG_NAME, self.config.clone())?;
        Ok(())
    }

    async fn boot(&self, _container: &mut Container) -> Result<(), ProviderError> {
        if self.is_installed() {
            return Ok(());
        }

        init_logging(self.config.logging()).map_err(ProviderError::Other)?;
        self.installed.store(true, Ordering::Release);
        tracing::info!(
            app = %self.config.name,
            environment = ?self.config.environment,
            "Logging installed"
        );
        Ok(())
    }
}
