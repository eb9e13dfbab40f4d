//! Container integration for SQLite connections

use crate::backends::SqliteConnection;
use crate::config::DatabaseConfig;
use crate::connection::Connection;
use async_trait::async_trait;
use keystone_core::{Container, ContainerError, ProviderError, ServiceProvider};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default container name of the connection
pub const DEFAULT_CONNECTION_NAME: &str = "database";

/// Registers a lazily opened [`SqliteConnection`] and closes it when the
/// container closes.
///
/// Resolve it with `container.get::<SqliteConnection>(name)`. Booting the
/// container again reopens a connection that was resolved before the
/// previous close, so the cached handle stays usable.
pub struct DatabaseProvider {
    name: String,
    config: DatabaseConfig,
    opened: Arc<Mutex<Vec<Arc<SqliteConnection>>>>,
    registered: AtomicBool,
}

impl DatabaseProvider {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            name: DEFAULT_CONNECTION_NAME.to_string(),
            config,
            opened: Arc::new(Mutex::new(Vec::new())),
            registered: AtomicBool::new(false),
        }
    }

    /// Register under another container name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn connection_name(&self) -> &str {
        &self.name
    }

    fn opened(&self) -> Vec<Arc<SqliteConnection>> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl ServiceProvider for DatabaseProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
        let frozen = container
            .descriptor(&self.name)
            .is_some_and(|descriptor| descriptor.is_frozen());
        if frozen && self.registered.load(Ordering::Acquire) {
            tracing::debug!(name = %self.name, "Connection already resolved, keeping registration");
            return Ok(());
        }

        let config = self.config.clone();
        let opened = Arc::clone(&self.opened);

        container
            .set_factory(self.name.clone(), move || {
                let config = config.clone();
                async move {
                    SqliteConnection::connect(&config)
                        .await
                        .map_err(ContainerError::construction)
                }
            })?
            .after(move |connection: Arc<SqliteConnection>| {
                opened.lock().push(Arc::clone(&connection));
                async move { Ok(connection) }
            });

        self.registered.store(true, Ordering::Release);
        Ok(())
    }

    async fn boot(&self, _container: &mut Container) -> Result<(), ProviderError> {
        for connection in self.opened() {
            if connection.is_closed().await {
                tracing::info!(filename = connection.filename(), "Reopening database connection");
                connection.reopen().await.map_err(ProviderError::other)?;
            }
        }
        Ok(())
    }

    async fn close(&self, _container: &mut Container) -> Result<(), ProviderError> {
        for connection in self.opened() {
            tracing::info!(filename = connection.filename(), "Closing database connection");
            connection.close().await.map_err(ProviderError::other)?;
        }
        Ok(())
    }
}
