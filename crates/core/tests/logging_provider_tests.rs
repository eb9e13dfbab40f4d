//! Logging installed through the provider lifecycle
//!
//! Kept in its own test binary because it installs the global subscriber.

use keystone_core::{
    init_logging, AppConfig, Container, Environment, LoggingConfig, LoggingProvider,
    APP_CONFIG_NAME,
};

#[tokio::test]
async fn test_logging_provider_installs_subscriber_once() {
    let mut container = Container::new();
    container.register(LoggingProvider::new(AppConfig::testing()));

    container.boot().await.unwrap();

    let config = container.get::<AppConfig>(APP_CONFIG_NAME).await.unwrap();
    assert_eq!(config.environment, Environment::Testing);
    // The global subscriber is already taken
    assert!(init_logging(LoggingConfig::test()).is_err());

    container.close().await.unwrap();
    container.boot().await.unwrap();
    assert!(container.is_booted());
}
