//! # keystone-core
//!
//! A name-keyed dependency container. Values are registered directly or
//! through async factories, resolved lazily, optionally cached, and shaped by
//! post-construction handlers. Service providers plug into the container's
//! register/boot/close lifecycle.
//!
//! ```rust
//! use keystone_core::Container;
//!
//! # tokio_test_block_on(async {
//! let mut container = Container::new();
//! container.set_value("greeting", String::from("hello")).unwrap();
//! container
//!     .set_factory("answer", || async { Ok(40u32) })
//!     .unwrap()
//!     .after(|value| async move { Ok(*value + 2) });
//!
//! assert_eq!(*container.get::<u32>("answer").await.unwrap(), 42);
//! assert_eq!(container.get::<String>("greeting").await.unwrap().as_str(), "hello");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(future)
//! # }
//! ```

pub mod config;
pub mod container;
pub mod errors;
pub mod logging;
pub mod providers;

pub use config::{AppConfig, AppConfigTrait, ConfigError, ConfigSource, Environment};
pub use container::{Container, Descriptor, DescriptorHandle, Value};
pub use errors::{BoxError, ContainerError, ContainerResult, ProviderError};
pub use logging::{init_logging, LoggingConfig};
pub use providers::{LoggingProvider, ServiceProvider, APP_CONFIG_NAME};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
