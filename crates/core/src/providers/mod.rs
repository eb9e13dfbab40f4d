pub mod logging;
pub mod provider;

pub use logging::{LoggingProvider, APP_CONFIG_NAME};
pub use provider::*;
