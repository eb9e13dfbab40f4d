//! Queue configuration types and builders

use serde::{Deserialize, Serialize};
use service_builder::builder;

/// Configuration for queue backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[builder]
pub struct QueueConfig {
    /// Queue name used in logs
    #[builder(default = "\"default\".to_string()", getter)]
    pub name: String,

    /// Maximum number of waiting and running jobs (0 = unlimited)
    #[builder(default = "0", getter)]
    pub max_queue_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_queue_size: 0,
        }
    }
}

impl QueueConfig {
    /// Default configuration under another name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl QueueConfigBuilder {
    /// Unbounded queue for local work
    pub fn development() -> Self {
        QueueConfigBuilder::new().max_queue_size(0)
    }

    /// Bounded queue so runaway producers fail fast
    pub fn production() -> Self {
        QueueConfigBuilder::new().max_queue_size(100_000)
    }

    /// Small bound that keeps test fixtures honest
    pub fn testing() -> Self {
        QueueConfigBuilder::new()
            .name("test".to_string())
            .max_queue_size(100)
    }
}
