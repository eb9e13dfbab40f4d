//! Container integration for queues

use crate::{Priority, PriorityQueue, Queue};
use async_trait::async_trait;
use keystone_core::{Container, ContainerResult, ProviderError, ServiceProvider};
use std::sync::Arc;

/// Registers a queue under a container name and closes it with the container.
///
/// The queue is stored as `Arc<dyn Queue<P>>`; use [`resolve_queue`] to get
/// it back. The provider is named after its container name.
pub struct QueueProvider<P: Send + Sync + 'static> {
    name: String,
    queue: Arc<dyn Queue<P>>,
}

impl<P> QueueProvider<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, queue: Arc<dyn Queue<P>>) -> Self {
        Self {
            name: name.into(),
            queue,
        }
    }

    /// Register a [`PriorityQueue`] over the given members
    pub fn prioritized(name: impl Into<String>, queues: Vec<(Arc<dyn Queue<P>>, Priority)>) -> Self {
        Self::new(name, Arc::new(PriorityQueue::new(queues)))
    }

    /// Container name the queue is registered under
    pub fn queue_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<P> ServiceProvider for QueueProvider<P>
where
    P: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn register(&self, container: &mut Container) -> Result<(), ProviderError> {
        container.set_value(self.name.clone(), Arc::clone(&self.queue))?;
        Ok(())
    }

    async fn close(&self, _container: &mut Container) -> Result<(), ProviderError> {
        tracing::info!(queue = %self.name, "Closing queue");
        self.queue.close().await.map_err(ProviderError::other)
    }
}

/// Resolve a queue registered by [`QueueProvider`]
pub async fn resolve_queue<P>(container: &mut Container, name: &str) -> ContainerResult<Arc<dyn Queue<P>>>
where
    P: Send + Sync + 'static,
{
    let queue = container.get::<Arc<dyn Queue<P>>>(name).await?;
    Ok(Arc::clone(&queue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryQueue, QueueConfig, SendOptions};

    #[tokio::test]
    async fn test_provider_registers_and_closes_queue() {
        let memory = Arc::new(MemoryQueue::<String>::new(QueueConfig::named("mail")));
        let mut container = Container::new();
        container.register(QueueProvider::new(
            "queue.mail",
            Arc::clone(&memory) as Arc<dyn Queue<String>>,
        ));
        container.boot().await.unwrap();

        let queue = resolve_queue::<String>(&mut container, "queue.mail").await.unwrap();
        queue.send("hello".to_string(), SendOptions::default()).await.unwrap();
        assert_eq!(memory.count_waiting().await.unwrap(), 1);

        container.close().await.unwrap();
        assert!(memory.is_closed());
    }

    #[tokio::test]
    async fn test_prioritized_provider() {
        let urgent = Arc::new(MemoryQueue::<u32>::new(QueueConfig::named("urgent")));
        let bulk = Arc::new(MemoryQueue::<u32>::new(QueueConfig::named("bulk")));
        let mut container = Container::new();
        container.register(QueueProvider::prioritized(
            "queue",
            vec![
                (Arc::clone(&bulk) as Arc<dyn Queue<u32>>, Priority::LOW),
                (Arc::clone(&urgent) as Arc<dyn Queue<u32>>, Priority::HIGH),
            ],
        ));
        container.boot().await.unwrap();

        let queue = resolve_queue::<u32>(&mut container, "queue").await.unwrap();
        queue
            .send(1, SendOptions::default().with_priority(Priority::HIGHEST))
            .await
            .unwrap();
        queue.send(2, SendOptions::default()).await.unwrap();

        assert_eq!(urgent.count_waiting().await.unwrap(), 1);
        assert_eq!(bulk.count_waiting().await.unwrap(), 1);

        container.close().await.unwrap();
        assert!(urgent.is_closed());
        assert!(bulk.is_closed());
    }

    #[tokio::test]
    async fn test_reboot_after_resolving_queue() {
        let memory = Arc::new(MemoryQueue::<String>::new(QueueConfig::named("mail")));
        let mut container = Container::new();
        container.register(QueueProvider::new(
            "queue.mail",
            Arc::clone(&memory) as Arc<dyn Queue<String>>,
        ));
        container.boot().await.unwrap();
        resolve_queue::<String>(&mut container, "queue.mail").await.unwrap();

        container.close().await.unwrap();
        container.boot().await.unwrap();

        assert!(container.is_booted());
        let queue = resolve_queue::<String>(&mut container, "queue.mail").await.unwrap();
        assert_eq!(queue.count_waiting().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_errors_name_the_failing_queue() {
        let mut container = Container::new();
        // A factory-backed "queue.bulk" was already resolved
        container.set_factory("queue.bulk", || async { Ok(0u8) }).unwrap();
        container.get::<u8>("queue.bulk").await.unwrap();

        for name in ["queue.mail", "queue.bulk"] {
            container.register(QueueProvider::new(
                name,
                Arc::new(MemoryQueue::<String>::new(QueueConfig::named(name)))
                    as Arc<dyn Queue<String>>,
            ));
        }

        let error = container.boot().await.unwrap_err();
        assert!(matches!(error, ProviderError::RegistrationFailed { .. }));
        assert_eq!(error.provider(), Some("queue.bulk"));
    }

    #[tokio::test]
    async fn test_resolve_with_wrong_payload_type() {
        let mut container = Container::new();
        container.register(QueueProvider::new(
            "queue",
            Arc::new(MemoryQueue::<String>::new(QueueConfig::default())) as Arc<dyn Queue<String>>,
        ));
        container.boot().await.unwrap();

        assert!(resolve_queue::<u32>(&mut container, "queue").await.is_err());
    }
}
