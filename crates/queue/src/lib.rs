//! # keystone-queue
//!
//! Job queue contract for keystone applications.
//!
//! ## Features
//!
//! - **Queue contract**: send, receive, delete, counters, flush and close
//! - **Memory backend**: in-process queue with delayed delivery
//! - **Priority routing**: combine several queues and route by priority tier
//! - **Provider integration**: register queues in a keystone container
//!
//! ## Quick Start
//!
//! ```rust
//! use keystone_queue::{MemoryQueue, Priority, PriorityQueue, Queue, QueueConfig, SendOptions};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let urgent = Arc::new(MemoryQueue::<String>::new(QueueConfig::default()));
//! let bulk = Arc::new(MemoryQueue::<String>::new(QueueConfig::default()));
//!
//! let queue = PriorityQueue::new(vec![
//!     (urgent.clone() as Arc<dyn Queue<String>>, Priority::HIGH),
//!     (bulk.clone() as Arc<dyn Queue<String>>, Priority::LOW),
//! ]);
//!
//! queue
//!     .send("reindex".to_string(), SendOptions::default().with_priority(Priority::HIGHEST))
//!     .await
//!     .unwrap();
//! assert_eq!(urgent.count_waiting().await.unwrap(), 1);
//!
//! let job = queue.receive().await.unwrap().unwrap();
//! assert_eq!(job.payload(), "reindex");
//! queue.delete(&job).await.unwrap();
//! # });
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub mod backends;
pub mod config;
pub mod priority;
pub mod provider;

pub use backends::*;
pub use config::*;
pub use priority::*;
pub use provider::*;

/// Queue operation errors
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("cannot send: no queues to route to")]
    NoQueues,

    #[error("Queue is closed")]
    Closed,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue size limit exceeded: {0}")]
    Capacity(usize),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Job unique identifier
pub type JobId = Uuid;

/// Numeric job priority. Larger values are more urgent.
///
/// Named tiers cover the common cases; any integer is accepted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOWEST: Priority = Priority(-10);
    pub const LOW: Priority = Priority(-5);
    pub const NORMAL: Priority = Priority(0);
    pub const HIGH: Priority = Priority(5);
    pub const HIGHEST: Priority = Priority(10);

    pub fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options accepted by [`Queue::send`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Routing tier; combinators fall back to [`Priority::NORMAL`]
    pub priority: Option<Priority>,
    /// Hold the job back for this long before it can be received
    pub delay: Option<Duration>,
}

impl SendOptions {
    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Options forwarded to a member queue: the delay survives, the
    /// priority does not.
    pub fn delay_only(&self) -> Self {
        Self {
            priority: None,
            delay: self.delay,
        }
    }
}

/// The queue side of a received job, used to acknowledge it
#[async_trait]
pub trait JobOwner: Send + Sync {
    /// Remove a received job from its queue
    async fn acknowledge(&self, id: JobId) -> QueueResult<()>;
}

/// A received job
pub struct Job<P> {
    id: JobId,
    payload: P,
    enqueued_at: DateTime<Utc>,
    deleted: AtomicBool,
    owner: Arc<dyn JobOwner>,
}

impl<P> Job<P> {
    /// Create a job handed out by `owner`
    pub fn new(id: JobId, payload: P, enqueued_at: DateTime<Utc>, owner: Arc<dyn JobOwner>) -> Self {
        Self {
            id,
            payload,
            enqueued_at,
            deleted: AtomicBool::new(false),
            owner,
        }
    }

    /// Get job ID
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Get job payload
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the job, keeping the payload
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// When the job was sent
    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Whether the job has been acknowledged
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    /// Acknowledge the job, deleting it from the queue it came from
    pub async fn done(&self) -> QueueResult<()> {
        self.owner.acknowledge(self.id).await?;
        self.mark_deleted();
        Ok(())
    }

    pub(crate) fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release);
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for Job<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .field("enqueued_at", &self.enqueued_at)
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

/// Core queue trait that all queue implementations must implement
#[async_trait]
pub trait Queue<P>: Send + Sync
where
    P: Send + Sync + 'static,
{
    /// Enqueue a payload
    async fn send(&self, payload: P, options: SendOptions) -> QueueResult<()>;

    /// Take the next ready job, if any
    async fn receive(&self) -> QueueResult<Option<Job<P>>>;

    /// Delete a received job
    async fn delete(&self, job: &Job<P>) -> QueueResult<()>;

    /// Number of jobs not yet received, delayed ones included
    async fn count_waiting(&self) -> QueueResult<usize>;

    /// Number of jobs received but not yet deleted
    async fn count_running(&self) -> QueueResult<usize>;

    /// Drop every job
    async fn flush(&self) -> QueueResult<()>;

    /// Stop accepting jobs and release resources
    async fn close(&self) -> QueueResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullOwner;

    #[async_trait]
    impl JobOwner for NullOwner {
        async fn acknowledge(&self, _id: JobId) -> QueueResult<()> {
            Ok(())
        }
    }

    struct MissingOwner;

    #[async_trait]
    impl JobOwner for MissingOwner {
        async fn acknowledge(&self, id: JobId) -> QueueResult<()> {
            Err(QueueError::JobNotFound(id.to_string()))
        }
    }

    #[test]
    fn test_priority_tiers() {
        assert!(Priority::LOWEST < Priority::LOW);
        assert!(Priority::LOW < Priority::NORMAL);
        assert!(Priority::NORMAL < Priority::HIGH);
        assert!(Priority::HIGH < Priority::HIGHEST);
        assert_eq!(Priority::default(), Priority::NORMAL);
        assert_eq!(Priority::from(7).value(), 7);
    }

    #[test]
    fn test_priority_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Priority::HIGH).unwrap(), "5");
        let priority: Priority = serde_json::from_str("-10").unwrap();
        assert_eq!(priority, Priority::LOWEST);
    }

    #[test]
    fn test_delay_only_drops_priority() {
        let options = SendOptions::default()
            .with_priority(Priority::HIGH)
            .with_delay(Duration::from_secs(3));

        let forwarded = options.delay_only();
        assert_eq!(forwarded.priority, None);
        assert_eq!(forwarded.delay, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_done_marks_job_deleted() {
        let job = Job::new(Uuid::new_v4(), "payload", Utc::now(), Arc::new(NullOwner));
        assert!(!job.is_deleted());

        job.done().await.unwrap();
        assert!(job.is_deleted());
    }

    #[tokio::test]
    async fn test_failed_done_keeps_job() {
        let job = Job::new(Uuid::new_v4(), 1u8, Utc::now(), Arc::new(MissingOwner));

        assert!(matches!(job.done().await, Err(QueueError::JobNotFound(_))));
        assert!(!job.is_deleted());
    }
}
