//! In-memory queue backend implementation for development and testing

use crate::{Job, JobId, JobOwner, Queue, QueueConfig, QueueError, QueueResult, SendOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use uuid::Uuid;

/// Waiting job ordered for the heap
#[derive(Debug, Clone)]
struct PendingJob {
    id: JobId,
    payload: serde_json::Value,
    enqueued_at: DateTime<Utc>,
    run_at: DateTime<Utc>,
    sequence: u64,
}

impl PartialEq for PendingJob {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at && self.sequence == other.sequence
    }
}

impl Eq for PendingJob {}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier run_at first, then send order
        match other.run_at.cmp(&self.run_at) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            run_at_ord => run_at_ord,
        }
    }
}

#[derive(Debug)]
struct RunningJob {
    enqueued_at: DateTime<Utc>,
    received_at: DateTime<Utc>,
}

struct MemoryQueueState {
    config: QueueConfig,
    waiting: RwLock<BinaryHeap<PendingJob>>,
    running: DashMap<JobId, RunningJob>,
    sequence: AtomicU64,
    closed: AtomicBool,
}

impl MemoryQueueState {
    /// Push a job unless the queue is full
    ///
    /// The size check and the push share one write guard, and a received
    /// job enters `running` under the same guard, so concurrent senders
    /// never overshoot `max_queue_size`.
    fn push(&self, job: PendingJob) -> QueueResult<()> {
        let max_queue_size = *self.config.get_max_queue_size();
        let mut waiting = self.waiting.write();
        if max_queue_size > 0 && waiting.len() + self.running.len() >= max_queue_size {
            return Err(QueueError::Capacity(max_queue_size));
        }
        waiting.push(job);
        Ok(())
    }

    /// Pop the earliest job whose run_at has passed and mark it running
    fn next_ready(&self) -> Option<PendingJob> {
        let mut waiting = self.waiting.write();
        let ready = waiting.peek().is_some_and(|top| top.run_at <= Utc::now());
        if !ready {
            return None;
        }
        let pending = waiting.pop()?;
        self.running.insert(
            pending.id,
            RunningJob {
                enqueued_at: pending.enqueued_at,
                received_at: Utc::now(),
            },
        );
        Some(pending)
    }
}

#[async_trait]
impl JobOwner for MemoryQueueState {
    async fn acknowledge(&self, id: JobId) -> QueueResult<()> {
        match self.running.remove(&id) {
            Some((_, job)) => {
                tracing::debug!(
                    queue = %self.config.get_name(),
                    job_id = %id,
                    waited_ms = (job.received_at - job.enqueued_at).num_milliseconds(),
                    "Job deleted"
                );
                Ok(())
            }
            None => Err(QueueError::JobNotFound(id.to_string())),
        }
    }
}

/// In-memory queue backend
///
/// Payloads are stored as JSON, so a job survives exactly as its serialized
/// form. Clones share the same underlying queue.
pub struct MemoryQueue<P> {
    state: Arc<MemoryQueueState>,
    _payload: PhantomData<fn() -> P>,
}

impl<P> MemoryQueue<P> {
    /// Create a new memory queue
    pub fn new(config: QueueConfig) -> Self {
        Self {
            state: Arc::new(MemoryQueueState {
                config,
                waiting: RwLock::new(BinaryHeap::new()),
                running: DashMap::new(),
                sequence: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
            _payload: PhantomData,
        }
    }

    /// Queue configuration
    pub fn config(&self) -> &QueueConfig {
        &self.state.config
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(AtomicOrdering::Acquire)
    }
}

impl<P> Clone for MemoryQueue<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            _payload: PhantomData,
        }
    }
}

impl<P> std::fmt::Debug for MemoryQueue<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryQueue")
            .field("name", &self.state.config.get_name())
            .field("waiting", &self.state.waiting.read().len())
            .field("running", &self.state.running.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl<P> Queue<P> for MemoryQueue<P>
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn send(&self, payload: P, options: SendOptions) -> QueueResult<()> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        let now = Utc::now();
        let run_at = match options.delay {
            Some(delay) => {
                now + chrono::Duration::from_std(delay).map_err(|e| {
                    QueueError::Backend(format!("Invalid delay duration: {}", e))
                })?
            }
            None => now,
        };

        let job = PendingJob {
            id: Uuid::new_v4(),
            payload: serde_json::to_value(payload)?,
            enqueued_at: now,
            run_at,
            sequence: self.state.sequence.fetch_add(1, AtomicOrdering::Relaxed),
        };

        let job_id = job.id;
        self.state.push(job)?;
        tracing::debug!(
            queue = %self.state.config.get_name(),
            job_id = %job_id,
            delayed = options.delay.is_some(),
            "Job sent"
        );
        Ok(())
    }

    async fn receive(&self) -> QueueResult<Option<Job<P>>> {
        let Some(pending) = self.state.next_ready() else {
            return Ok(None);
        };

        let payload: P = serde_json::from_value(pending.payload).map_err(|e| {
            self.state.running.remove(&pending.id);
            tracing::warn!(
                queue = %self.state.config.get_name(),
                job_id = %pending.id,
                "Dropping job with unreadable payload: {}",
                e
            );
            QueueError::Serialization(e)
        })?;

        let owner: Arc<dyn JobOwner> = self.state.clone();
        Ok(Some(Job::new(pending.id, payload, pending.enqueued_at, owner)))
    }

    async fn delete(&self, job: &Job<P>) -> QueueResult<()> {
        self.state.acknowledge(job.id()).await?;
        job.mark_deleted();
        Ok(())
    }

    async fn count_waiting(&self) -> QueueResult<usize> {
        Ok(self.state.waiting.read().len())
    }

    async fn count_running(&self) -> QueueResult<usize> {
        Ok(self.state.running.len())
    }

    async fn flush(&self) -> QueueResult<()> {
        self.state.waiting.write().clear();
        self.state.running.clear();
        tracing::debug!(queue = %self.state.config.get_name(), "Queue flushed");
        Ok(())
    }

    async fn close(&self) -> QueueResult<()> {
        self.state.closed.store(true, AtomicOrdering::Release);
        tracing::info!(queue = %self.state.config.get_name(), "Queue closed");
        Ok(())
    }
}
