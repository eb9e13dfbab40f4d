//! Priority routing over several queues

use crate::{Job, Priority, Queue, QueueError, QueueResult, SendOptions};
use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;

/// A member queue and the lowest priority it accepts
pub struct PrioritizedQueue<P: Send + Sync + 'static> {
    pub queue: Arc<dyn Queue<P>>,
    pub priority: Priority,
}

impl<P: Send + Sync + 'static> Clone for PrioritizedQueue<P> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            priority: self.priority,
        }
    }
}

/// Routes sends to one of several queues by priority and drains them from
/// the most to the least urgent.
///
/// Members are sorted by descending priority once, at construction. Members
/// sharing a priority keep the order they were given in.
pub struct PriorityQueue<P: Send + Sync + 'static> {
    queues: Vec<PrioritizedQueue<P>>,
}

impl<P> PriorityQueue<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(queues: Vec<(Arc<dyn Queue<P>>, Priority)>) -> Self {
        let mut queues: Vec<PrioritizedQueue<P>> = queues
            .into_iter()
            .map(|(queue, priority)| PrioritizedQueue { queue, priority })
            .collect();
        queues.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { queues }
    }

    /// Members in routing order
    pub fn queues(&self) -> &[PrioritizedQueue<P>] {
        &self.queues
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Index of the member a send with `priority` goes to: the first one
    /// whose priority does not exceed it, else the least urgent one.
    pub fn route(&self, priority: Priority) -> Option<usize> {
        self.queues
            .iter()
            .position(|member| member.priority <= priority)
            .or_else(|| self.queues.len().checked_sub(1))
    }
}

/// Await every member operation, then report the first failure
///
/// Siblings of a failing member still run to completion.
async fn fan_out<T, F>(operations: impl IntoIterator<Item = F>) -> QueueResult<Vec<T>>
where
    F: Future<Output = QueueResult<T>>,
{
    join_all(operations).await.into_iter().collect()
}

impl<P: Send + Sync + 'static> std::fmt::Debug for PriorityQueue<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let priorities: Vec<Priority> = self.queues.iter().map(|member| member.priority).collect();
        f.debug_struct("PriorityQueue")
            .field("priorities", &priorities)
            .finish()
    }
}

#[async_trait]
impl<P> Queue<P> for PriorityQueue<P>
where
    P: Send + Sync + 'static,
{
    async fn send(&self, payload: P, options: SendOptions) -> QueueResult<()> {
        let priority = options.priority.unwrap_or(Priority::NORMAL);
        let index = self.route(priority).ok_or(QueueError::NoQueues)?;
        let member = &self.queues[index];

        tracing::debug!(
            requested = %priority,
            routed_to = %member.priority,
            "Routing job by priority"
        );
        member.queue.send(payload, options.delay_only()).await
    }

    async fn receive(&self) -> QueueResult<Option<Job<P>>> {
        for member in &self.queues {
            if let Some(job) = member.queue.receive().await? {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    async fn delete(&self, job: &Job<P>) -> QueueResult<()> {
        job.done().await
    }

    async fn count_waiting(&self) -> QueueResult<usize> {
        let counts = fan_out(self.queues.iter().map(|member| member.queue.count_waiting())).await?;
        Ok(counts.into_iter().sum())
    }

    async fn count_running(&self) -> QueueResult<usize> {
        let counts = fan_out(self.queues.iter().map(|member| member.queue.count_running())).await?;
        Ok(counts.into_iter().sum())
    }

    async fn flush(&self) -> QueueResult<()> {
        fan_out(self.queues.iter().map(|member| member.queue.flush())).await?;
        Ok(())
    }

    async fn close(&self) -> QueueResult<()> {
        fan_out(self.queues.iter().map(|member| member.queue.close())).await?;
        Ok(())
    }
}
