//! Priority routing combined with memory backends and the container

use keystone_core::Container;
use keystone_queue::{
    resolve_queue, MemoryQueue, Priority, PriorityQueue, Queue, QueueConfig, QueueProvider,
    SendOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Task {
    name: String,
}

fn task(name: &str) -> Task {
    Task {
        name: name.to_string(),
    }
}

fn tiers() -> Vec<Arc<MemoryQueue<Task>>> {
    ["critical", "default", "background"]
        .into_iter()
        .map(|name| Arc::new(MemoryQueue::new(QueueConfig::named(name))))
        .collect()
}

#[tokio::test]
async fn test_worker_drains_tiers_in_priority_order() {
    let tiers = tiers();
    let queue = PriorityQueue::new(vec![
        (Arc::clone(&tiers[2]) as Arc<dyn Queue<Task>>, Priority::LOWEST),
        (Arc::clone(&tiers[0]) as Arc<dyn Queue<Task>>, Priority::HIGH),
        (Arc::clone(&tiers[1]) as Arc<dyn Queue<Task>>, Priority::NORMAL),
    ]);

    let sends = [
        ("cleanup", Priority::LOW),
        ("invoice", Priority::NORMAL),
        ("page-oncall", Priority::HIGHEST),
        ("thumbnail", Priority(-20)),
        ("receipt", Priority(2)),
    ];
    for (name, priority) in sends {
        queue
            .send(task(name), SendOptions::default().with_priority(priority))
            .await
            .unwrap();
    }

    assert_eq!(tiers[0].count_waiting().await.unwrap(), 1);
    assert_eq!(tiers[1].count_waiting().await.unwrap(), 2);
    assert_eq!(tiers[2].count_waiting().await.unwrap(), 2);
    assert_eq!(queue.count_waiting().await.unwrap(), 5);

    let mut processed = Vec::new();
    while let Some(job) = queue.receive().await.unwrap() {
        processed.push(job.payload().name.clone());
        queue.delete(&job).await.unwrap();
    }

    assert_eq!(
        processed,
        vec!["page-oncall", "invoice", "receipt", "cleanup", "thumbnail"]
    );
    assert_eq!(queue.count_running().await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_producers() {
    let tiers = tiers();
    let queue = Arc::new(PriorityQueue::new(
        tiers
            .iter()
            .zip([Priority::HIGH, Priority::NORMAL, Priority::LOW])
            .map(|(tier, priority)| (Arc::clone(tier) as Arc<dyn Queue<Task>>, priority))
            .collect(),
    ));

    let mut handles = Vec::new();
    for producer in 0..4 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            for index in 0..25 {
                let priority = Priority(index % 3 * 5 - 5);
                queue
                    .send(
                        task(&format!("{}-{}", producer, index)),
                        SendOptions::default().with_priority(priority),
                    )
                    .await?;
            }
            Ok::<_, keystone_queue::QueueError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(queue.count_waiting().await.unwrap(), 100);
    queue.flush().await.unwrap();
    assert_eq!(queue.count_waiting().await.unwrap(), 0);
}

#[tokio::test]
async fn test_container_shares_one_queue() {
    let tiers = tiers();
    let mut container = Container::new();
    container.register(QueueProvider::prioritized(
        "queue",
        tiers
            .iter()
            .zip([Priority::HIGH, Priority::NORMAL, Priority::LOW])
            .map(|(tier, priority)| (Arc::clone(tier) as Arc<dyn Queue<Task>>, priority))
            .collect(),
    ));
    container.alias("jobs", "queue").unwrap();
    container.boot().await.unwrap();

    let producer = resolve_queue::<Task>(&mut container, "jobs").await.unwrap();
    let consumer = resolve_queue::<Task>(&mut container, "queue").await.unwrap();

    producer
        .send(task("hello"), SendOptions::default())
        .await
        .unwrap();
    let job = consumer.receive().await.unwrap().unwrap();
    assert_eq!(job.payload(), &task("hello"));
    job.done().await.unwrap();

    container.close().await.unwrap();
    for tier in &tiers {
        assert!(tier.is_closed());
    }
    let result = producer.send(task("late"), SendOptions::default()).await;
    assert!(result.is_err());
}
