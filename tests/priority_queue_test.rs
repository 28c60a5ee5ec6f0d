//! Integration tests for the blocking priority queue.
//!
//! Covers ordering, capacity rejection, close semantics and concurrent
//! producer/consumer use of `SafePriorityQueue` and `PriorityTaskQueue`.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use prometheus_dispatch::core::{QueueError, Task, TaskQueue};
use prometheus_dispatch::infra::{PriorityTaskQueue, SafePriorityQueue};
use rand::seq::SliceRandom;

// ============================================================================
// HELPERS
// ============================================================================

fn task(id: usize, priority: i64) -> Task {
    Task::new(format!("task-{id}"), "any").with_priority(priority)
}

fn drain(queue: &SafePriorityQueue) -> Vec<Task> {
    let mut out = Vec::new();
    while let Ok(task) = queue.try_pop() {
        out.push(task);
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_mixed_priorities_pop_by_level() {
    let queue = PriorityTaskQueue::new(10);
    let priorities = [2, 0, 1, 0, 2, 1, 0, 2, 1, 0];
    for (i, p) in priorities.iter().enumerate() {
        queue.add_task(task(i, *p)).expect("within capacity");
    }
    assert_eq!(queue.len(), 10);

    let popped: Vec<i64> = (0..priorities.len())
        .map(|_| queue.get_task().expect("queued task").priority())
        .collect();

    assert_eq!(popped, vec![0, 0, 0, 0, 1, 1, 1, 2, 2, 2]);
}

#[test]
fn test_push_beyond_capacity_is_rejected() {
    let queue = PriorityTaskQueue::new(3);
    for i in 0..3 {
        queue.add_task(task(i, 1)).unwrap();
    }

    assert_eq!(
        queue.add_task(task(3, 0)),
        Err(QueueError::QueueFull { capacity: 3 })
    );
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.active_tasks(), 3);
}

#[test]
fn test_random_distinct_priorities_come_out_sorted() {
    let mut priorities: Vec<i64> = (0..200).collect();
    priorities.shuffle(&mut rand::rng());

    let queue = SafePriorityQueue::new();
    for (i, p) in priorities.iter().enumerate() {
        queue.push(task(i, *p)).unwrap();
    }

    let popped: Vec<i64> = drain(&queue).iter().map(Task::priority).collect();
    let expected: Vec<i64> = (0..200).collect();
    assert_eq!(popped, expected);
}

#[test]
fn test_unprioritized_tasks_sort_last() {
    let queue = SafePriorityQueue::new();
    queue.push(Task::new("plain", "any")).unwrap();
    queue.push(task(1, 1_000)).unwrap();
    queue.push(task(2, -5)).unwrap();

    let ids: Vec<String> = drain(&queue).iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids, vec!["task-2", "task-1", "plain"]);
}

#[test]
fn test_close_then_pop_reports_end_of_queue() {
    let queue = SafePriorityQueue::new();
    queue.push(task(0, 0)).unwrap();
    queue.close();

    // Close is sticky and rejects producers, but queued work still drains.
    assert_eq!(queue.push(task(1, 0)), Err(QueueError::Closed));
    assert_eq!(queue.pop().map(|t| t.id().to_string()), Ok("task-0".to_string()));
    assert_eq!(queue.pop().err(), Some(QueueError::EndOfQueue));
    assert_eq!(queue.pop().err(), Some(QueueError::EndOfQueue));
}

#[test]
fn test_blocked_consumers_released_by_close() {
    let queue = Arc::new(SafePriorityQueue::new());
    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop().err())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    queue.close();

    for consumer in consumers {
        assert_eq!(consumer.join().unwrap(), Some(QueueError::EndOfQueue));
    }
}

#[test]
fn test_concurrent_producers_and_consumers_lose_nothing() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let queue = Arc::new(SafePriorityQueue::new());

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Ok(task) = queue.pop() {
                    seen.push(task.id().to_string());
                }
                seen
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let id = p * PER_PRODUCER + i;
                    queue.push(task(id, (id % 7) as i64)).unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    queue.close();

    let mut total = 0;
    let mut ids = HashSet::new();
    for consumer in consumers {
        for id in consumer.join().unwrap() {
            total += 1;
            ids.insert(id);
        }
    }

    assert_eq!(total, PRODUCERS * PER_PRODUCER);
    assert_eq!(ids.len(), PRODUCERS * PER_PRODUCER);
    assert!(queue.is_empty());
}

#[test]
fn test_wait_for_tasks_returns_after_all_acks() {
    let queue = Arc::new(PriorityTaskQueue::new(8));
    for i in 0..5 {
        queue.add_task(task(i, 0)).unwrap();
    }

    let worker = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for _ in 0..5 {
                queue.get_task().unwrap();
                thread::sleep(Duration::from_millis(5));
                queue.task_completed();
            }
        })
    };

    queue.wait_for_tasks();
    assert_eq!(queue.active_tasks(), 0);
    worker.join().unwrap();
}
