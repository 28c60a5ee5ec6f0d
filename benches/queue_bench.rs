//! Benchmarks for the dispatch queues and worker pool.
//!
//! Benchmarks cover:
//! - Raw heap push/pop and arbitrary removal
//! - Locked priority queue under a single thread and under contention
//! - Channel queue enqueue/fetch
//! - End-to-end pool drain

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use prometheus_dispatch::builders::build_pool;
use prometheus_dispatch::config::{QueueMode, WorkerPoolConfig};
use prometheus_dispatch::core::{Fetch, ProcessorRegistry, Task, TaskQueue};
use prometheus_dispatch::infra::queue::{ChannelTaskQueue, PriorityHeap, SafePriorityQueue};

// ============================================================================
// Helper Functions
// ============================================================================

fn build_task(id: u64) -> Task {
    // Mixed priorities so the heap actually reorders.
    let priority = i64::try_from(id.wrapping_mul(7_919) % 1_000).unwrap_or_default();
    Task::new(format!("task-{id}"), "bench").with_priority(priority)
}

fn bench_pool_config(queue_mode: QueueMode) -> WorkerPoolConfig {
    WorkerPoolConfig::new()
        .with_worker_count(4)
        .with_queue_capacity(10_000)
        .with_queue_mode(queue_mode)
        .with_idle_backoff(Duration::from_millis(1))
}

// ============================================================================
// Heap Benchmarks
// ============================================================================

fn bench_heap_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_push_pop");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = PriorityHeap::with_capacity(usize::try_from(size).unwrap_or(0));
                for i in 0..size {
                    heap.push(build_task(i));
                }
                while let Ok(task) = heap.pop() {
                    black_box(task);
                }
            });
        });
    }
    group.finish();
}

fn bench_heap_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_remove");

    for size in [100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = PriorityHeap::new();
                let ids: Vec<_> = (0..size).map(|i| heap.push(build_task(i))).collect();
                // Remove every other entry from the middle of the heap.
                for id in ids.iter().step_by(2) {
                    black_box(heap.remove(*id));
                }
                black_box(heap.len());
            });
        });
    }
    group.finish();
}

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_safe_queue_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("safe_queue_single_thread");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let queue = SafePriorityQueue::new();
                for i in 0..size {
                    queue.push(build_task(i)).unwrap();
                }
                while let Ok(task) = queue.try_pop() {
                    black_box(task);
                }
            });
        });
    }
    group.finish();
}

fn bench_safe_queue_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("safe_queue_contended");
    let per_producer: u64 = 1_000;

    for threads in [2_u64, 4, 8] {
        group.throughput(Throughput::Elements(threads * per_producer));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let queue = Arc::new(SafePriorityQueue::new());
                let consumers: Vec<_> = (0..threads)
                    .map(|_| {
                        let queue = Arc::clone(&queue);
                        thread::spawn(move || {
                            while let Ok(task) = queue.pop() {
                                black_box(task);
                            }
                        })
                    })
                    .collect();
                let producers: Vec<_> = (0..threads)
                    .map(|p| {
                        let queue = Arc::clone(&queue);
                        thread::spawn(move || {
                            for i in 0..per_producer {
                                queue.push(build_task(p * per_producer + i)).unwrap();
                            }
                        })
                    })
                    .collect();
                for producer in producers {
                    producer.join().unwrap();
                }
                queue.close();
                for consumer in consumers {
                    consumer.join().unwrap();
                }
            });
        });
    }
    group.finish();
}

fn bench_channel_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_queue");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let queue = ChannelTaskQueue::new(usize::try_from(size).unwrap_or(1));
                for i in 0..size {
                    queue.add_task(build_task(i)).unwrap();
                }
                while let Fetch::Task(task) = queue.fetch() {
                    black_box(task);
                    queue.task_completed();
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_pool_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_drain");
    group.sample_size(20);
    let task_count: u64 = 1_000;
    group.throughput(Throughput::Elements(task_count));

    for mode in [QueueMode::Priority, QueueMode::Channel] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{mode:?}")),
            &mode,
            |b, &mode| {
                b.iter(|| {
                    let pool = build_pool(bench_pool_config(mode), ProcessorRegistry::new()).unwrap();
                    pool.start().unwrap();
                    for i in 0..task_count {
                        pool.submit(build_task(i)).unwrap();
                    }
                    pool.shutdown().unwrap();
                    black_box(pool.stats());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    queue_benches,
    bench_heap_push_pop,
    bench_heap_remove,
    bench_safe_queue_single_thread,
    bench_safe_queue_contended,
    bench_channel_queue,
);

criterion_group!(pool_benches, bench_pool_drain);

criterion_main!(queue_benches, pool_benches);
