//! Worker pool behavior under realistic batch loads.

use loopline::pool::{TaskQueue, WorkerPool};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn sixty_four_tasks_on_four_workers_each_write_their_slot_once() {
    let queue = Arc::new(TaskQueue::new());
    let mut pool = WorkerPool::spawn(4, Arc::clone(&queue)).unwrap();

    let slots: Arc<Vec<AtomicU64>> = Arc::new((0..64).map(|_| AtomicU64::new(0)).collect());
    for i in 0..64 {
        let slots = Arc::clone(&slots);
        queue.enqueue(move || {
            // simulate a short region computation
            std::thread::sleep(Duration::from_micros(50));
            slots[i].fetch_add(1, Ordering::SeqCst);
        });
    }
    queue.wait_idle();

    for slot in slots.iter() {
        assert_eq!(slot.load(Ordering::SeqCst), 1);
    }
    assert_eq!(queue.queued(), 0);
    assert_eq!(queue.tasks_processing(), 0);
    pool.shutdown().unwrap();
}

#[test]
fn wait_idle_observes_tasks_in_flight_not_just_queued() {
    let queue = Arc::new(TaskQueue::new());
    let _pool = WorkerPool::spawn(2, Arc::clone(&queue)).unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    // a slow task that a naive queue-empty test would miss
    let done_clone = Arc::clone(&done);
    queue.enqueue(move || {
        std::thread::sleep(Duration::from_millis(20));
        done_clone.fetch_add(1, Ordering::SeqCst);
    });
    queue.wait_idle();
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn repeated_batches_reuse_the_same_pool() {
    let queue = Arc::new(TaskQueue::new());
    let mut pool = WorkerPool::spawn(4, Arc::clone(&queue)).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..25 {
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            queue.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        queue.wait_idle();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 400);
    pool.shutdown().unwrap();
}

#[test]
fn shutdown_drains_remaining_tasks_before_workers_exit() {
    let queue = Arc::new(TaskQueue::new());
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..32 {
        let counter = Arc::clone(&counter);
        queue.enqueue(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    let mut pool = WorkerPool::spawn(2, Arc::clone(&queue)).unwrap();
    pool.shutdown().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 32);
}
