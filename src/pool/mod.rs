//! Task queue and worker pool for intra-iteration parallelism
//!
//! A data-parallel device owns one of these for its whole lifetime: it
//! spawns the workers in init, dispatches a batch of sub-region tasks
//! every `process` call, waits for the batch to drain, and shuts the
//! queue down in close. Batches are short (sub-millisecond at loop
//! rate), so the wait path is tuned for latency: the in-flight counter
//! is lock-free and workers only touch the queue mutex to hand a
//! completion wakeup to the dispatcher.

use crate::error::EngineError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use tracing::trace;

/// One unit of parallel work: a closure over its source and destination
/// references, plus its position in the queue.
pub struct Task {
    func: Box<dyn FnOnce() + Send + 'static>,
    seq: usize,
}

#[derive(Default)]
struct QueueInner {
    tasks: VecDeque<Task>,
    next_seq: usize,
}

/// Bounded-concurrency producer-consumer queue.
///
/// The linked list of tasks lives under the mutex; `tasks_processing`
/// counts tasks dequeued but not yet finished and is intentionally
/// atomic, since it is only ever read for a completion test, never used
/// to gate mutation of the list itself.
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
    drained: Condvar,
    tasks_processing: AtomicUsize,
    exit: AtomicBool,
}

impl TaskQueue {
    pub fn new() -> Self {
        TaskQueue {
            inner: Mutex::new(QueueInner::default()),
            ready: Condvar::new(),
            drained: Condvar::new(),
            tasks_processing: AtomicUsize::new(0),
            exit: AtomicBool::new(false),
        }
    }

    /// Append a task to the tail and wake one worker.
    pub fn enqueue(&self, func: impl FnOnce() + Send + 'static) {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.tasks.push_back(Task {
            func: Box::new(func),
            seq,
        });
        drop(inner);
        self.ready.notify_one();
    }

    /// Pop the oldest task, blocking while the queue is empty. Returns
    /// `None` once shutdown has been requested and the queue is drained.
    ///
    /// The in-flight counter is bumped under the mutex, before the task
    /// is released to the caller, so `wait_idle` can never observe an
    /// empty queue while a task is in hand but uncounted.
    fn dequeue(&self) -> Option<Task> {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        loop {
            if let Some(task) = inner.tasks.pop_front() {
                self.tasks_processing.fetch_add(1, Ordering::AcqRel);
                return Some(task);
            }
            if self.exit.load(Ordering::Acquire) {
                return None;
            }
            inner = self.ready.wait(inner).expect("task queue poisoned");
        }
    }

    /// Worker body: run tasks oldest-first until shutdown.
    ///
    /// The in-flight decrement lives in a drop guard so a panicking task
    /// still releases its slot; otherwise the completion barrier would
    /// wait forever.
    pub fn run_worker(&self) {
        while let Some(task) = self.dequeue() {
            trace!(seq = task.seq, "running task");
            let _in_flight = InFlightGuard { queue: self };
            (task.func)();
        }
        trace!("worker exiting");
    }

    /// Block until every queued task has been dequeued and finished.
    ///
    /// Latency is bounded by the slowest task of the batch; tasks within
    /// the batch may complete in any order and must write to independent
    /// destination slots.
    pub fn wait_idle(&self) {
        let mut inner = self.inner.lock().expect("task queue poisoned");
        while !inner.tasks.is_empty()
            || self.tasks_processing.load(Ordering::Acquire) != 0
        {
            inner = self.drained.wait(inner).expect("task queue poisoned");
        }
    }

    /// Tell every worker to exit once the queue is drained.
    pub fn shutdown(&self) {
        self.exit.store(true, Ordering::Release);
        self.ready.notify_all();
    }

    /// Number of tasks dequeued but not yet finished.
    pub fn tasks_processing(&self) -> usize {
        self.tasks_processing.load(Ordering::Acquire)
    }

    /// Number of tasks still waiting in the queue.
    pub fn queued(&self) -> usize {
        self.inner.lock().expect("task queue poisoned").tasks.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one in-flight slot, on normal return and on unwind alike.
struct InFlightGuard<'a> {
    queue: &'a TaskQueue,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        // Last task of a batch hands the dispatcher its wakeup. The
        // mutex is taken only on that edge so the hot path stays
        // lock-free; the lock result is ignored so an unwind cannot
        // turn into a double panic.
        if self.queue.tasks_processing.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.queue.inner.lock();
            self.queue.drained.notify_all();
        }
    }
}

/// Fixed set of threads draining one queue for the lifetime of the
/// owning device.
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers against `queue`.
    pub fn spawn(count: usize, queue: Arc<TaskQueue>) -> Result<Self, EngineError> {
        let mut workers = Vec::with_capacity(count);
        for idx in 0..count {
            let queue = Arc::clone(&queue);
            let handle = std::thread::Builder::new()
                .name(format!("loopline-worker-{idx}"))
                .spawn(move || queue.run_worker())
                .map_err(|e| EngineError::Thread {
                    reason: format!("could not spawn worker {idx}: {e}"),
                })?;
            workers.push(handle);
        }
        Ok(WorkerPool { queue, workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Request shutdown and join every worker. Safe to call twice.
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        self.queue.shutdown();
        for handle in self.workers.drain(..) {
            handle.join().map_err(|_| EngineError::Thread {
                reason: "worker panicked".into(),
            })?;
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn batch_runs_every_task_exactly_once() {
        let queue = Arc::new(TaskQueue::new());
        let mut pool = WorkerPool::spawn(3, Arc::clone(&queue)).unwrap();

        let slots: Arc<Vec<AtomicU64>> =
            Arc::new((0..16).map(|_| AtomicU64::new(0)).collect());
        for i in 0..16 {
            let slots = Arc::clone(&slots);
            queue.enqueue(move || {
                slots[i].fetch_add(1, Ordering::SeqCst);
            });
        }
        queue.wait_idle();

        for slot in slots.iter() {
            assert_eq!(slot.load(Ordering::SeqCst), 1);
        }
        assert_eq!(queue.tasks_processing(), 0);
        assert_eq!(queue.queued(), 0);
        pool.shutdown().unwrap();
    }

    #[test]
    fn wait_idle_on_empty_queue_returns_immediately() {
        let queue = TaskQueue::new();
        queue.wait_idle();
    }

    #[test]
    fn shutdown_joins_blocked_workers() {
        let queue = Arc::new(TaskQueue::new());
        let mut pool = WorkerPool::spawn(4, Arc::clone(&queue)).unwrap();
        // workers are all blocked on the empty queue
        pool.shutdown().unwrap();
        assert_eq!(pool.worker_count(), 0);
    }

    #[test]
    fn panicking_task_still_releases_its_slot() {
        let queue = Arc::new(TaskQueue::new());
        let mut pool = WorkerPool::spawn(2, Arc::clone(&queue)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        queue.enqueue(|| panic!("task blew up"));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            queue.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        // must not hang on the slot held by the panicked task
        queue.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert_eq!(queue.tasks_processing(), 0);

        // joining surfaces the dead worker
        assert!(pool.shutdown().is_err());
    }

    #[test]
    fn batches_can_repeat_across_iterations() {
        let queue = Arc::new(TaskQueue::new());
        let _pool = WorkerPool::spawn(2, Arc::clone(&queue)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            for _ in 0..8 {
                let counter = Arc::clone(&counter);
                queue.enqueue(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            queue.wait_idle();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 80);
    }
}
