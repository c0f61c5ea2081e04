//! Bounded task pool
//!
//! A fixed number of worker threads drain one bounded queue of boxed
//! closures. A full queue is the pool's only form of backpressure:
//! [`TaskPool::schedule`] blocks until a slot frees up, while
//! [`PoolHandle::try_schedule`] hands the task back so the caller can run it
//! itself.
//!
//! Workers are scoped threads, so tasks may borrow anything that outlives the
//! [`std::thread::scope`] the pool was created in. The pool does not track
//! per-task completion; callers pair every scheduled task with their own
//! completion bookkeeping.
//!
//! The queue closes once the pool and every [`PoolHandle`] are gone. Tasks
//! normally carry handles of their own (to schedule further work), so
//! [`TaskPool::wait`] returns only after the last queued task has run and
//! dropped its handle. The thread calling `wait` must not hold a handle.
//!
//! A panicking task does not take its worker down: the worker records the
//! first panic, keeps draining the queue, and [`TaskPool::wait`] re-raises it
//! on the calling thread once every worker has stopped.

use crossbeam_channel::{bounded, Receiver, SendError, Sender, TrySendError};
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{Scope, ScopedJoinHandle};
use tracing::{error, trace, warn};

/// A unit of work accepted by the pool
pub type Task<'env> = Box<dyn FnOnce() + Send + 'env>;

/// Counters shared by the pool and its handles
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Tasks accepted into the queue
    pub scheduled: AtomicU64,

    /// Tasks run to completion by a worker
    pub executed: AtomicU64,

    /// Tasks that panicked on a worker
    pub panicked: AtomicU64,

    /// `try_schedule` calls refused because the queue was full
    pub rejected: AtomicU64,
}

impl PoolStats {
    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }

    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }
}

type PanicPayload = Box<dyn Any + Send + 'static>;

/// First panic caught on a worker, re-raised by [`TaskPool::wait`]
type PanicSlot = Arc<Mutex<Option<PanicPayload>>>;

/// Fixed-size worker pool over a bounded queue
pub struct TaskPool<'scope, 'env: 'scope> {
    sender: Sender<Task<'env>>,
    workers: Vec<ScopedJoinHandle<'scope, ()>>,
    stats: Arc<PoolStats>,
    first_panic: PanicSlot,
}

impl<'scope, 'env> TaskPool<'scope, 'env> {
    /// Starts `capacity` workers inside `scope`; the queue holds `capacity` tasks
    pub fn new(scope: &'scope Scope<'scope, 'env>, capacity: NonZeroUsize) -> Self {
        let (sender, receiver) = bounded::<Task<'env>>(capacity.get());
        let stats = Arc::new(PoolStats::default());
        let first_panic: PanicSlot = Arc::default();

        let workers = (0..capacity.get())
            .map(|id| {
                let receiver = receiver.clone();
                let stats = Arc::clone(&stats);
                let first_panic = Arc::clone(&first_panic);
                scope.spawn(move || worker_loop(id, receiver, stats, first_panic))
            })
            .collect();

        Self {
            sender,
            workers,
            stats,
            first_panic,
        }
    }

    /// Number of worker threads
    pub fn capacity(&self) -> usize {
        self.workers.len()
    }

    /// Get a handle for scheduling from inside tasks (clone for each task)
    pub fn handle(&self) -> PoolHandle<'env> {
        PoolHandle {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get pool statistics
    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Enqueue a task, blocking while the queue is full
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'env,
    {
        send_blocking(&self.sender, &self.stats, Box::new(task));
    }

    /// Close the queue and join every worker once it has drained
    ///
    /// Re-raises the first task panic, if any, after all workers are joined.
    pub fn wait(self) {
        let Self {
            sender,
            workers,
            first_panic,
            ..
        } = self;
        drop(sender);

        for worker in workers {
            // Task panics are caught in the worker loop, so joins only fail
            // if the loop itself panicked; the scope re-raises that.
            let _ = worker.join();
        }

        let payload = first_panic.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(payload) = payload {
            panic::resume_unwind(payload);
        }
    }
}

/// Cloneable scheduling handle carried by tasks
#[derive(Clone)]
pub struct PoolHandle<'env> {
    sender: Sender<Task<'env>>,
    stats: Arc<PoolStats>,
}

impl<'env> PoolHandle<'env> {
    /// Enqueue a task, blocking while the queue is full
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'env,
    {
        send_blocking(&self.sender, &self.stats, Box::new(task));
    }

    /// Try to enqueue a task without blocking
    ///
    /// Returns the task when the queue is full so the caller can run it.
    pub fn try_schedule(&self, task: Task<'env>) -> Result<(), Task<'env>> {
        match self.sender.try_send(task) {
            Ok(()) => {
                self.stats.scheduled.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(task)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                Err(task)
            }
            Err(TrySendError::Disconnected(task)) => Err(task),
        }
    }
}

fn send_blocking<'env>(sender: &Sender<Task<'env>>, stats: &PoolStats, task: Task<'env>) {
    match sender.send(task) {
        Ok(()) => {
            stats.scheduled.fetch_add(1, Ordering::Relaxed);
        }
        Err(SendError(task)) => {
            // Every worker is gone; run it here rather than lose the work.
            warn!("Task pool has no live workers, running task on caller thread");
            task();
        }
    }
}

fn worker_loop(id: usize, receiver: Receiver<Task<'_>>, stats: Arc<PoolStats>, first_panic: PanicSlot) {
    trace!("Worker {} started", id);
    for task in receiver.iter() {
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => {
                stats.executed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                error!("Task panicked on worker {}", id);
                stats.panicked.fetch_add(1, Ordering::Relaxed);
                let mut slot = first_panic.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(payload);
                }
            }
        }
    }
    trace!("Worker {} stopped", id);
}
