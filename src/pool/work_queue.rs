//! Fixed-size worker pool over a shared job queue.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::error::{Result, ShardBenchError};
use crate::pool::task_group::TaskGroup;

/// A unit of work as seen by the workers.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Counters shared between the queue and its workers.
#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Snapshot of pool activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted by the queue.
    pub submitted: u64,

    /// Jobs that ran to completion.
    pub completed: u64,

    /// Jobs whose operation panicked.
    pub panicked: u64,
}

impl PoolStats {
    /// Jobs accepted but not yet finished.
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.panicked)
    }
}

/// Bounded worker pool.
///
/// Exactly `num_workers` threads pull jobs from one unbounded queue and run
/// them one at a time. The pool lives until [`WorkQueue::shutdown`] is called
/// or it is dropped; both drain the queued jobs before the workers exit.
///
/// ```
/// use std::time::Duration;
/// use shardbench::pool::work_queue::WorkQueue;
///
/// let pool = WorkQueue::new(2).unwrap();
/// let handle = pool.submit(|x: u32| x * 2, 21).unwrap();
/// assert_eq!(handle.wait(Some(Duration::from_secs(1))).unwrap(), 42);
/// ```
#[derive(Debug)]
pub struct WorkQueue {
    /// Number of worker threads.
    num_workers: usize,

    /// Job sender; `None` once shut down.
    sender: RwLock<Option<Sender<Job>>>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Activity counters.
    counters: Arc<PoolCounters>,
}

impl WorkQueue {
    /// Create a pool and start its workers.
    pub fn new(num_workers: usize) -> Result<Self> {
        if num_workers == 0 {
            return Err(ShardBenchError::invalid_argument(
                "worker pool needs at least one worker",
            ));
        }

        let (sender, receiver) = unbounded::<Job>();
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            workers.push(Self::spawn_worker(
                worker_id,
                receiver.clone(),
                Arc::clone(&counters),
            )?);
        }

        debug!("started worker pool with {num_workers} workers");

        Ok(WorkQueue {
            num_workers,
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            counters,
        })
    }

    fn spawn_worker(
        worker_id: usize,
        receiver: Receiver<Job>,
        counters: Arc<PoolCounters>,
    ) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name(format!("shardbench-worker-{worker_id}"))
            .spawn(move || {
                // Ends once every sender is gone and the queue is drained
                for job in receiver.iter() {
                    match panic::catch_unwind(AssertUnwindSafe(job)) {
                        Ok(()) => {
                            counters.completed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            counters.panicked.fetch_add(1, Ordering::Relaxed);
                            warn!("job panicked on worker {worker_id}");
                        }
                    }
                }
            })?;

        Ok(handle)
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Check whether the pool has been shut down.
    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Current activity counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }

    /// Put a raw job on the queue.
    pub(crate) fn enqueue(&self, job: Job) -> Result<()> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(ShardBenchError::PoolClosed)?;
        sender.send(job).map_err(|_| ShardBenchError::PoolClosed)?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Run `op(input)` on a worker and return a handle to its output.
    pub fn submit<I, O, F>(&self, op: F, input: I) -> Result<TaskHandle<O>>
    where
        F: FnOnce(I) -> O + Send + 'static,
        I: Send + 'static,
        O: Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.enqueue(Box::new(move || {
            let _ = tx.send(op(input));
        }))?;
        Ok(TaskHandle { receiver: rx })
    }

    /// Start a new fan-out round on this pool.
    pub fn task_group<O: Send + 'static>(&self) -> TaskGroup<'_, O> {
        TaskGroup::new(self)
    }

    /// Stop accepting work, drain the queue and join every worker.
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        if self.sender.write().take().is_none() {
            return;
        }

        let current = thread::current().id();
        let mut workers = self.workers.lock();
        while let Some(worker) = workers.pop() {
            // A worker can't join itself
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                warn!("worker thread exited abnormally");
            }
        }

        debug!("worker pool stopped");
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to the output of one submitted unit.
#[derive(Debug)]
pub struct TaskHandle<O> {
    receiver: Receiver<O>,
}

impl<O> TaskHandle<O> {
    /// Block until the output arrives, or until `timeout` passes.
    ///
    /// A unit whose operation panicked yields [`ShardBenchError::TaskLost`].
    pub fn wait(self, timeout: Option<Duration>) -> Result<O> {
        match timeout {
            Some(timeout) => self.receiver.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    ShardBenchError::timeout("task did not complete", timeout)
                }
                RecvTimeoutError::Disconnected => {
                    ShardBenchError::task_lost("task ended without a result")
                }
            }),
            None => self
                .receiver
                .recv()
                .map_err(|_| ShardBenchError::task_lost("task ended without a result")),
        }
    }

    /// Return the output if it has already arrived.
    pub fn try_result(&self) -> Option<O> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_zero_workers_rejected() {
        assert!(WorkQueue::new(0).is_err());
    }

    #[test]
    fn test_submit_and_wait() {
        let pool = WorkQueue::new(3).unwrap();
        assert_eq!(pool.num_workers(), 3);

        let handles: Vec<_> = (0..10)
            .map(|i| pool.submit(|x: usize| x * x, i).unwrap())
            .collect();
        let outputs: Vec<usize> = handles
            .into_iter()
            .map(|h| h.wait(Some(Duration::from_secs(5))).unwrap())
            .collect();

        assert_eq!(outputs, (0..10).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_wait_timeout() {
        let pool = WorkQueue::new(1).unwrap();
        let handle = pool
            .submit(|d: Duration| thread::sleep(d), Duration::from_millis(200))
            .unwrap();

        let err = handle.wait(Some(Duration::from_millis(10))).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_panicking_job_keeps_worker_alive() {
        let pool = WorkQueue::new(1).unwrap();

        let lost = pool.submit(|_: ()| -> u32 { panic!("boom") }, ()).unwrap();
        assert!(matches!(
            lost.wait(Some(Duration::from_secs(5))),
            Err(ShardBenchError::TaskLost(_))
        ));

        let ok = pool.submit(|x: u32| x + 1, 1).unwrap();
        assert_eq!(ok.wait(Some(Duration::from_secs(5))).unwrap(), 2);
        assert_eq!(pool.stats().panicked, 1);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let pool = WorkQueue::new(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit(
                move |_: ()| {
                    thread::sleep(Duration::from_millis(1));
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                (),
            )
            .unwrap();
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert!(pool.is_closed());
        assert_eq!(pool.stats().pending(), 0);

        assert!(matches!(
            pool.submit(|x: u32| x, 1),
            Err(ShardBenchError::PoolClosed)
        ));

        // Second shutdown is a no-op
        pool.shutdown();
    }
}
