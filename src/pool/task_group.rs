//! One fan-out round of work units sharing a result channel.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::warn;

use crate::error::{Result, ShardBenchError};
use crate::pool::work_queue::WorkQueue;

/// A batch of concurrently dispatched units whose outputs are collected together.
///
/// Each [`TaskGroup::submit`] increments the expected result count;
/// [`TaskGroup::wait`] blocks until that many outputs arrived, the deadline
/// passed, or a unit was lost to a panic. Outputs come back in arrival order.
///
/// ```
/// use std::time::Duration;
/// use shardbench::pool::work_queue::WorkQueue;
///
/// let pool = WorkQueue::new(4).unwrap();
/// let mut group = pool.task_group();
/// for i in 0..4u32 {
///     group.submit(|x: u32| x + 1, i).unwrap();
/// }
///
/// let mut results = group.wait(Some(Duration::from_secs(1))).into_results();
/// results.sort();
/// assert_eq!(results, vec![1, 2, 3, 4]);
/// ```
#[derive(Debug)]
pub struct TaskGroup<'a, O> {
    queue: &'a WorkQueue,
    sender: Sender<O>,
    receiver: Receiver<O>,
    expected: usize,
}

impl<'a, O: Send + 'static> TaskGroup<'a, O> {
    /// Create an empty group on `queue`.
    pub fn new(queue: &'a WorkQueue) -> Self {
        let (sender, receiver) = unbounded();
        TaskGroup {
            queue,
            sender,
            receiver,
            expected: 0,
        }
    }

    /// Enqueue `op(input)`; its output is delivered to this group.
    pub fn submit<I, F>(&mut self, op: F, input: I) -> Result<()>
    where
        F: FnOnce(I) -> O + Send + 'static,
        I: Send + 'static,
    {
        let sink = self.sender.clone();
        self.queue.enqueue(Box::new(move || {
            // The group may have stopped waiting already
            let _ = sink.send(op(input));
        }))?;
        self.expected += 1;
        Ok(())
    }

    /// Number of units submitted so far.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Collect outputs until all expected units reported or `timeout` passed.
    ///
    /// `None` waits without a deadline, as does a timeout too large to
    /// express as an `Instant`.
    pub fn wait(self, timeout: Option<Duration>) -> GroupResults<O> {
        let TaskGroup {
            sender,
            receiver,
            expected,
            ..
        } = self;

        // Only in-flight units hold senders from here on
        drop(sender);

        let start = Instant::now();
        let deadline = timeout.and_then(|t| start.checked_add(t));
        let mut results = Vec::with_capacity(expected);
        let mut timed_out = false;
        let mut lost = 0;

        while results.len() < expected {
            let received = match deadline {
                Some(deadline) => receiver.recv_deadline(deadline),
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(output) => results.push(output),
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    lost = expected - results.len();
                    break;
                }
            }
        }

        if timed_out {
            warn!(
                "task group timed out with {} of {} results",
                results.len(),
                expected
            );
        }

        GroupResults {
            results,
            expected,
            elapsed: start.elapsed(),
            timed_out,
            lost,
        }
    }
}

/// Outputs collected by [`TaskGroup::wait`].
#[derive(Debug)]
pub struct GroupResults<O> {
    /// Outputs in arrival order.
    pub results: Vec<O>,

    /// Number of units that were submitted.
    pub expected: usize,

    /// Time spent waiting.
    pub elapsed: Duration,

    /// Whether the deadline passed before every output arrived.
    pub timed_out: bool,

    /// Units that ended without delivering an output.
    pub lost: usize,
}

impl<O> GroupResults<O> {
    /// Check whether every submitted unit delivered its output.
    pub fn is_complete(&self) -> bool {
        self.results.len() == self.expected
    }

    /// The error describing an incomplete result set, if any.
    pub fn error(&self) -> Option<ShardBenchError> {
        if self.timed_out {
            Some(ShardBenchError::timeout(
                format!(
                    "{} of {} results arrived",
                    self.results.len(),
                    self.expected
                ),
                self.elapsed,
            ))
        } else if self.lost > 0 {
            Some(ShardBenchError::task_lost(format!(
                "{} of {} units ended without a result",
                self.lost, self.expected
            )))
        } else {
            None
        }
    }

    /// Split into the arrived outputs and the incompleteness error.
    pub fn into_parts(self) -> (Vec<O>, Option<ShardBenchError>) {
        let error = self.error();
        (self.results, error)
    }

    /// Take the arrived outputs, ignoring completeness.
    pub fn into_results(self) -> Vec<O> {
        self.results
    }
}
