//! Bounded worker pool.
//!
//! A [`work_queue::WorkQueue`] owns a fixed number of long-lived worker
//! threads that consume boxed jobs from one shared queue. Fan-out rounds use
//! a [`task_group::TaskGroup`] to submit several units and collect their
//! results on one channel.

pub mod task_group;
pub mod work_queue;
