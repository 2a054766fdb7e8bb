//! Deferred-task scheduler — the "next tick" queue that interceptors and
//! the bootstrap sequencer push derived work onto.
//!
//! Zero-delay scheduling is modeled as an explicit FIFO queue so ordering
//! stays deterministic: a deferred task runs strictly after every
//! synchronous append of the tick that scheduled it, and deferred tasks run
//! in the order they were deferred. Draining is cooperative — the host
//! calls [`Scheduler::run_until_idle`] between units of synchronous work.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

type Task = Box<dyn FnOnce() + Send>;

/// Cloneable handle to a FIFO deferred-task queue. Clones share the queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run on the next drain. Tasks cannot be cancelled.
    pub fn defer(&self, task: impl FnOnce() + Send + 'static) {
        self.tasks.lock().push_back(Box::new(task));
    }

    /// Number of tasks currently queued.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run queued tasks in FIFO order until none remain. Tasks deferred
    /// while draining run in the same call, after everything queued ahead
    /// of them. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Lock released before the task runs so tasks can defer more work.
            let task = self.tasks.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            trace!(tasks = ran, "deferred queue drained");
        }
        ran
    }
}
