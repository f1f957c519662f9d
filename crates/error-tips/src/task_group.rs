//! An all-settle task group.
//!
//! Every task runs on its own thread. [`TaskGroup::join`] waits until each task has settled
//! (or the group deadline passes) and reports one [`Settled`] value per task, in the order the
//! tasks were spawned. A failing task never short-circuits the others.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// How a task in a [`TaskGroup`] ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Settled<T> {
    /// The task returned a value.
    Finished(T),
    /// The group deadline passed before the task returned.
    TimedOut,
    /// The task panicked or its thread could not be started.
    Lost,
}

impl<T> Settled<T> {
    /// The task's value, if it finished.
    pub fn finished(self) -> Option<T> {
        match self {
            Self::Finished(value) => Some(value),
            Self::TimedOut | Self::Lost => None,
        }
    }

    /// Whether the task returned a value.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

struct Task<T> {
    label: String,
    run: Box<dyn FnOnce() -> T + Send + 'static>,
}

/// A group of independent tasks joined with all-settle semantics.
pub struct TaskGroup<T> {
    tasks: Vec<Task<T>>,
    timeout: Option<Duration>,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// Create an empty group with no deadline.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            timeout: None,
        }
    }

    /// Bound the whole join by `timeout`, measured from the start of [`join`](Self::join).
    ///
    /// Tasks still running at the deadline are reported as [`Settled::TimedOut`]; their
    /// threads are detached, not cancelled.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queue a task. Nothing runs until [`join`](Self::join).
    pub fn spawn(&mut self, label: impl Into<String>, task: impl FnOnce() -> T + Send + 'static) {
        self.tasks.push(Task {
            label: label.into(),
            run: Box::new(task),
        });
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task concurrently and wait for all of them to settle.
    pub fn join(self) -> Vec<Settled<T>> {
        let Self { tasks, timeout } = self;
        // `None` until the task reports back or is known to be lost.
        let mut results: Vec<Option<Settled<T>>> = tasks.iter().map(|_| None).collect();
        let mut pending = tasks.len();

        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let (tx, rx) = mpsc::channel::<(usize, Settled<T>)>();

        for (index, Task { label, run }) in tasks.into_iter().enumerate() {
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("task-group:{label}"))
                .spawn(move || {
                    let settled = match panic::catch_unwind(AssertUnwindSafe(run)) {
                        Ok(value) => Settled::Finished(value),
                        Err(_) => Settled::Lost,
                    };
                    // The receiver is gone only if the join already timed out.
                    let _ = tx.send((index, settled));
                });
            if let Err(err) = spawned {
                tracing::warn!(task = %label, error = %err, "failed to start task");
                results[index] = Some(Settled::Lost);
                pending -= 1;
            }
        }
        drop(tx);

        let mut timed_out = false;
        while pending > 0 {
            let received = match deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok((index, settled)) => {
                    results[index] = Some(settled);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    if timed_out {
                        Settled::TimedOut
                    } else {
                        Settled::Lost
                    }
                })
            })
            .collect()
    }
}

impl<T: Send + 'static> Default for TaskGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}
