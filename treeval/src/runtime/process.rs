//! Isolated evaluation processes.
//!
//! An [`IsolatedProcess`] owns a private copy of a program's environment on a
//! dedicated worker thread. Requests are blocking round trips: the caller
//! sends a tree and waits for the value and its representation. Nothing the
//! worker evaluates can touch the caller's environment, and a worker that
//! dies surfaces as [`RuntimeError::ProcessTerminated`] on the next request.

use crate::ast::Expr;
use crate::runtime::environment::Environment;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::values::Value;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// A value computed inside an isolated process, with its `repr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub value: Value,
    pub repr: String,
}

struct Job {
    tree: Expr,
    reply: mpsc::Sender<RuntimeResult<Evaluated>>,
}

pub struct IsolatedProcess {
    name: String,
    jobs: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl IsolatedProcess {
    /// Starts a worker that evaluates requests against `env`.
    pub fn spawn(
        name: impl Into<String>,
        env: Environment,
        evaluator: Evaluator,
    ) -> std::io::Result<Self> {
        let name = name.into();
        let (jobs, queue) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(format!("treeval-{}", name))
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                for job in queue {
                    let result = evaluator.evaluate(&job.tree, &env).map(|value| Evaluated {
                        repr: value.repr(),
                        value,
                    });
                    // The requester may have given up; nothing to do then.
                    let _ = job.reply.send(result);
                }
            })?;
        log::debug!("spawned isolated process '{}'", name);
        Ok(IsolatedProcess {
            name,
            jobs: Some(jobs),
            worker: Some(worker),
        })
    }

    /// Evaluates `tree` in the worker and blocks until it answers.
    pub fn evaluate(&self, tree: &Expr) -> RuntimeResult<Evaluated> {
        let (reply, answer) = mpsc::channel();
        let job = Job {
            tree: tree.clone(),
            reply,
        };
        let sent = self.jobs.as_ref().map(|jobs| jobs.send(job).is_ok());
        if sent != Some(true) {
            return Err(self.terminated());
        }
        answer.recv().map_err(|_| self.terminated())?
    }

    fn terminated(&self) -> RuntimeError {
        log::warn!("isolated process '{}' is no longer running", self.name);
        RuntimeError::ProcessTerminated(self.name.clone())
    }
}

impl std::fmt::Debug for IsolatedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolatedProcess")
            .field("name", &self.name)
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl Drop for IsolatedProcess {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("isolated process '{}' panicked", self.name);
            }
        }
    }
}
