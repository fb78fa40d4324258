//! Single-worker task runner with cancellable handles.
//!
//! Each player handler owns one `ThreadExecutor`. The executor keeps a single
//! named worker thread alive for the whole match and runs at most one task at
//! a time on it. Submitting returns a `TaskHandle`; waiting on the handle is
//! the only way a task's outcome (success, error, panic, interruption) is
//! observed.
//!
//! ```
//! use rust_arena::concurrent::ThreadExecutor;
//!
//! let executor = ThreadExecutor::new("doc-worker").unwrap();
//! let handle = executor.execute(|_token| Ok(21 * 2)).unwrap();
//! assert_eq!(handle.wait(), Ok(42));
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::cancel::{CancelSource, CancelToken};
use super::panic_message;
use crate::error::AgentError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// State shared between the executor, its worker jobs and its interrupters.
#[derive(Debug, Default)]
struct Control {
    /// Set while a task is queued or running.
    busy: AtomicBool,
    /// Set once interrupted; no task is accepted afterwards.
    closed: AtomicBool,
    /// Cancellation of the task in flight.
    current: Mutex<Option<Arc<CancelSource>>>,
}

impl Control {
    fn interrupt(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(current) = self.current.lock().take() {
            current.cancel();
        }
    }
}

/// Cross-thread handle that interrupts an executor.
///
/// Player handlers live on the orchestration thread; `Game::dispose` keeps
/// one of these per handler so it can cancel blocked waits from outside.
#[derive(Clone, Debug)]
pub struct Interrupter {
    control: Arc<Control>,
}

impl Interrupter {
    /// Cancel the in-flight task and refuse new ones.
    pub fn interrupt(&self) {
        self.control.interrupt();
    }

    /// Whether the executor has been interrupted.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.control.closed.load(Ordering::SeqCst)
    }
}

/// A single-worker executor.
pub struct ThreadExecutor {
    name: String,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    control: Arc<Control>,
}

impl std::fmt::Debug for ThreadExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadExecutor")
            .field("name", &self.name)
            .field("busy", &self.control.busy.load(Ordering::SeqCst))
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

impl ThreadExecutor {
    /// Spawn the worker thread.
    pub fn new(name: impl Into<String>) -> Result<Self, AgentError> {
        let name = name.into();
        let (jobs, queue) = unbounded::<Job>();

        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(queue))
            .map_err(|e| AgentError::Spawn(e.to_string()))?;

        Ok(Self {
            name,
            jobs: Some(jobs),
            worker: Some(worker),
            control: Arc::new(Control::default()),
        })
    }

    /// Worker thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a task.
    ///
    /// The task receives a `CancelToken` it must honour in every blocking
    /// wait. Fails with `Busy` while a previous task is still in flight and
    /// with `Interrupted` once the executor has been interrupted.
    pub fn execute<T, F>(&self, task: F) -> Result<TaskHandle<T>, AgentError>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> Result<T, AgentError> + Send + 'static,
    {
        let jobs = match &self.jobs {
            Some(jobs) if !self.is_interrupted() => jobs,
            _ => return Err(AgentError::Interrupted),
        };
        if self.control.busy.swap(true, Ordering::SeqCst) {
            return Err(AgentError::Busy);
        }

        let cancel = Arc::new(CancelSource::new());
        *self.control.current.lock() = Some(Arc::clone(&cancel));
        // An interrupter may have fired between the check above and publishing
        // the new source.
        if self.is_interrupted() {
            cancel.cancel();
        }

        let token = cancel.token();
        let control = Arc::clone(&self.control);
        let (result_tx, result_rx) = bounded(1);

        let job: Job = Box::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| task(&token)))
                .unwrap_or_else(|payload| Err(AgentError::Panicked(panic_message(payload.as_ref()))));
            control.busy.store(false, Ordering::SeqCst);
            let _ = result_tx.send(outcome);
        });

        if jobs.send(job).is_err() {
            self.control.busy.store(false, Ordering::SeqCst);
            return Err(AgentError::Interrupted);
        }

        Ok(TaskHandle {
            result: result_rx,
            cancel,
        })
    }

    /// Whether a task is queued or running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.control.busy.load(Ordering::SeqCst)
    }

    /// Whether `interrupt` has been called (here or through an `Interrupter`).
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.control.closed.load(Ordering::SeqCst)
    }

    /// A handle that can interrupt this executor from another thread.
    #[must_use]
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            control: Arc::clone(&self.control),
        }
    }

    /// Cancel the in-flight task, refuse new ones and stop the worker.
    ///
    /// Joins the worker, which returns as soon as the cancelled task honours
    /// its token.
    pub fn interrupt(&mut self) {
        self.control.interrupt();
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        self.interrupt();
    }
}

fn worker_loop(queue: Receiver<Job>) {
    for job in queue.iter() {
        job();
    }
}

/// Awaitable outcome of one executor task.
///
/// Dropping the handle cancels the task; after `wait` returned this is a
/// no-op.
#[derive(Debug)]
pub struct TaskHandle<T> {
    result: Receiver<Result<T, AgentError>>,
    cancel: Arc<CancelSource>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes and return its outcome.
    ///
    /// A task that was dropped without running reports `Interrupted`.
    pub fn wait(self) -> Result<T, AgentError> {
        self.result.recv().unwrap_or(Err(AgentError::Interrupted))
    }

}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrent::recv_or_cancel;
    use std::time::Duration;

    #[test]
    fn test_execute_returns_value() {
        let executor = ThreadExecutor::new("test-exec").unwrap();
        let handle = executor.execute(|_| Ok("done")).unwrap();
        assert_eq!(handle.wait(), Ok("done"));
        assert!(!executor.is_busy());
    }

    #[test]
    fn test_task_runs_on_named_worker() {
        let executor = ThreadExecutor::new("named-worker").unwrap();
        let handle = executor
            .execute(|_| Ok(thread::current().name().map(str::to_string)))
            .unwrap();
        assert_eq!(handle.wait(), Ok(Some("named-worker".to_string())));
    }

    #[test]
    fn test_task_error_propagates() {
        let executor = ThreadExecutor::new("test-exec").unwrap();
        let handle = executor
            .execute(|_| -> Result<(), AgentError> { Err(AgentError::failed("nope")) })
            .unwrap();
        assert_eq!(handle.wait(), Err(AgentError::failed("nope")));
    }

    #[test]
    fn test_task_panic_propagates() {
        let executor = ThreadExecutor::new("test-exec").unwrap();
        let handle = executor
            .execute(|_| -> Result<(), AgentError> { panic!("kaboom") })
            .unwrap();
        assert_eq!(handle.wait(), Err(AgentError::Panicked("kaboom".to_string())));

        // The worker survives a panicking task.
        let handle = executor.execute(|_| Ok(1)).unwrap();
        assert_eq!(handle.wait(), Ok(1));
    }

    #[test]
    fn test_one_task_in_flight() {
        let executor = ThreadExecutor::new("test-exec").unwrap();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        let first = executor
            .execute(move |token| recv_or_cancel(&release_rx, token))
            .unwrap();
        assert!(executor.is_busy());
        assert!(matches!(executor.execute(|_| Ok(())), Err(AgentError::Busy)));

        release_tx.send(()).unwrap();
        assert_eq!(first.wait(), Ok(()));
        assert!(executor.execute(|_| Ok(())).unwrap().wait().is_ok());
    }

    #[test]
    fn test_interrupt_cancels_blocked_task() {
        let mut executor = ThreadExecutor::new("test-exec").unwrap();
        let (_tx, rx) = crossbeam_channel::unbounded::<u8>();

        let handle = executor.execute(move |token| recv_or_cancel(&rx, token)).unwrap();
        thread::sleep(Duration::from_millis(10));
        executor.interrupt();

        assert_eq!(handle.wait(), Err(AgentError::Interrupted));
        assert!(executor.is_interrupted());
        assert!(matches!(executor.execute(|_| Ok(())), Err(AgentError::Interrupted)));
    }

    #[test]
    fn test_interrupter_from_other_thread() {
        let executor = ThreadExecutor::new("test-exec").unwrap();
        let interrupter = executor.interrupter();
        let (_tx, rx) = crossbeam_channel::unbounded::<u8>();

        let handle = executor.execute(move |token| recv_or_cancel(&rx, token)).unwrap();
        let remote = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            interrupter.interrupt();
        });

        assert_eq!(handle.wait(), Err(AgentError::Interrupted));
        remote.join().unwrap();
        assert!(executor.is_interrupted());
    }

    #[test]
    fn test_dropped_handle_cancels_task() {
        let executor = ThreadExecutor::new("test-exec").unwrap();
        let (_tx, rx) = crossbeam_channel::unbounded::<u8>();

        let handle = executor.execute(move |token| recv_or_cancel(&rx, token)).unwrap();
        assert!(executor.is_busy());
        drop(handle);

        for _ in 0..100 {
            if !executor.is_busy() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!executor.is_busy());
        assert_eq!(executor.execute(|_| Ok(3)).unwrap().wait(), Ok(3));
    }
}
