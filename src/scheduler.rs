// Copyright (c) 2025 - Cowboy AI, Inc.
//! Execution Contexts and Context Hopping
//!
//! A [`Deferred`] never chooses a thread on its own. The helpers in this
//! module move work, or the delivery of a result, onto an explicit execution
//! context.
//!
//! # Contexts
//!
//! - [`SerialQueue`] - one dedicated thread running jobs in FIFO order; the
//!   "main" context of a [`Scheduler`] is usually one of these
//! - [`BackgroundPool`] - tokio's blocking pool on a given runtime handle
//! - [`Immediate`] - runs the job inline on the calling thread
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_conduit::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::spawn(tokio::runtime::Handle::current())?;
//!
//! // Deliver the outcome of a network call on the main queue
//! let chat = scheduler.run_future_result_on_main_queue(http.chat());
//! chat.run(|result| render(result));
//! ```

use crate::errors::{ConduitError, ConduitResult};
use crate::fp::Deferred;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::ThreadId;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Unit of work posted onto an execution context
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that runs posted jobs
pub trait Executor: Send + Sync {
    /// Post `job` for execution
    fn execute(&self, job: Job);
}

/// A dedicated thread running jobs one at a time, in posting order
///
/// The thread stops once the queue is dropped and its pending jobs ran. A
/// panicking job is logged and does not stop the jobs queued after it.
pub struct SerialQueue {
    label: String,
    thread: ThreadId,
    sender: mpsc::UnboundedSender<Job>,
}

impl SerialQueue {
    /// Start a queue on a new thread named `label`
    pub fn new(label: impl Into<String>) -> ConduitResult<Self> {
        let label = label.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker_label = label.clone();
        let handle = std::thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!(queue = %worker_label, "Job panicked, queue keeps running");
                    }
                }
            })
            .map_err(|e| {
                ConduitError::Configuration(format!("Cannot start queue '{}': {}", label, e))
            })?;

        debug!(queue = %label, "Started serial queue");

        Ok(Self {
            thread: handle.thread().id(),
            label,
            sender,
        })
    }

    /// Name of the queue thread
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the caller is running on this queue's thread
    pub fn is_current(&self) -> bool {
        std::thread::current().id() == self.thread
    }
}

impl Executor for SerialQueue {
    fn execute(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!(queue = %self.label, "Serial queue has stopped, dropping job");
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label)
            .finish()
    }
}

/// Tokio's blocking thread pool
#[derive(Debug, Clone)]
pub struct BackgroundPool {
    handle: Handle,
}

impl BackgroundPool {
    /// Use the blocking pool of the runtime behind `handle`
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Executor for BackgroundPool {
    fn execute(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }
}

/// Runs jobs inline on the posting thread
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Executor for Immediate {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Post a job resolving with `value` onto `executor`
fn dispatch<T, E>(executor: Arc<dyn Executor>, value: T) -> Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    Deferred::new(move |completion| {
        let value = value.clone();
        executor.execute(Box::new(move || completion(Ok(value))));
    })
}

/// Stage that resolves with its input once `executor` runs it
pub fn run_on_queue<T, E>(
    executor: Arc<dyn Executor>,
) -> impl Fn(T) -> Deferred<T, E> + Clone + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    move |value| dispatch(Arc::clone(&executor), value)
}

/// Stage that resolves with its input on a context-owning serial queue
///
/// Used for state that must only be touched from its own queue.
pub fn run_on_queue_for_context<T, E>(
    context: Arc<SerialQueue>,
) -> impl Fn(T) -> Deferred<T, E> + Clone + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    run_on_queue(context)
}

/// The main and background contexts of an application
#[derive(Clone)]
pub struct Scheduler {
    main: Arc<dyn Executor>,
    background: Arc<dyn Executor>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Assemble a scheduler from explicit contexts
    pub fn new(main: Arc<dyn Executor>, background: Arc<dyn Executor>) -> Self {
        Self { main, background }
    }

    /// Start a `main` serial queue and use the blocking pool of `handle` for
    /// background work
    pub fn spawn(handle: Handle) -> ConduitResult<Self> {
        let main = SerialQueue::new("main")?;
        Ok(Self::new(Arc::new(main), Arc::new(BackgroundPool::new(handle))))
    }

    /// A scheduler whose contexts both run inline
    pub fn immediate() -> Self {
        Self::new(Arc::new(Immediate), Arc::new(Immediate))
    }

    /// The main context
    pub fn main(&self) -> Arc<dyn Executor> {
        Arc::clone(&self.main)
    }

    /// The background context
    pub fn background(&self) -> Arc<dyn Executor> {
        Arc::clone(&self.background)
    }

    /// Resolve with `value` once the main context runs the job
    pub fn run_on_main_queue<T, E>(&self, value: T) -> Deferred<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Send + 'static,
    {
        dispatch(self.main(), value)
    }

    /// Resolve with `value` once the background context runs the job
    pub fn run_on_background<T, E>(&self, value: T) -> Deferred<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Send + 'static,
    {
        dispatch(self.background(), value)
    }

    /// Run `deferred`, then deliver whatever it produced on the main context
    pub fn run_future_result_on_main_queue<T, E>(&self, deferred: Deferred<T, E>) -> Deferred<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let main = self.main();
        Deferred::new(move |completion| {
            let main = Arc::clone(&main);
            deferred.run(move |result| main.execute(Box::new(move || completion(result))));
        })
    }

    /// Run `deferred`; deliver failures on the main context and successes on
    /// whichever context produced them
    pub fn run_future_failure_on_main_queue<T, E>(
        &self,
        deferred: Deferred<T, E>,
    ) -> Deferred<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let main = self.main();
        Deferred::new(move |completion| {
            let main = Arc::clone(&main);
            deferred.run(move |result| match result {
                Ok(value) => completion(Ok(value)),
                Err(error) => main.execute(Box::new(move || completion(Err(error)))),
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    fn main_queue() -> (Arc<SerialQueue>, Scheduler) {
        let queue = Arc::new(SerialQueue::new("test-main").unwrap());
        let scheduler = Scheduler::new(queue.clone(), Arc::new(Immediate));
        (queue, scheduler)
    }

    #[test]
    fn test_run_on_main_queue_resolves_on_queue_thread() {
        let (queue, scheduler) = main_queue();
        let (tx, rx) = std_mpsc::channel();

        let observer = Arc::clone(&queue);
        scheduler
            .run_on_main_queue::<_, ConduitError>(9)
            .run(move |result| {
                tx.send((result, observer.is_current())).unwrap();
            });

        let (result, on_queue) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, Ok(9));
        assert!(on_queue);
    }

    #[test]
    fn test_serial_queue_preserves_order() {
        let queue = SerialQueue::new("ordered").unwrap();
        let (tx, rx) = std_mpsc::channel();

        for i in 0..10 {
            let tx = tx.clone();
            queue.execute(Box::new(move || tx.send(i).unwrap()));
        }

        let received: Vec<i32> = (0..10)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_serial_queue_survives_panicking_job() {
        let (queue, scheduler) = main_queue();
        queue.execute(Box::new(|| panic!("job failed")));

        let (tx, rx) = std_mpsc::channel();
        scheduler
            .run_on_main_queue::<_, ConduitError>("after")
            .run(move |result| tx.send(result).unwrap());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok("after"));
    }

    #[test]
    fn test_result_relocated_to_main_queue() {
        let (queue, scheduler) = main_queue();
        let (tx, rx) = std_mpsc::channel();

        let observer = Arc::clone(&queue);
        scheduler
            .run_future_result_on_main_queue(Deferred::<i32>::error(ConduitError::NoPayload))
            .run(move |result| {
                tx.send((result, observer.is_current())).unwrap();
            });

        let (result, on_queue) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, Err(ConduitError::NoPayload));
        assert!(on_queue);
    }

    #[test]
    fn test_failure_only_relocation() {
        let (queue, scheduler) = main_queue();

        // Success stays on the calling thread
        let (tx, rx) = std_mpsc::channel();
        let observer = Arc::clone(&queue);
        let caller = std::thread::current().id();
        scheduler
            .run_future_failure_on_main_queue(Deferred::<i32>::value(1))
            .run(move |result| {
                tx.send((result, observer.is_current(), std::thread::current().id() == caller))
                    .unwrap();
            });
        let (result, on_queue, on_caller) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, Ok(1));
        assert!(!on_queue);
        assert!(on_caller);

        // Failure moves to the main queue
        let (tx, rx) = std_mpsc::channel();
        let observer = Arc::clone(&queue);
        scheduler
            .run_future_failure_on_main_queue(Deferred::<i32>::error(ConduitError::NoResponse))
            .run(move |result| {
                tx.send((result, observer.is_current())).unwrap();
            });
        let (result, on_queue) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, Err(ConduitError::NoResponse));
        assert!(on_queue);
    }

    #[test]
    fn test_run_on_queue_for_context() {
        let context = Arc::new(SerialQueue::new("store-context").unwrap());
        let stage = run_on_queue_for_context::<_, ConduitError>(Arc::clone(&context));
        let (tx, rx) = std_mpsc::channel();

        let observer = Arc::clone(&context);
        stage("row").run(move |result| {
            tx.send((result, observer.is_current())).unwrap();
        });

        let (result, on_context) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, Ok("row"));
        assert!(on_context);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_on_background() {
        let scheduler = Scheduler::new(Arc::new(Immediate), Arc::new(BackgroundPool::new(Handle::current())));
        let result = scheduler
            .run_on_background::<_, ConduitError>("work")
            .resolve()
            .await;
        assert_eq!(result, Ok("work"));
    }
}
