// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred - Lazy, re-runnable asynchronous computations
//!
//! A `Deferred<T, E>` wraps a single operation that, when run, eventually hands
//! a `Result<T, E>` to a completion callback. It is the callback-driven
//! counterpart of `std::future::Future`: nothing is polled, the operation
//! decides on which thread and at which moment it completes.
//!
//! # Characteristics
//!
//! - **Lazy**: constructing a Deferred performs no work
//! - **Re-runnable**: every call to [`Deferred::run`] executes the operation
//!   again; results are never cached
//! - **No implicit threading**: the operation runs on the caller's context;
//!   hopping between contexts is done explicitly with [`crate::scheduler`]
//! - **Exactly once**: an operation must call its completion exactly once.
//!   An operation that never does so leaves the consumer waiting forever,
//!   unless the Deferred is wrapped with [`Deferred::with_timeout`] or
//!   [`Deferred::with_cancellation`]
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_conduit::fp::Deferred;
//!
//! let answer: Deferred<i32> = Deferred::value(20)
//!     .map(|x| x + 1)
//!     .flat_map(|x| Deferred::value(x * 2));
//!
//! answer.run(|result| assert_eq!(result, Ok(42)));
//! ```

use crate::errors::ConduitError;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Callback receiving the outcome of one run
pub type Completion<T, E> = Box<dyn FnOnce(Result<T, E>) + Send + 'static>;

type Operation<T, E> = Arc<dyn Fn(Completion<T, E>) + Send + Sync + 'static>;

/// A deferred, re-runnable computation producing `Result<T, E>`
pub struct Deferred<T, E = ConduitError> {
    operation: Operation<T, E>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deferred<{}>", std::any::type_name::<T>())
    }
}

impl<T: Send + 'static, E: Send + 'static> Deferred<T, E> {
    /// Create a Deferred from a raw asynchronous operation
    ///
    /// The operation receives the completion callback and must call it exactly
    /// once, synchronously or from any other thread.
    pub fn new<F>(operation: F) -> Self
    where
        F: Fn(Completion<T, E>) + Send + Sync + 'static,
    {
        Self {
            operation: Arc::new(operation),
        }
    }

    /// Create a Deferred that completes immediately with `result`
    pub fn from_result(result: Result<T, E>) -> Self
    where
        T: Clone + Sync,
        E: Clone + Sync,
    {
        Self::new(move |completion| completion(result.clone()))
    }

    /// Create a Deferred that succeeds immediately with `value`
    pub fn value(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |completion| completion(Ok(value.clone())))
    }

    /// Create a Deferred that fails immediately with `error`
    pub fn error(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move |completion| completion(Err(error.clone())))
    }

    /// Create a Deferred that drives a future on a tokio runtime
    ///
    /// `factory` is called once per run, so every run gets a fresh future.
    pub fn from_async<F, Fut>(handle: Handle, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(move |completion| {
            let future = factory();
            handle.spawn(async move {
                completion(future.await);
            });
        })
    }

    /// Execute the operation, handing its outcome to `completion`
    pub fn run<F>(&self, completion: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        (self.operation)(Box::new(completion));
    }

    /// Transform the success value
    pub fn map<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Deferred::new(move |completion: Completion<U, E>| {
            let f = Arc::clone(&f);
            self.run(move |result| completion(result.map(|value| f(value))));
        })
    }

    /// Transform the failure reason
    pub fn map_err<E2, F>(self, f: F) -> Deferred<T, E2>
    where
        E2: Send + 'static,
        F: Fn(E) -> E2 + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Deferred::new(move |completion: Completion<T, E2>| {
            let f = Arc::clone(&f);
            self.run(move |result| completion(result.map_err(|error| f(error))));
        })
    }

    /// Chain a dependent Deferred
    ///
    /// On success `f` produces the next Deferred, which is run and whose
    /// result is forwarded. On failure `f` is never called.
    pub fn flat_map<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Deferred<U, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Deferred::new(move |completion: Completion<U, E>| {
            let f = Arc::clone(&f);
            self.run(move |result| match result {
                Ok(value) => f(value).run(completion),
                Err(error) => completion(Err(error)),
            });
        })
    }

    /// Apply a deferred function to this deferred value
    ///
    /// The function-producing Deferred always runs first. Only when it succeeds
    /// is `self` run, so a failing function side wins over a failing value side.
    pub fn apply<U, F>(self, f: Deferred<F, E>) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Deferred::new(move |completion: Completion<U, E>| {
            let value = self.clone();
            f.run(move |func| match func {
                Ok(func) => value.run(move |result| completion(result.map(func))),
                Err(error) => completion(Err(error)),
            });
        })
    }

    /// Await the outcome of one run from async code
    ///
    /// An operation that drops its completion without calling it resolves to
    /// [`ConduitError::Abandoned`].
    pub async fn resolve(self) -> Result<T, E>
    where
        E: From<ConduitError>,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.run(move |result| {
            let _ = tx.send(result);
        });

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ConduitError::Abandoned.into()),
        }
    }

    /// Fail with `on_timeout` when a run takes longer than `duration`
    ///
    /// The wrapped operation is not interrupted; its late result is discarded.
    pub fn with_timeout(self, handle: Handle, duration: Duration, on_timeout: E) -> Self
    where
        E: Clone + Sync,
    {
        Deferred::new(move |completion| {
            let slot = CompletionSlot::new(completion);
            let timer_slot = slot.clone();
            let error = on_timeout.clone();

            let timer = handle.spawn(async move {
                tokio::time::sleep(duration).await;
                if timer_slot.complete(Err(error)) {
                    debug!(?duration, "Deferred operation timed out");
                }
            });

            self.run(move |result| {
                if slot.complete(result) {
                    timer.abort();
                } else {
                    debug!("Discarding result that arrived after timeout");
                }
            });
        })
    }

    /// Fail with `on_cancel` as soon as `token` is cancelled
    ///
    /// A run started after cancellation fails immediately without executing the
    /// operation. A run in flight keeps going, but its result is discarded.
    pub fn with_cancellation(self, token: CancelToken, on_cancel: E) -> Self
    where
        E: Clone + Sync,
    {
        Deferred::new(move |completion| {
            let slot = CompletionSlot::new(completion);
            let cancel_slot = slot.clone();
            let error = on_cancel.clone();

            let listener = token.on_cancel(move || {
                if cancel_slot.complete(Err(error)) {
                    debug!("Deferred operation cancelled");
                }
            });

            let Some(listener) = listener else {
                return;
            };

            let token = token.clone();
            self.run(move |result| {
                if slot.complete(result) {
                    token.forget(listener);
                } else {
                    debug!("Discarding result of cancelled operation");
                }
            });
        })
    }
}

impl<U: Send + 'static, E: Send + 'static> Deferred<Deferred<U, E>, E> {
    /// Collapse a Deferred of a Deferred
    ///
    /// The outer Deferred runs first; the inner one only runs when the outer
    /// succeeded.
    pub fn flatten(self) -> Deferred<U, E> {
        Deferred::new(move |completion: Completion<U, E>| {
            self.run(move |outer| match outer {
                Ok(inner) => inner.run(completion),
                Err(error) => completion(Err(error)),
            });
        })
    }
}

/// Shared, take-once holder for a completion
///
/// Whichever party calls [`CompletionSlot::complete`] first delivers the
/// result; later calls are no-ops.
struct CompletionSlot<T, E> {
    inner: Arc<Mutex<Option<Completion<T, E>>>>,
}

impl<T, E> Clone for CompletionSlot<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> CompletionSlot<T, E> {
    fn new(completion: Completion<T, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(completion))),
        }
    }

    fn complete(&self, result: Result<T, E>) -> bool {
        let taken = self.inner.lock().take();
        match taken {
            Some(completion) => {
                completion(result);
                true
            }
            None => false,
        }
    }
}

/// Caller-held handle for abandoning deferred runs
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

type ListenerId = u64;

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Box<dyn FnOnce() + Send>)>>,
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every run observing this token
    ///
    /// Cancelling twice has no further effect.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let listeners = std::mem::take(&mut *self.inner.listeners.lock());
        for (_, listener) in listeners {
            listener();
        }
    }

    /// Whether [`CancelToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Number of runs still in flight under this token
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Register `listener`, or call it right away when already cancelled
    ///
    /// Returns `None` when the listener has already been called.
    fn on_cancel<F>(&self, listener: F) -> Option<ListenerId>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut listeners = self.inner.listeners.lock();
        if self.is_cancelled() {
            drop(listeners);
            listener();
            None
        } else {
            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            listeners.push((id, Box::new(listener)));
            Some(id)
        }
    }

    /// Drop a listener whose run completed on its own
    fn forget(&self, id: ListenerId) {
        let removed = {
            let mut listeners = self.inner.listeners.lock();
            listeners
                .iter()
                .position(|(listener, _)| *listener == id)
                .map(|index| listeners.swap_remove(index))
        };
        drop(removed);
    }
}
