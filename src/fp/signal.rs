// Copyright (c) 2025 - Cowboy AI, Inc.
//! Signal - Replay-latest event broadcaster
//!
//! A `Signal<T, E>` carries a stream of `Result<T, E>` events to any number of
//! subscribers. It remembers the most recent event, so a subscriber that joins
//! late is brought up to date immediately.
//!
//! # Semantics
//!
//! - `publish` stores the event as the latest one, then calls every subscriber
//!   synchronously, in subscription order
//! - `subscribe` replays the latest event (if any) to the new subscriber, then
//!   delivers every later event in publish order
//! - `subscribe` returns a [`Subscription`]; dropping it unsubscribes, and
//!   [`Subscription::detach`] keeps the callback for the Signal's lifetime
//!
//! ```text
//! s.publish(1); s.publish(2);
//! s.subscribe(cb)        // cb receives Ok(2) only
//! ```
//!
//! # Concurrency
//!
//! Deliveries are serialized by a reentrant lock, so publishes from different
//! threads never interleave. A subscriber may publish to or subscribe on the
//! same Signal from inside its callback: such a publish is queued and
//! delivered by the outermost `publish` once the current event has reached
//! every subscriber, keeping publish order for all of them. The subscriber
//! list is never locked while callbacks run.

use crate::errors::ConduitError;
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;
use uuid::Uuid;

/// Identifier of one subscription
pub type SubscriptionId = Uuid;

type Callback<T, E> = Arc<dyn Fn(Result<T, E>) + Send + Sync>;

struct SignalState<T, E> {
    last: Option<Result<T, E>>,
    subscribers: Vec<(SubscriptionId, Callback<T, E>)>,
    /// Events published while a delivery was in progress
    pending: VecDeque<Result<T, E>>,
}

struct SignalInner<T, E> {
    /// Held for a whole delivery; the flag marks an active drain on the owner thread
    delivery: ReentrantMutex<Cell<bool>>,
    state: Mutex<SignalState<T, E>>,
    /// Link to the source Signal, held by derived Signals
    upstream: Mutex<Option<Subscription>>,
}

impl<T, E> SignalInner<T, E> {
    fn remove(&self, id: SubscriptionId) {
        let removed = {
            let mut state = self.state.lock();
            state
                .subscribers
                .iter()
                .position(|(subscriber, _)| *subscriber == id)
                .map(|index| state.subscribers.remove(index))
        };
        drop(removed);
    }
}

/// A replay-latest, multi-subscriber broadcaster of results
pub struct Signal<T, E = ConduitError> {
    inner: Arc<SignalInner<T, E>>,
}

impl<T, E> Clone for Signal<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for Signal<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Signal")
            .field("type", &std::any::type_name::<T>())
            .field("has_event", &state.last.is_some())
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

impl<T, E> Default for Signal<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Signal<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a Signal with no event yet
    pub fn new() -> Self {
        Self::from_last(None)
    }

    /// Create a Signal whose latest event is `Ok(value)`
    pub fn with_value(value: T) -> Self {
        Self::from_last(Some(Ok(value)))
    }

    /// Create a Signal whose latest event is `event`
    pub fn with_event(event: Result<T, E>) -> Self {
        Self::from_last(Some(event))
    }

    fn from_last(last: Option<Result<T, E>>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                delivery: ReentrantMutex::new(Cell::new(false)),
                state: Mutex::new(SignalState {
                    last,
                    subscribers: Vec::new(),
                    pending: VecDeque::new(),
                }),
                upstream: Mutex::new(None),
            }),
        }
    }

    /// Register a callback
    ///
    /// The latest event, if any, is replayed to `callback` before this method
    /// returns.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Result<T, E>) + Send + Sync + 'static,
    {
        let callback: Callback<T, E> = Arc::new(callback);
        let id = Uuid::now_v7();

        let _delivery = self.inner.delivery.lock();
        let replay = {
            let mut state = self.inner.state.lock();
            state.subscribers.push((id, Arc::clone(&callback)));
            state.last.clone()
        };

        if let Some(event) = replay {
            callback(event);
        }

        let source = Arc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(inner) = Weak::upgrade(&source) {
                inner.remove(id);
            }
        })
    }

    /// Store `event` as the latest event and notify every subscriber
    ///
    /// Called from inside a callback of this Signal, the event is queued and
    /// delivered after the current one.
    pub fn publish(&self, event: Result<T, E>) {
        let delivery = self.inner.delivery.lock();
        self.inner.state.lock().pending.push_back(event);
        if delivery.get() {
            return;
        }

        let _draining = DrainGuard::enter(&delivery);
        loop {
            let next = {
                let mut state = self.inner.state.lock();
                state.pending.pop_front().map(|event| {
                    state.last = Some(event.clone());
                    let subscribers: Vec<Callback<T, E>> = state
                        .subscribers
                        .iter()
                        .map(|(_, callback)| Arc::clone(callback))
                        .collect();
                    (event, subscribers)
                })
            };
            let Some((event, subscribers)) = next else {
                break;
            };

            trace!(subscribers = subscribers.len(), "Publishing signal event");
            for callback in subscribers {
                callback(event.clone());
            }
        }
    }

    /// Publish a successful event
    pub fn publish_value(&self, value: T) {
        self.publish(Ok(value));
    }

    /// The most recently published event
    pub fn last_event(&self) -> Option<Result<T, E>> {
        self.inner.state.lock().last.clone()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Derive a Signal that republishes every event mapped through `f`
    ///
    /// The derived Signal stays subscribed to `self` until it is dropped.
    pub fn map<U, F>(&self, f: F) -> Signal<U, E>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.derive(move |event: Result<T, E>| event.map(&f))
    }

    /// Derive a Signal from a fallible transformation
    pub fn flat_map<U, F>(&self, f: F) -> Signal<U, E>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        self.derive(move |event: Result<T, E>| event.and_then(&f))
    }

    fn derive<U, F>(&self, transform: F) -> Signal<U, E>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(Result<T, E>) -> Result<U, E> + Send + Sync + 'static,
    {
        let derived = Signal::<U, E>::new();
        let target = Arc::downgrade(&derived.inner);

        let subscription = self.subscribe(move |event| {
            if let Some(inner) = target.upgrade() {
                Signal { inner }.publish(transform(event));
            }
        });

        *derived.inner.upstream.lock() = Some(subscription);
        derived
    }
}

/// Marks the owner thread as draining; cleared even if a callback panics
struct DrainGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> DrainGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Handle for one registered Signal callback
///
/// Dropping the handle removes the callback from its Signal.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: SubscriptionId,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new<F>(id: SubscriptionId, cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Identifier of this subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the callback from its Signal
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the callback registered for as long as the Signal lives
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
