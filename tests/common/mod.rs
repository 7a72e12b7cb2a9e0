// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shared helpers for integration tests
//!
//! - `outcomes` runs a Deferred whose operation completes synchronously and
//!   collects every delivery
//! - `LoopbackTransport` is an in-memory duplex channel the test drives by
//!   emitting transport events by hand

#![allow(dead_code)]

use bytes::Bytes;
use cim_conduit::adapters::{DuplexTransport, EventSink, TransportEvent};
use cim_conduit::{ConduitResult, Deferred};
use parking_lot::Mutex;
use std::sync::Arc;

/// Run `deferred` once and collect every result it delivered
pub fn outcomes<T, E>(deferred: &Deferred<T, E>) -> Vec<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    deferred.run(move |result| sink.lock().push(result));
    let results = std::mem::take(&mut *seen.lock());
    results
}

/// Run `deferred` and return its single result
pub fn outcome<T, E>(deferred: &Deferred<T, E>) -> Result<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let mut results = outcomes(deferred);
    assert_eq!(results.len(), 1, "deferred must complete exactly once");
    results.remove(0)
}

/// In-memory duplex transport
#[derive(Default)]
pub struct LoopbackTransport {
    sink: Mutex<Option<EventSink>>,
    credential: Mutex<Option<String>>,
    written: Mutex<Vec<Bytes>>,
    opened: Mutex<usize>,
}

impl LoopbackTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `event` as if the network produced it
    pub fn emit(&self, event: TransportEvent) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink(event);
        }
    }

    pub fn credential(&self) -> Option<String> {
        self.credential.lock().clone()
    }

    pub fn written(&self) -> Vec<Bytes> {
        self.written.lock().clone()
    }

    pub fn open_count(&self) -> usize {
        *self.opened.lock()
    }
}

impl DuplexTransport for LoopbackTransport {
    fn open(&self, credential: Option<String>, events: EventSink) -> ConduitResult<()> {
        *self.credential.lock() = credential;
        *self.sink.lock() = Some(events);
        *self.opened.lock() += 1;
        Ok(())
    }

    fn write(&self, frame: Bytes) -> ConduitResult<()> {
        self.written.lock().push(frame);
        Ok(())
    }

    fn close(&self) {
        self.sink.lock().take();
    }
}
