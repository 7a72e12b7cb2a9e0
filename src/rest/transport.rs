// Copyright (c) 2025 - Cowboy AI, Inc.
//! HTTP transport boundary
//!
//! The pipeline never talks to the network itself. It hands a [`Request`] to
//! an [`HttpTransport`] and receives one [`TransportResult`] back. Transport
//! failures are carried inside the result, so the perform stage always
//! succeeds and the validation stages decide what counts as a failure.

use super::request::Request;
use crate::fp::Deferred;
use bytes::Bytes;
use http::HeaderMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Classification of a failed network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The device has no usable network
    NotConnected,
    /// DNS resolution failed
    HostNotFound,
    /// The call exceeded its deadline
    TimedOut,
    /// Anything else
    Other,
}

/// A failed network call as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    /// Failure classification
    pub kind: TransportErrorKind,
    /// Transport-provided description
    pub message: String,
}

impl TransportError {
    /// Create a transport error
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Status line and headers of a received response
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
}

/// Raw outcome of one network call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResult {
    /// Response body
    pub payload: Option<Bytes>,
    /// Response metadata, absent when no response arrived
    pub response: Option<ResponseMeta>,
    /// Transport failure, if the call failed
    pub error: Option<TransportError>,
}

impl TransportResult {
    /// A received response with the given status and body
    pub fn response(status: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            payload: Some(payload.into()),
            response: Some(ResponseMeta {
                status,
                headers: HeaderMap::new(),
            }),
            error: None,
        }
    }

    /// A received response without a body
    pub fn empty_response(status: u16) -> Self {
        Self {
            payload: None,
            response: Some(ResponseMeta {
                status,
                headers: HeaderMap::new(),
            }),
            error: None,
        }
    }

    /// A failed call
    pub fn failure(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            payload: None,
            response: None,
            error: Some(TransportError::new(kind, message)),
        }
    }

    /// Status code of the response, if one arrived
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|meta| meta.status)
    }
}

/// Callback receiving the transport outcome
pub type TransportCompletion = Box<dyn FnOnce(TransportResult) + Send + 'static>;

/// Performs HTTP requests
///
/// Implementations must call `completion` exactly once.
pub trait HttpTransport: Send + Sync {
    /// Perform `request` and report the outcome through `completion`
    fn perform(&self, request: Request, completion: TransportCompletion);
}

/// Stage performing a request through `transport`
///
/// The resulting Deferred always succeeds; a failed call is encoded in the
/// [`TransportResult`].
pub fn perform_request(
    transport: Arc<dyn HttpTransport>,
) -> impl Fn(Request) -> Deferred<TransportResult> + Clone + Send + Sync + 'static {
    move |request| {
        let transport = Arc::clone(&transport);
        Deferred::new(move |completion| {
            debug!(method = %request.method(), uri = %request.uri(), "Performing request");
            transport.perform(
                request.clone(),
                Box::new(move |result| completion(Ok(result))),
            );
        })
    }
}

/// Transport answering every request with the same canned result
///
/// Records the requests it receives. Useful in tests and offline runs.
#[derive(Clone)]
pub struct CannedTransport {
    result: TransportResult,
    received: Arc<Mutex<Vec<Request>>>,
}

impl CannedTransport {
    /// Answer every request with `result`
    pub fn new(result: TransportResult) -> Self {
        Self {
            result,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests performed so far, oldest first
    pub fn received(&self) -> Vec<Request> {
        self.received.lock().clone()
    }
}

impl fmt::Debug for CannedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CannedTransport")
            .field("result", &self.result)
            .field("received", &self.received.lock().len())
            .finish()
    }
}

impl HttpTransport for CannedTransport {
    fn perform(&self, request: Request, completion: TransportCompletion) {
        self.received.lock().push(request);
        completion(self.result.clone());
    }
}
