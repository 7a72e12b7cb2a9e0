// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for conduit operations
//!
//! Every pipeline stage reports failure through [`ConduitError`] instead of
//! panicking. The enum is `Clone` so that immediate [`Deferred`] values can be
//! re-run, and `PartialEq` so that failures can be compared directly in tests.
//!
//! [`Deferred`]: crate::fp::Deferred

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while building, performing or decoding requests and
/// while driving the socket adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConduitError {
    /// The request target is not an absolute URI
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// A header name or value could not be encoded
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The device has no network connectivity
    #[error("No internet connection")]
    NoConnectivity,

    /// DNS lookup for the target host failed
    #[error("Hostname not found")]
    HostNotFound,

    /// The transport gave up waiting for the remote side
    #[error("Request timed out")]
    RequestTimedOut,

    /// Any other transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport produced no response metadata
    #[error("No response")]
    NoResponse,

    /// The server answered with a 4xx status code
    #[error("Client error: HTTP {status_code}")]
    ClientError {
        /// HTTP status code (400-499)
        status_code: u16,
        /// Response payload, when one was received
        payload: Option<Bytes>,
    },

    /// The server answered with a 5xx status code
    #[error("Server error: HTTP {status_code}")]
    ServerError {
        /// HTTP status code (500-599)
        status_code: u16,
    },

    /// The response carried no payload
    #[error("No data")]
    NoPayload,

    /// The payload could not be decoded
    #[error("Payload decode error: {0}")]
    PayloadDecode(String),

    /// The payload decoded, but not into the expected shape
    #[error("Unexpected payload shape: expected {0}")]
    UnexpectedShape(String),

    /// A domain object could not be built from its parts
    #[error("Cannot build domain object: {0}")]
    DomainObjectBuild(String),

    /// A value could not be serialized into a request body or message
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The socket is not connected
    #[error("Socket not connected")]
    SocketNotConnected,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A deferred operation dropped its completion without calling it
    #[error("Operation abandoned without completing")]
    Abandoned,

    /// The caller cancelled a running deferred operation
    #[error("Operation cancelled")]
    Cancelled,

    /// A deferred operation did not complete within its deadline
    #[error("Operation timed out after {0:?}")]
    TimedOut(Duration),
}

/// Result type for conduit operations
pub type ConduitResult<T> = Result<T, ConduitError>;

impl From<serde_json::Error> for ConduitError {
    fn from(err: serde_json::Error) -> Self {
        ConduitError::PayloadDecode(err.to_string())
    }
}

impl From<async_nats::ConnectError> for ConduitError {
    fn from(err: async_nats::ConnectError) -> Self {
        ConduitError::Transport(err.to_string())
    }
}

impl ConduitError {
    /// Whether the failure originated in the transport rather than in the
    /// remote service or the payload
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConduitError::NoConnectivity
                | ConduitError::HostNotFound
                | ConduitError::RequestTimedOut
                | ConduitError::Transport(_)
                | ConduitError::NoResponse
        )
    }
}
