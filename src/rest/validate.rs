// Copyright (c) 2025 - Cowboy AI, Inc.
//! Response validation stages
//!
//! Each validator passes a [`TransportResult`] through unchanged or turns it
//! into a failure. They are meant to run in this order:
//!
//! ```text
//! validate_transport_error   transport failure     -> NoConnectivity | HostNotFound
//!                                                     | RequestTimedOut | Transport
//! validate_response_present  no response metadata  -> NoResponse
//! validate_client_error      status 400..=499      -> ClientError
//! validate_server_error      status 500..=599      -> ServerError
//! extract_payload            no body               -> NoPayload
//! ```

use super::transport::{TransportErrorKind, TransportResult};
use crate::errors::{ConduitError, ConduitResult};
use bytes::Bytes;
use tracing::{debug, warn};

/// Fail when the transport reported an error
pub fn validate_transport_error(result: TransportResult) -> ConduitResult<TransportResult> {
    let Some(error) = &result.error else {
        return Ok(result);
    };

    warn!(kind = ?error.kind, message = %error.message, "Transport failure");

    Err(match error.kind {
        TransportErrorKind::NotConnected => ConduitError::NoConnectivity,
        TransportErrorKind::HostNotFound => ConduitError::HostNotFound,
        TransportErrorKind::TimedOut => ConduitError::RequestTimedOut,
        TransportErrorKind::Other => ConduitError::Transport(error.message.clone()),
    })
}

/// Fail when no response metadata arrived
pub fn validate_response_present(result: TransportResult) -> ConduitResult<TransportResult> {
    if result.response.is_none() {
        return Err(ConduitError::NoResponse);
    }
    Ok(result)
}

/// Fail on a 4xx status, keeping the payload for inspection
pub fn validate_client_error(result: TransportResult) -> ConduitResult<TransportResult> {
    match result.status() {
        Some(status_code @ 400..=499) => {
            debug!(status_code, "Client error response");
            Err(ConduitError::ClientError {
                status_code,
                payload: result.payload,
            })
        }
        _ => Ok(result),
    }
}

/// Fail on a 5xx status
pub fn validate_server_error(result: TransportResult) -> ConduitResult<TransportResult> {
    match result.status() {
        Some(status_code @ 500..=599) => {
            debug!(status_code, "Server error response");
            Err(ConduitError::ServerError { status_code })
        }
        _ => Ok(result),
    }
}

/// Take the response body
pub fn extract_payload(result: TransportResult) -> ConduitResult<Bytes> {
    result.payload.ok_or(ConduitError::NoPayload)
}

/// All four validators, in order
pub fn validate_response(result: TransportResult) -> ConduitResult<TransportResult> {
    validate_transport_error(result)
        .and_then(validate_response_present)
        .and_then(validate_client_error)
        .and_then(validate_server_error)
}
