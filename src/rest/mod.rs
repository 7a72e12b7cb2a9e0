// Copyright (c) 2025 - Cowboy AI, Inc.
//! REST Request Pipeline
//!
//! A REST call is assembled from small stages and composed left to right with
//! [`Pipeline`](crate::fp::Pipeline):
//!
//! ```text
//! ()  ──request_for──> Request
//!     ──add_json_headers / add_header / add_query / add_body──> Request
//!     ──perform_request(transport)──> Deferred<TransportResult>
//!     ──validate_response──> TransportResult
//!     ──extract_payload──> Bytes
//!     ──parse_json_as::<T>──> T
//! ```
//!
//! Building and validation stages are synchronous (`-> ConduitResult<_>`);
//! only the perform stage is asynchronous. The first failing stage
//! short-circuits the rest.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_conduit::fp::Pipeline;
//! use cim_conduit::rest::*;
//!
//! let status = Pipeline::start(request_for("https://api.example.com/status"))
//!     .then(add_json_headers)
//!     .then(perform_request(transport))
//!     .then(validate_response)
//!     .then(extract_payload)
//!     .then(parse_json_object);
//!
//! status.call(()).run(|result| println!("{:?}", result));
//! ```

pub mod json;
pub mod request;
pub mod transport;
pub mod validate;

pub use json::{
    add_json_body, add_json_headers, create_json_get_request, create_json_post_request,
    create_json_put_request, parse_json, parse_json_array, parse_json_as, parse_json_object,
};
pub use request::{
    add_body, add_header, add_method, add_query, create_delete_request, create_get_request,
    create_patch_request, create_post_request, create_put_request, create_request, request_for,
    Request, RestMethod,
};
pub use transport::{
    perform_request, CannedTransport, HttpTransport, ResponseMeta, TransportCompletion,
    TransportError, TransportErrorKind, TransportResult,
};
pub use validate::{
    extract_payload, validate_client_error, validate_response, validate_response_present,
    validate_server_error, validate_transport_error,
};
