// Copyright (c) 2025 - Cowboy AI, Inc.
//! JSON request and response stages

use super::request::{create_get_request, create_post_request, create_put_request, Request};
use crate::errors::{ConduitError, ConduitResult};
use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

const APPLICATION_JSON: &str = "application/json";

/// Set `Content-Type` and `Accept` to `application/json`
pub fn add_json_headers(request: Request) -> ConduitResult<Request> {
    Ok(request
        .with_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
        .with_header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON)))
}

/// Attach `value` as a JSON body, with JSON headers
///
/// `value` is serialized once, up front; a serialization failure surfaces as
/// [`ConduitError::Serialization`] every time the stage runs.
pub fn add_json_body<T: Serialize + ?Sized>(
    value: &T,
) -> impl Fn(Request) -> ConduitResult<Request> + Clone + Send + Sync + 'static {
    let encoded = serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| ConduitError::Serialization(e.to_string()));

    move |request| {
        let body = encoded.clone()?;
        add_json_headers(request).map(|request| request.with_body(body))
    }
}

/// GET request for `target` with JSON headers
pub fn create_json_get_request(target: &str) -> ConduitResult<Request> {
    create_get_request(target).and_then(add_json_headers)
}

/// POST request for `target` carrying `body` as JSON
pub fn create_json_post_request<T: Serialize + ?Sized>(
    target: &str,
    body: &T,
) -> ConduitResult<Request> {
    create_post_request(target).and_then(add_json_body(body))
}

/// PUT request for `target` carrying `body` as JSON
pub fn create_json_put_request<T: Serialize + ?Sized>(
    target: &str,
    body: &T,
) -> ConduitResult<Request> {
    create_put_request(target).and_then(add_json_body(body))
}

/// Decode a payload into a JSON document
pub fn parse_json(payload: Bytes) -> ConduitResult<Value> {
    Ok(serde_json::from_slice(&payload)?)
}

/// Decode a payload whose top level must be an object
pub fn parse_json_object(payload: Bytes) -> ConduitResult<Map<String, Value>> {
    match parse_json(payload)? {
        Value::Object(object) => Ok(object),
        _ => Err(ConduitError::UnexpectedShape("object".to_string())),
    }
}

/// Decode a payload whose top level must be an array
pub fn parse_json_array(payload: Bytes) -> ConduitResult<Vec<Value>> {
    match parse_json(payload)? {
        Value::Array(items) => Ok(items),
        _ => Err(ConduitError::UnexpectedShape("array".to_string())),
    }
}

/// Decode a payload into `T`
pub fn parse_json_as<T: DeserializeOwned>(payload: Bytes) -> ConduitResult<T> {
    Ok(serde_json::from_slice(&payload)?)
}
