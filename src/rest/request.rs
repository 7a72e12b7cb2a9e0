// Copyright (c) 2025 - Cowboy AI, Inc.
//! Request construction stages
//!
//! A [`Request`] is an immutable value. Each stage takes a request and returns
//! a new one, so partially built requests can be shared freely between
//! pipelines.
//!
//! ```text
//! request_for(target) ─> add_method ─> add_header ─> add_query ─> add_body
//!        ()           ─>  Request   ─>  Request   ─>  Request  ─>  Request
//! ```

use crate::errors::{ConduitError, ConduitResult};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::uri::PathAndQuery;
use http::{HeaderMap, Method, Uri};
use std::fmt;

/// HTTP methods supported by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RestMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl RestMethod {
    /// The equivalent `http::Method`
    pub fn as_http(&self) -> Method {
        match self {
            RestMethod::Get => Method::GET,
            RestMethod::Post => Method::POST,
            RestMethod::Put => Method::PUT,
            RestMethod::Patch => Method::PATCH,
            RestMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for RestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_http().as_str())
    }
}

/// An outgoing HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    uri: Uri,
    method: RestMethod,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Target URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// HTTP method
    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// Header fields
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes, if any
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn with_method(mut self, method: RestMethod) -> Self {
        self.method = method;
        self
    }

    pub(crate) fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub(crate) fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }
}

/// Build a GET request for an absolute target URI
///
/// Fails with [`ConduitError::InvalidResource`] when the target does not parse
/// or lacks a scheme or host.
pub fn create_request(target: &str) -> ConduitResult<Request> {
    let uri: Uri = target
        .parse()
        .map_err(|e| ConduitError::InvalidResource(format!("{}: {}", target, e)))?;

    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(ConduitError::InvalidResource(format!(
            "{}: not an absolute URI",
            target
        )));
    }

    Ok(Request {
        uri,
        method: RestMethod::Get,
        headers: HeaderMap::new(),
        body: None,
    })
}

/// Stage form of [`create_request`], used to start a pipeline
pub fn request_for(
    target: impl Into<String>,
) -> impl Fn(()) -> ConduitResult<Request> + Clone + Send + Sync + 'static {
    let target = target.into();
    move |()| create_request(&target)
}

/// GET request for `target`
pub fn create_get_request(target: &str) -> ConduitResult<Request> {
    create_request(target)
}

/// POST request for `target`
pub fn create_post_request(target: &str) -> ConduitResult<Request> {
    create_request(target).map(|request| request.with_method(RestMethod::Post))
}

/// PUT request for `target`
pub fn create_put_request(target: &str) -> ConduitResult<Request> {
    create_request(target).map(|request| request.with_method(RestMethod::Put))
}

/// PATCH request for `target`
pub fn create_patch_request(target: &str) -> ConduitResult<Request> {
    create_request(target).map(|request| request.with_method(RestMethod::Patch))
}

/// DELETE request for `target`
pub fn create_delete_request(target: &str) -> ConduitResult<Request> {
    create_request(target).map(|request| request.with_method(RestMethod::Delete))
}

/// Set the request method
pub fn add_method(
    method: RestMethod,
) -> impl Fn(Request) -> ConduitResult<Request> + Clone + Send + Sync + 'static {
    move |request| Ok(request.with_method(method))
}

/// Set header fields, replacing existing values for the same names
///
/// Fails with [`ConduitError::InvalidHeader`] if a name or value is not
/// valid in an HTTP header.
pub fn add_header<I, K, V>(
    fields: I,
) -> impl Fn(Request) -> ConduitResult<Request> + Clone + Send + Sync + 'static
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let fields: Vec<(String, String)> = fields
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect();

    move |request| {
        fields.iter().try_fold(request, |request, (name, value)| {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConduitError::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ConduitError::InvalidHeader(format!("{}: {}", name, e)))?;
            Ok(request.with_header(header, value))
        })
    }
}

/// Append query items, keeping any already present on the URI
///
/// Names and values are percent-encoded.
pub fn add_query<I, K, V>(
    params: I,
) -> impl Fn(Request) -> ConduitResult<Request> + Clone + Send + Sync + 'static
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let encoded: Vec<String> = params
        .into_iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(&name.into()),
                urlencoding::encode(&value.into())
            )
        })
        .collect();

    move |request| {
        if encoded.is_empty() {
            return Ok(request);
        }

        let uri = request.uri().clone();
        let path = match uri.path() {
            "" => "/",
            path => path,
        };
        let mut items: Vec<&str> = uri
            .query()
            .into_iter()
            .filter(|query| !query.is_empty())
            .collect();
        items.extend(encoded.iter().map(String::as_str));

        let path_and_query = PathAndQuery::try_from(format!("{}?{}", path, items.join("&")))
            .map_err(|e| ConduitError::InvalidResource(e.to_string()))?;

        let mut parts = uri.into_parts();
        parts.path_and_query = Some(path_and_query);
        let uri =
            Uri::from_parts(parts).map_err(|e| ConduitError::InvalidResource(e.to_string()))?;

        Ok(request.with_uri(uri))
    }
}

/// Attach a body
pub fn add_body(
    body: impl Into<Bytes>,
) -> impl Fn(Request) -> ConduitResult<Request> + Clone + Send + Sync + 'static {
    let body = body.into();
    move |request| Ok(request.with_body(body.clone()))
}
