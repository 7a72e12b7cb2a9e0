// Copyright (c) 2025 - Cowboy AI, Inc.
//! HTTP transport backed by `reqwest`

use crate::config::RestConfig;
use crate::errors::{ConduitError, ConduitResult};
use crate::rest::{
    HttpTransport, Request, ResponseMeta, TransportCompletion, TransportError,
    TransportErrorKind, TransportResult,
};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::Client;
use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Performs requests with a shared `reqwest` client on a tokio runtime
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    handle: Handle,
}

impl ReqwestTransport {
    /// Build a client honoring the configured timeout
    pub fn new(config: &RestConfig, handle: Handle) -> ConduitResult<Self> {
        info!("Creating HTTP transport for {}", config.base_url);

        let client = Client::builder()
            .timeout(config.timeout())
            .dns_resolver(Arc::new(SystemResolver))
            .build()
            .map_err(|e| {
                ConduitError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, handle })
    }
}

impl HttpTransport for ReqwestTransport {
    fn perform(&self, request: Request, completion: TransportCompletion) {
        let client = self.client.clone();
        self.handle.spawn(async move {
            completion(execute(client, request).await);
        });
    }
}

async fn execute(client: Client, request: Request) -> TransportResult {
    let mut builder = client
        .request(request.method().as_http(), request.uri().to_string())
        .headers(request.headers().clone());
    if let Some(body) = request.body() {
        builder = builder.body(body.clone());
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Request to {} failed: {}", request.uri(), e);
            return TransportResult {
                error: Some(classify(&e)),
                ..TransportResult::default()
            };
        }
    };

    let meta = ResponseMeta {
        status: response.status().as_u16(),
        headers: response.headers().clone(),
    };
    debug!("Response {} from {}", meta.status, request.uri());

    match response.bytes().await {
        Ok(payload) => TransportResult {
            payload: Some(payload),
            response: Some(meta),
            error: None,
        },
        Err(e) => TransportResult {
            payload: None,
            response: Some(meta),
            error: Some(classify(&e)),
        },
    }
}

/// Host name lookup failure, kept recognizable inside reqwest's error chain
#[derive(Debug, thiserror::Error)]
#[error("cannot resolve host '{host}'")]
struct UnresolvedHost {
    host: String,
    #[source]
    source: io::Error,
}

/// Resolves through the operating system, tagging failures as [`UnresolvedHost`]
#[derive(Debug, Clone, Copy, Default)]
struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let lookup = tokio::net::lookup_host((host.clone(), 0))
                .await
                .map(|addrs| addrs.collect::<Vec<SocketAddr>>());
            match lookup {
                Ok(addrs) => Ok(Box::new(addrs.into_iter()) as Addrs),
                Err(source) => {
                    let error: Box<dyn StdError + Send + Sync> =
                        Box::new(UnresolvedHost { host, source });
                    Err(error)
                }
            }
        })
    }
}

fn classify(error: &reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        TransportErrorKind::TimedOut
    } else if find_cause::<UnresolvedHost>(error).is_some() {
        TransportErrorKind::HostNotFound
    } else if find_cause::<io::Error>(error).is_some_and(|cause| is_offline(cause.kind())) {
        TransportErrorKind::NotConnected
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, error.to_string())
}

/// No route to any network; refused or reset connections are not offline
fn is_offline(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::NetworkUnreachable | io::ErrorKind::NetworkDown
    )
}

fn find_cause<C: StdError + 'static>(error: &reqwest::Error) -> Option<&C> {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(found) = cause.downcast_ref::<C>() {
            return Some(found);
        }
        source = cause.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::create_request;

    #[tokio::test]
    async fn test_refused_connection_is_other_failure() {
        let config = RestConfig {
            timeout_secs: 2,
            ..RestConfig::default()
        };
        let transport = ReqwestTransport::new(&config, Handle::current()).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        // Port 9 (discard) on localhost is closed on test machines
        let request = create_request("http://127.0.0.1:9/").unwrap();
        transport.perform(request, Box::new(move |result| drop(tx.send(result))));

        let result = rx.await.unwrap();
        assert!(result.response.is_none());
        let error = result.error.unwrap();
        assert_eq!(error.kind, TransportErrorKind::Other);
    }

    #[tokio::test]
    async fn test_unknown_host_is_host_not_found() {
        let config = RestConfig {
            timeout_secs: 10,
            ..RestConfig::default()
        };
        let transport = ReqwestTransport::new(&config, Handle::current()).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        // The .invalid top-level domain never resolves
        let request = create_request("http://chat.conduit.invalid/").unwrap();
        transport.perform(request, Box::new(move |result| drop(tx.send(result))));

        let error = rx.await.unwrap().error.unwrap();
        assert_eq!(error.kind, TransportErrorKind::HostNotFound);
    }

    #[test]
    fn test_refused_connection_is_not_offline() {
        assert!(!is_offline(io::ErrorKind::ConnectionRefused));
        assert!(!is_offline(io::ErrorKind::ConnectionReset));
        assert!(is_offline(io::ErrorKind::NetworkUnreachable));
    }
}
