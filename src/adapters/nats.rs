// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS-backed duplex transport
//!
//! Inbound frames arrive on `inbound_subject`, outbound frames are published
//! on `outbound_subject`. The connection and subscription run in a reader
//! task on the given runtime; closing aborts the task.

use super::socket::{DuplexTransport, EventSink, TransportEvent};
use crate::config::SocketConfig;
use crate::errors::{ConduitError, ConduitResult};
use async_nats::{Client, ConnectOptions};
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct Connection {
    client: Option<Client>,
    reader: Option<JoinHandle<()>>,
}

/// Duplex transport over a NATS connection
pub struct NatsTransport {
    config: SocketConfig,
    handle: Handle,
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for NatsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsTransport")
            .field("servers", &self.config.servers)
            .field("inbound_subject", &self.config.inbound_subject)
            .field("outbound_subject", &self.config.outbound_subject)
            .finish()
    }
}

impl NatsTransport {
    /// Create a transport running its reader task on `handle`
    pub fn new(config: SocketConfig, handle: Handle) -> Self {
        Self {
            config,
            handle,
            connection: Arc::new(Mutex::new(Connection::default())),
        }
    }

    /// Whether a client is currently connected
    pub fn is_open(&self) -> bool {
        self.connection.lock().client.is_some()
    }
}

async fn read_frames(
    config: SocketConfig,
    credential: Option<String>,
    connection: Arc<Mutex<Connection>>,
    events: EventSink,
) {
    let mut options = ConnectOptions::new()
        .name(&config.name)
        .connection_timeout(config.connect_timeout());
    if let Some(token) = credential {
        options = options.token(token);
    }

    let client = match async_nats::connect_with_options(config.servers.join(","), options).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to NATS at {:?}: {}", config.servers, e);
            events(TransportEvent::Disconnected(Some(
                ConduitError::from(e).to_string(),
            )));
            return;
        }
    };

    let mut subscriber = match client.subscribe(config.inbound_subject.clone()).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            error!("Failed to subscribe to {}: {}", config.inbound_subject, e);
            events(TransportEvent::Disconnected(Some(e.to_string())));
            return;
        }
    };

    info!("Connected to NATS at {:?}", config.servers);
    connection.lock().client = Some(client);
    events(TransportEvent::Connected);

    while let Some(message) = subscriber.next().await {
        debug!("Received frame on {}", message.subject);
        events(TransportEvent::Data(message.payload));
    }

    connection.lock().client = None;
    warn!("Subscription to {} ended", config.inbound_subject);
    events(TransportEvent::Disconnected(Some("subscription closed".to_string())));
}

impl DuplexTransport for NatsTransport {
    fn open(&self, credential: Option<String>, events: EventSink) -> ConduitResult<()> {
        let mut connection = self.connection.lock();
        if let Some(previous) = connection.reader.take() {
            previous.abort();
            connection.client = None;
        }

        connection.reader = Some(self.handle.spawn(read_frames(
            self.config.clone(),
            credential,
            Arc::clone(&self.connection),
            events,
        )));
        Ok(())
    }

    fn write(&self, frame: Bytes) -> ConduitResult<()> {
        let client = self
            .connection
            .lock()
            .client
            .clone()
            .ok_or(ConduitError::SocketNotConnected)?;
        let subject = self.config.outbound_subject.clone();

        self.handle.spawn(async move {
            match client.publish(subject.clone(), frame).await {
                Ok(()) => debug!("Published frame to subject: {}", subject),
                Err(e) => warn!("Failed to publish frame to {}: {}", subject, e),
            }
        });
        Ok(())
    }

    fn close(&self) {
        let mut connection = self.connection.lock();
        connection.client = None;
        if let Some(reader) = connection.reader.take() {
            reader.abort();
            info!("Closed NATS transport");
        }
    }
}

impl Drop for NatsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_before_open_fails() {
        let transport = NatsTransport::new(SocketConfig::default(), Handle::current());
        assert_eq!(
            transport.write(Bytes::from_static(b"frame")),
            Err(ConduitError::SocketNotConnected)
        );
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_close_without_open() {
        let transport = NatsTransport::new(SocketConfig::default(), Handle::current());
        transport.close();
        assert!(!transport.is_open());
    }

    #[tokio::test]
    #[ignore] // Requires a running NATS server
    async fn test_connect_reports_connected() {
        let transport = NatsTransport::new(SocketConfig::default(), Handle::current());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        transport
            .open(None, Arc::new(move |event| drop(tx.send(event))))
            .unwrap();

        let first = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(TransportEvent::Connected));
        assert!(transport.is_open());
    }
}
