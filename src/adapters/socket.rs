// Copyright (c) 2025 - Cowboy AI, Inc.
//! Chat socket adapter
//!
//! Wraps a [`DuplexTransport`] behind three signals:
//!
//! ```text
//!                    ┌──> status   : Signal<SocketStatus>      (starts Disconnected)
//! DuplexTransport ───┼──> messages : Signal<Vec<ChatMessage>>  (inbound batches)
//!                    └──> message  : Signal<ChatMessage>       (inbound single lines)
//! ```
//!
//! On connect the configured credential is handed to the transport, and once
//! the transport reports `Connected` the configured identity is written as the
//! first frame. Inbound frames are decoded as a batch first, then as a single
//! message; frames matching neither are logged and dropped.

use crate::codec::{JsonCodec, MessageCodec};
use crate::config::SocketConfig;
use crate::errors::{ConduitError, ConduitResult};
use crate::fp::Signal;
use crate::messages::{ChatMessage, ChatMessages, User};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Connection state published by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketStatus {
    /// The transport is connected and the identity has been sent
    Connected,
    /// Not connected, with the reason when there was one
    Disconnected(Option<String>),
}

/// Lifecycle and data events reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel is open
    Connected,
    /// The channel closed, with the reason when there was one
    Disconnected(Option<String>),
    /// An inbound frame
    Data(Bytes),
}

/// Receiver of transport events
pub type EventSink = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// A bidirectional frame channel
///
/// `open` returns once the attempt has started; the outcome arrives through
/// the event sink. `close` tears the channel down without emitting events.
pub trait DuplexTransport: Send + Sync {
    /// Start connecting, presenting `credential` when given
    fn open(&self, credential: Option<String>, events: EventSink) -> ConduitResult<()>;

    /// Send one frame
    fn write(&self, frame: Bytes) -> ConduitResult<()>;

    /// Close the channel
    fn close(&self);
}

/// Chat adapter over a duplex transport
pub struct SocketAdapter<C = JsonCodec> {
    config: SocketConfig,
    transport: Arc<dyn DuplexTransport>,
    codec: Arc<C>,
    connected: Arc<AtomicBool>,
    status: Signal<SocketStatus>,
    messages: Signal<Vec<ChatMessage>>,
    message: Signal<ChatMessage>,
}

impl<C> std::fmt::Debug for SocketAdapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketAdapter")
            .field("name", &self.config.name)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SocketAdapter<JsonCodec> {
    /// Create an adapter exchanging JSON frames
    pub fn new(config: SocketConfig, transport: Arc<dyn DuplexTransport>) -> Self {
        Self::with_codec(config, transport, JsonCodec)
    }
}

impl<C> SocketAdapter<C>
where
    C: MessageCodec<User> + MessageCodec<ChatMessage> + MessageCodec<ChatMessages> + 'static,
{
    /// Create an adapter using `codec` for frames
    pub fn with_codec(config: SocketConfig, transport: Arc<dyn DuplexTransport>, codec: C) -> Self {
        Self {
            config,
            transport,
            codec: Arc::new(codec),
            connected: Arc::new(AtomicBool::new(false)),
            status: Signal::with_value(SocketStatus::Disconnected(None)),
            messages: Signal::new(),
            message: Signal::new(),
        }
    }

    /// Connection status
    pub fn status(&self) -> Signal<SocketStatus> {
        self.status.clone()
    }

    /// Inbound message batches
    pub fn messages(&self) -> Signal<Vec<ChatMessage>> {
        self.messages.clone()
    }

    /// Inbound single messages
    pub fn message(&self) -> Signal<ChatMessage> {
        self.message.clone()
    }

    /// Whether the transport last reported `Connected`
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open the transport
    pub fn connect(&self) -> ConduitResult<()> {
        info!(name = %self.config.name, "Connecting chat socket");
        let sink = self.event_sink();
        self.transport.open(self.config.auth_token.clone(), sink)
    }

    /// Close the transport
    pub fn disconnect(&self) {
        self.transport.close();
        if self.connected.swap(false, Ordering::SeqCst) {
            info!(name = %self.config.name, "Chat socket disconnected");
            self.status.publish_value(SocketStatus::Disconnected(None));
        }
    }

    /// Send a chat line as `user_id`
    pub fn send(&self, message: &str, user_id: i32) -> ConduitResult<()> {
        if !self.is_connected() {
            return Err(ConduitError::SocketNotConnected);
        }

        let chat = ChatMessage::builder()
            .message(message)
            .user_id(user_id)
            .build()?;
        let frame = MessageCodec::<ChatMessage>::encode(self.codec.as_ref(), &chat)
            .map_err(|e| ConduitError::DomainObjectBuild(e.to_string()))?;

        debug!(user_id, bytes = frame.len(), "Sending chat message");
        self.transport.write(frame)
    }

    fn event_sink(&self) -> EventSink {
        let handler = EventHandler {
            identity: self.config.identity.clone(),
            transport: Arc::downgrade(&self.transport),
            codec: Arc::clone(&self.codec),
            connected: Arc::clone(&self.connected),
            status: self.status.clone(),
            messages: self.messages.clone(),
            message: self.message.clone(),
        };
        Arc::new(move |event| handler.handle(event))
    }
}

struct EventHandler<C> {
    identity: User,
    transport: Weak<dyn DuplexTransport>,
    codec: Arc<C>,
    connected: Arc<AtomicBool>,
    status: Signal<SocketStatus>,
    messages: Signal<Vec<ChatMessage>>,
    message: Signal<ChatMessage>,
}

impl<C> EventHandler<C>
where
    C: MessageCodec<User> + MessageCodec<ChatMessage> + MessageCodec<ChatMessages>,
{
    fn handle(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                info!(username = %self.identity.username, "Chat socket connected");
                self.connected.store(true, Ordering::SeqCst);
                self.status.publish_value(SocketStatus::Connected);
                self.announce();
            }
            TransportEvent::Disconnected(reason) => {
                warn!(reason = ?reason, "Chat socket disconnected");
                self.connected.store(false, Ordering::SeqCst);
                self.status.publish_value(SocketStatus::Disconnected(reason));
            }
            TransportEvent::Data(frame) => self.receive(&frame),
        }
    }

    fn announce(&self) {
        let Some(transport) = self.transport.upgrade() else {
            return;
        };
        let sent = MessageCodec::<User>::encode(self.codec.as_ref(), &self.identity)
            .and_then(|frame| transport.write(frame));
        if let Err(e) = sent {
            warn!(error = %e, "Failed to send identity");
        }
    }

    fn receive(&self, frame: &[u8]) {
        let batch = MessageCodec::<ChatMessages>::decode(self.codec.as_ref(), frame);
        if let Ok(batch) = batch {
            debug!(count = batch.len(), "Received message batch");
            self.messages.publish_value(batch.messages);
            return;
        }

        match MessageCodec::<ChatMessage>::decode(self.codec.as_ref(), frame) {
            Ok(message) => {
                debug!(user_id = message.user_id, "Received message");
                self.message.publish_value(message);
            }
            Err(e) => debug!(error = %e, bytes = frame.len(), "Dropping unrecognized frame"),
        }
    }
}
