// Copyright (c) 2025 - Cowboy AI, Inc.

//! Adapters consuming the conduit core
//!
//! - [`HttpAdapter`] - chat history through the REST pipeline
//! - [`SocketAdapter`] - live chat over a [`DuplexTransport`]
//! - [`NatsTransport`] - duplex transport over NATS subjects
//! - `ReqwestTransport` - HTTP transport over `reqwest` (feature `http-client`)

pub mod http;
pub mod nats;
pub mod socket;

#[cfg(feature = "http-client")]
pub mod reqwest_transport;

pub use self::http::{HttpAdapter, CHAT_HISTORY_PATH};
pub use nats::NatsTransport;
pub use socket::{DuplexTransport, EventSink, SocketAdapter, SocketStatus, TransportEvent};

#[cfg(feature = "http-client")]
pub use reqwest_transport::ReqwestTransport;
