// Copyright (c) 2025 - Cowboy AI, Inc.
//! Chat Relay
//!
//! Fetches the chat history over REST, then joins the live room over NATS and
//! logs every inbound message until interrupted.
//!
//! Run with: cargo run --bin chat-relay --features http-client
//!
//! Configuration comes from the environment (see `cim_conduit::config`):
//! 1. `CONDUIT_REST_URL` - chat service base URL
//! 2. `CONDUIT_AUTH_TOKEN` - credential for REST and socket
//! 3. `NATS_URL` - NATS servers (default: nats://localhost:4222)

use anyhow::{Context, Result};
use cim_conduit::adapters::{HttpAdapter, NatsTransport, ReqwestTransport, SocketAdapter, SocketStatus};
use cim_conduit::{ConduitConfig, Scheduler};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting chat relay");

    let config = ConduitConfig::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded:");
    info!("  - REST URL: {}", config.rest.base_url);
    info!("  - NATS servers: {:?}", config.socket.servers);
    info!("  - Inbound subject: {}", config.socket.inbound_subject);
    info!("  - Identity: {}", config.socket.identity.username);

    let scheduler = Scheduler::spawn(Handle::current()).context("Failed to start main queue")?;

    // History
    let transport = ReqwestTransport::new(&config.rest, Handle::current())
        .context("Failed to create HTTP transport")?;
    let http = HttpAdapter::new(config.rest.clone(), Arc::new(transport), scheduler);

    match http.chat().resolve().await {
        Ok(history) => {
            info!("Fetched {} messages of history", history.len());
            for message in &history.messages {
                info!("  [{}] {}", message.user_id, message.message);
            }
        }
        Err(e) => warn!("Could not fetch chat history: {}", e),
    }

    // Live room
    let nats = NatsTransport::new(config.socket.clone(), Handle::current());
    let socket = SocketAdapter::new(config.socket.clone(), Arc::new(nats));

    let _status = socket.status().subscribe(|event| match event {
        Ok(SocketStatus::Connected) => info!("Joined the room"),
        Ok(SocketStatus::Disconnected(Some(reason))) => warn!("Left the room: {}", reason),
        Ok(SocketStatus::Disconnected(None)) => info!("Not connected"),
        Err(e) => error!("Status error: {}", e),
    });
    let _message = socket.message().subscribe(|event| {
        if let Ok(message) = event {
            info!("[{}] {}", message.user_id, message.message);
        }
    });
    let _batch = socket.messages().subscribe(|event| {
        if let Ok(batch) = event {
            info!("Received a batch of {} messages", batch.len());
        }
    });

    socket.connect().context("Failed to open chat socket")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    socket.disconnect();
    Ok(())
}
