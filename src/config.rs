// Copyright (c) 2025 - Cowboy AI, Inc.
//! Adapter configuration
//!
//! Configuration is passed explicitly into adapter constructors. It can be
//! built in code, deserialized, or loaded from the environment:
//!
//! | Variable                        | Field                            |
//! |---------------------------------|----------------------------------|
//! | `CONDUIT_REST_URL`              | `rest.base_url`                  |
//! | `CONDUIT_AUTH_TOKEN`            | `rest.auth_token`, `socket.auth_token` |
//! | `CONDUIT_REST_TIMEOUT_SECS`     | `rest.timeout_secs`              |
//! | `NATS_URL` (comma separated)    | `socket.servers`                 |
//! | `CONDUIT_CLIENT_NAME`           | `socket.name`                    |
//! | `CONDUIT_INBOUND_SUBJECT`       | `socket.inbound_subject`         |
//! | `CONDUIT_OUTBOUND_SUBJECT`      | `socket.outbound_subject`        |
//! | `CONDUIT_CONNECT_TIMEOUT_SECS`  | `socket.connect_timeout_secs`    |
//! | `CONDUIT_USER_ID`               | `socket.identity.user_id`        |
//! | `CONDUIT_USERNAME`              | `socket.identity.username`       |

use crate::errors::{ConduitError, ConduitResult};
use crate::messages::User;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for every adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConduitConfig {
    /// REST settings
    #[serde(default)]
    pub rest: RestConfig,
    /// Socket settings
    #[serde(default)]
    pub socket: SocketConfig,
}

/// Configuration for the REST adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL of the chat service (e.g., "https://chat.example.com:8089")
    pub base_url: String,

    /// Value sent in the `Authorization` header
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_rest_timeout")]
    pub timeout_secs: u64,
}

fn default_rest_timeout() -> u64 {
    30
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8089".to_string(),
            auth_token: None,
            timeout_secs: default_rest_timeout(),
        }
    }
}

impl RestConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the socket adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// NATS server URLs
    pub servers: Vec<String>,

    /// Client name
    pub name: String,

    /// Subject carrying messages to this client
    pub inbound_subject: String,

    /// Subject this client publishes on
    pub outbound_subject: String,

    /// Credential attached when connecting
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Identity announced after connecting
    pub identity: User,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "cim-conduit".to_string(),
            inbound_subject: "chat.room.inbound".to_string(),
            outbound_subject: "chat.room.outbound".to_string(),
            auth_token: None,
            identity: User {
                user_id: 0,
                username: "anonymous".to_string(),
            },
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl SocketConfig {
    /// Connection timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl ConduitConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> ConduitResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ConduitResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let auth_token = lookup("CONDUIT_AUTH_TOKEN");

        if let Some(base_url) = lookup("CONDUIT_REST_URL") {
            config.rest.base_url = base_url.trim_end_matches('/').to_string();
        }
        config.rest.auth_token = auth_token.clone();
        if let Some(timeout) = parsed(&lookup, "CONDUIT_REST_TIMEOUT_SECS")? {
            config.rest.timeout_secs = timeout;
        }

        if let Some(servers) = lookup("NATS_URL") {
            config.socket.servers = servers
                .split(',')
                .map(str::trim)
                .filter(|server| !server.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(name) = lookup("CONDUIT_CLIENT_NAME") {
            config.socket.name = name;
        }
        if let Some(subject) = lookup("CONDUIT_INBOUND_SUBJECT") {
            config.socket.inbound_subject = subject;
        }
        if let Some(subject) = lookup("CONDUIT_OUTBOUND_SUBJECT") {
            config.socket.outbound_subject = subject;
        }
        config.socket.auth_token = auth_token;
        if let Some(timeout) = parsed(&lookup, "CONDUIT_CONNECT_TIMEOUT_SECS")? {
            config.socket.connect_timeout_secs = timeout;
        }
        if let Some(user_id) = parsed(&lookup, "CONDUIT_USER_ID")? {
            config.socket.identity.user_id = user_id;
        }
        if let Some(username) = lookup("CONDUIT_USERNAME") {
            config.socket.identity.username = username;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used
    pub fn validate(&self) -> ConduitResult<()> {
        if self.rest.base_url.is_empty() {
            return Err(ConduitError::Configuration("REST base URL is empty".to_string()));
        }
        if self.socket.servers.is_empty() {
            return Err(ConduitError::Configuration("No NATS servers configured".to_string()));
        }
        if self.socket.inbound_subject.is_empty() || self.socket.outbound_subject.is_empty() {
            return Err(ConduitError::Configuration("Socket subjects must be set".to_string()));
        }
        Ok(())
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> ConduitResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ConduitError::Configuration(format!("{}: {}", key, e)))
        })
        .transpose()
}
