// Copyright (c) 2025 - Cowboy AI, Inc.
//! Functional asynchrony for the Composable Information Machine
//!
//! This crate provides deferred computations, replaying signals and
//! composable REST request pipelines, plus the adapters that consume them:
//!
//! - [`fp`] - `Result` combinators, [`Deferred`], [`Signal`] and stage composition
//! - [`scheduler`] - explicit execution contexts and context hopping
//! - [`rest`] - request building, transport boundary, validation and JSON stages
//! - [`adapters`] - chat history over REST, live chat over a duplex transport
//! - [`config`] - adapter configuration loaded from code, serde or the environment

pub mod adapters;
pub mod codec;
pub mod config;
pub mod errors;
pub mod fp;
pub mod messages;
pub mod rest;
pub mod scheduler;

// Re-export commonly used types
pub use codec::{JsonCodec, MessageCodec};
pub use config::{ConduitConfig, RestConfig, SocketConfig};
pub use errors::{ConduitError, ConduitResult};
pub use fp::{chain, compose, CancelToken, Deferred, Pipeline, ResultExt, Signal, Subscription};
pub use messages::{ChatMessage, ChatMessages, User};
pub use scheduler::{Executor, Scheduler, SerialQueue};
