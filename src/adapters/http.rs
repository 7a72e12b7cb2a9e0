// Copyright (c) 2025 - Cowboy AI, Inc.
//! Chat history over REST
//!
//! ```text
//! GET {base_url}/chat/all
//!   ─> Authorization header
//!   ─> perform ─> validate ─> payload ─> ChatMessages
//!   ─> delivered on the scheduler's main context
//! ```

use crate::config::RestConfig;
use crate::errors::ConduitError;
use crate::fp::{Deferred, Pipeline};
use crate::messages::ChatMessages;
use crate::rest::{
    add_header, add_json_headers, extract_payload, parse_json_as, perform_request, request_for,
    validate_response, HttpTransport,
};
use crate::scheduler::Scheduler;
use std::sync::Arc;
use tracing::debug;

/// Path of the chat history resource
pub const CHAT_HISTORY_PATH: &str = "/chat/all";

/// REST adapter for the chat service
#[derive(Clone)]
pub struct HttpAdapter {
    config: RestConfig,
    transport: Arc<dyn HttpTransport>,
    scheduler: Scheduler,
}

impl std::fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAdapter")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpAdapter {
    /// Create an adapter performing requests through `transport`
    pub fn new(config: RestConfig, transport: Arc<dyn HttpTransport>, scheduler: Scheduler) -> Self {
        Self {
            config,
            transport,
            scheduler,
        }
    }

    /// Pipeline fetching the chat history
    pub fn chat_pipeline(&self) -> Pipeline<(), ChatMessages> {
        let target = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            CHAT_HISTORY_PATH
        );
        let auth: Vec<(String, String)> = self
            .config
            .auth_token
            .iter()
            .map(|token| ("Authorization".to_string(), token.clone()))
            .collect();

        debug!(target = %target, "Building chat history pipeline");

        Pipeline::start(request_for(target))
            .then(add_header(auth))
            .then(add_json_headers)
            .then(perform_request(Arc::clone(&self.transport)))
            .then(validate_response)
            .then(extract_payload)
            .then(parse_json_as::<ChatMessages>)
    }

    /// Fetch the chat history; the outcome is delivered on the main context
    pub fn chat(&self) -> Deferred<ChatMessages, ConduitError> {
        let history = self.chat_pipeline().call(());
        self.scheduler.run_future_result_on_main_queue(history)
    }
}
