// Copyright (c) 2025 - Cowboy AI, Inc.
//! Chat domain messages
//!
//! Values exchanged with the chat service over REST and over the socket.
//! Each message has a builder whose `build` fails with
//! [`ConduitError::DomainObjectBuild`] when a required field was never set.

use crate::errors::{ConduitError, ConduitResult};
use serde::{Deserialize, Serialize};

/// A single chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message text
    pub message: String,
    /// Author
    pub user_id: i32,
}

impl ChatMessage {
    /// Start building a message
    pub fn builder() -> ChatMessageBuilder {
        ChatMessageBuilder::default()
    }
}

/// Builder for [`ChatMessage`]
#[derive(Debug, Clone, Default)]
pub struct ChatMessageBuilder {
    message: Option<String>,
    user_id: Option<i32>,
}

impl ChatMessageBuilder {
    /// Set the text
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the author
    pub fn user_id(mut self, user_id: i32) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Build the message
    pub fn build(self) -> ConduitResult<ChatMessage> {
        Ok(ChatMessage {
            message: self.message.ok_or_else(|| missing("ChatMessage", "message"))?,
            user_id: self.user_id.ok_or_else(|| missing("ChatMessage", "user_id"))?,
        })
    }
}

/// A batch of chat lines, e.g. the room history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessages {
    /// Messages, oldest first
    pub messages: Vec<ChatMessage>,
}

impl ChatMessages {
    /// Wrap a list of messages
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Identity announced on the socket after connecting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric user id
    pub user_id: i32,
    /// Display name
    pub username: String,
}

impl User {
    /// Start building a user
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }
}

/// Builder for [`User`]
#[derive(Debug, Clone, Default)]
pub struct UserBuilder {
    user_id: Option<i32>,
    username: Option<String>,
}

impl UserBuilder {
    /// Set the id
    pub fn user_id(mut self, user_id: i32) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set the display name
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Build the user
    pub fn build(self) -> ConduitResult<User> {
        Ok(User {
            user_id: self.user_id.ok_or_else(|| missing("User", "user_id"))?,
            username: self.username.ok_or_else(|| missing("User", "username"))?,
        })
    }
}

fn missing(object: &str, field: &str) -> ConduitError {
    ConduitError::DomainObjectBuild(format!("{} is missing '{}'", object, field))
}
