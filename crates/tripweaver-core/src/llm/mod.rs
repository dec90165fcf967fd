//! Chat-completion client seam.
//!
//! The generator only needs "send these messages, get text back", so the
//! trait stays that small. [`OpenAiClient`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint; tests substitute scripted clients.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openai::{OpenAiClient, OpenAiConfig};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Errors from a completion request. None of these are about the content.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode completion response: {0}")]
    Decode(String),

    #[error("completion response had no content")]
    Empty,
}

/// Something that turns a conversation into the assistant's next message.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the text content of the first choice.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;
}
