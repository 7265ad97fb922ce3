//! AI service integration for slide generation
//!
//! Provides the chat-completion interface used to turn lesson text into a
//! slide deck, an OpenAI-compatible implementation, and a scriptable mock.

pub mod mock;
pub mod openai;

pub use mock::MockChatClient;
pub use openai::OpenAiChatClient;

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Provider-neutral ordered message list sent to a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

/// How the chat client asks the model to shape its reply.
///
/// Either way, `ChatService::complete` returns text that should hold a JSON
/// array of slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Plain completion; the prompt alone asks for JSON.
    #[default]
    FreeText,
    /// Provider-enforced JSON schema (structured output).
    JsonSchema,
}

impl FromStr for ReplyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "free_text" => Ok(ReplyMode::FreeText),
            "json_schema" | "structured" => Ok(ReplyMode::JsonSchema),
            other => Err(Error::Config(format!(
                "Unknown reply mode '{}'. Expected 'text' or 'json_schema'",
                other
            ))),
        }
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send the conversation and return the first choice's text.
    async fn complete(&self, conversation: &Conversation) -> Result<String>;
}
