use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, JsonSchema, ResponseFormat};
use crate::ai::{ChatService, Conversation, ReplyMode};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const MAX_COMPLETION_TOKENS: u32 = 16_384;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
    reply_mode: ReplyMode,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, DEFAULT_TIMEOUT, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, timeout, client),
            model,
            reply_mode: ReplyMode::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_reply_mode(mut self, reply_mode: ReplyMode) -> Self {
        self.reply_mode = reply_mode;
        self
    }

    fn response_format(&self) -> Option<ResponseFormat> {
        match self.reply_mode {
            ReplyMode::FreeText => None,
            ReplyMode::JsonSchema => Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchema {
                    name: "slide_deck".to_string(),
                    schema: slide_deck_schema(),
                    strict: true,
                },
            }),
        }
    }
}

/// Structured outputs need an object at the root, so the array is wrapped
/// in `{"slides": [...]}`.
fn slide_deck_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "slides": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "desc": { "type": "string" },
                        "promptImage": { "type": "string" }
                    },
                    "required": ["title", "desc", "promptImage"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["slides"],
        "additionalProperties": false
    })
}

/// Pull the slide array out of a structured reply. Anything unexpected is
/// returned untouched for the normalizer to judge.
fn unwrap_slides(text: String) -> String {
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(mut map)) => match map.remove("slides") {
            Some(slides @ Value::Array(_)) => slides.to_string(),
            _ => text,
        },
        _ => text,
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn complete(&self, conversation: &Conversation) -> Result<String> {
        let messages = conversation
            .messages
            .iter()
            .map(|message| ChatMessage {
                role: message.role.as_str().to_string(),
                content: Some(message.content.clone()),
                refusal: None,
            })
            .collect();

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            response_format: self.response_format(),
        };

        tracing::debug!(
            "Sending chat completion request (model: {}, mode: {:?})",
            self.model,
            self.reply_mode
        );
        let response = self.http.chat_completion(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelError("No choices in chat response".to_string()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("Model reply was cut off at the token limit");
        }

        let text = match (choice.message.content, choice.message.refusal) {
            (Some(text), _) if !text.trim().is_empty() => text,
            (_, Some(refusal)) => {
                return Err(Error::ModelError(format!("Model refused: {}", refusal)));
            }
            _ => {
                return Err(Error::ModelError(
                    "No text content in chat response".to_string(),
                ));
            }
        };

        Ok(match self.reply_mode {
            ReplyMode::FreeText => text,
            ReplyMode::JsonSchema => unwrap_slides(text),
        })
    }
}
