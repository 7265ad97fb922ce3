use super::{ChatService, Conversation, Role};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Unavailable(String),
    Failed(String),
}

/// Scriptable [`ChatService`]. Clones share state, so a clone kept by a test
/// can observe calls made through a boxed copy.
#[derive(Clone)]
pub struct MockChatClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    conversations: Arc<Mutex<Vec<Conversation>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            conversations: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    pub fn with_prompt_response(self, response: impl Into<String>) -> Self {
        self.push(MockReply::Text(response.into()))
    }

    pub fn with_unavailable(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Unavailable(message.into()))
    }

    pub fn with_model_error(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Failed(message.into()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_conversation(&self) -> Option<Conversation> {
        self.conversations.lock().unwrap().last().cloned()
    }

    fn default_reply(conversation: &Conversation) -> String {
        let text = conversation
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        serde_json::json!([{
            "title": "Lesson",
            "desc": text,
            "promptImage": "An illustration of the lesson"
        }])
        .to_string()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn complete(&self, conversation: &Conversation) -> Result<String> {
        let reply = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            self.conversations
                .lock()
                .unwrap()
                .push(conversation.clone());

            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies[(*count - 1) % replies.len()].clone())
            }
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            None => Ok(Self::default_reply(conversation)),
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Unavailable(message)) => Err(Error::ModelUnavailable(message)),
            Some(MockReply::Failed(message)) => Err(Error::ModelError(message)),
        }
    }
}
