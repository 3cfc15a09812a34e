//! Session-level chat message model

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a chat session.
///
/// Assistant messages start in the streaming state and grow until the
/// stream ends; after that the content is frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: i64,
    pub is_streaming: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content.into(), false)
    }

    /// Empty assistant message created when the first streamed byte arrives.
    pub fn streaming_assistant() -> Self {
        Self::new(ChatRole::Assistant, String::new(), true)
    }

    fn new(role: ChatRole, content: String, is_streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now().timestamp_millis(),
            is_streaming,
        }
    }

    /// Replace the content with the latest accumulated answer. Returns false
    /// (and leaves the message untouched) once streaming has ended.
    pub fn set_answer(&mut self, answer: &str) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.content = answer.to_string();
        true
    }

    /// Terminal transition; afterwards the content can no longer change.
    pub fn finish_streaming(&mut self) {
        self.is_streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_message_accepts_updates_until_finished() {
        let mut message = ChatMessage::streaming_assistant();
        assert!(message.set_answer("Hel"));
        assert!(message.set_answer("Hello"));
        assert_eq!(message.content, "Hello");

        message.finish_streaming();
        assert!(!message.set_answer("Hello again"));
        assert_eq!(message.content, "Hello");
    }

    #[test]
    fn user_messages_are_never_streaming() {
        let message = ChatMessage::user("hi");
        assert_eq!(message.role, ChatRole::User);
        assert!(!message.is_streaming);
    }
}
