//! The core models for keeping track of a chat session's history.
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        write!(f, "{}", s)
    }
}

/// A single message in a conversation. Messages are never edited
/// after they are created so the fields are only exposed through
/// accessors.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered conversation history for one session. Only ever appended
/// to or cleared all at once.
#[derive(Default, Debug, Clone)]
pub struct SessionStore(Vec<ChatMessage>);

impl SessionStore {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(&mut self, role: Role, content: &str) {
        self.0.push(ChatMessage::new(role, content))
    }

    /// Records a completed exchange. Both messages are appended
    /// together so a failed turn never leaves a user message without
    /// its reply.
    pub fn record_turn(&mut self, user_text: &str, reply: &str) {
        self.0.reserve(2);
        self.append(Role::User, user_text);
        self.append(Role::Assistant, reply);
    }

    pub fn reset(&mut self) {
        self.0.clear()
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.0.iter()
    }
}
