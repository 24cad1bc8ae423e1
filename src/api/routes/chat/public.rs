//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::ai::chat::{ChatMessage, LengthPreference, SessionSummary};

/// One turn in a chat session. Settings that are left out use the
/// server's defaults.
#[derive(Deserialize, Serialize, Debug)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub length: Option<LengthPreference>,
    pub system_prompt: Option<String>,
}

/// The data of each server-sent event in a chat response stream.
/// Every stream ends with either `Done` or `Error`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    Delta { content: String },
    Done { content: String },
    Error { message: String },
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatTranscriptResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatSessionsResponse {
    pub sessions: Vec<SessionSummary>,
}
