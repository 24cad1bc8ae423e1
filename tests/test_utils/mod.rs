//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use axum::{Router, body::Body};
use futures::stream::{self, StreamExt};
use tokio::sync::Notify;

use chatbot::ai::chat::{GenerationBackend, IncrementStream, LengthPreference, OutboundRequest};
use chatbot::api::AppState;
use chatbot::api::app;
use chatbot::api::public::chat::ChatStreamEvent;
use chatbot::core::AppConfig;

/// Replies with the same increments every turn.
pub struct ScriptedBackend {
    pub increments: Vec<String>,
}

impl ScriptedBackend {
    pub fn new(increments: &[&str]) -> Self {
        Self {
            increments: increments.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(
        &self,
        _request: &OutboundRequest,
        _model: &str,
        _temperature: f64,
    ) -> Result<String, Error> {
        Ok(self.increments.concat())
    }

    async fn stream(
        &self,
        _request: &OutboundRequest,
        _model: &str,
        _temperature: f64,
    ) -> Result<IncrementStream, Error> {
        let items: Vec<Result<String, Error>> =
            self.increments.iter().cloned().map(Ok).collect();
        Ok(stream::iter(items).boxed())
    }
}

/// Sends one increment and then fails mid-stream.
pub struct FailingBackend;

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn generate(
        &self,
        _request: &OutboundRequest,
        _model: &str,
        _temperature: f64,
    ) -> Result<String, Error> {
        Err(anyhow!("Rate limit exceeded"))
    }

    async fn stream(
        &self,
        _request: &OutboundRequest,
        _model: &str,
        _temperature: f64,
    ) -> Result<IncrementStream, Error> {
        let items: Vec<Result<String, Error>> = vec![
            Ok("Partial".to_string()),
            Err(anyhow!("Connection reset")),
        ];
        Ok(stream::iter(items).boxed())
    }
}

/// Holds every reply until `release` is notified.
pub struct GatedBackend {
    pub release: Arc<Notify>,
}

#[async_trait]
impl GenerationBackend for GatedBackend {
    async fn generate(
        &self,
        _request: &OutboundRequest,
        _model: &str,
        _temperature: f64,
    ) -> Result<String, Error> {
        self.release.notified().await;
        Ok("Finally".to_string())
    }

    async fn stream(
        &self,
        _request: &OutboundRequest,
        _model: &str,
        _temperature: f64,
    ) -> Result<IncrementStream, Error> {
        self.release.notified().await;
        let items: Vec<Result<String, Error>> = vec![Ok("Finally".to_string())];
        Ok(stream::iter(items).boxed())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        openai_api_hostname: String::from("http://localhost:1"),
        openai_api_key: String::from("test-api-key"),
        models: vec![String::from("gpt-4.1"), String::from("gpt-4.1-mini")],
        default_model: String::from("gpt-4.1"),
        default_temperature: 0.7,
        default_length: LengthPreference::Normal,
        system_message: String::from("You are a helpful assistant."),
        web_ui_path: String::from("./web-ui/src"),
    }
}

/// Creates a test application router with the given backend.
pub fn test_app_with(backend: Arc<dyn GenerationBackend>) -> Router {
    let app_state = AppState::new(test_config(), backend);
    app(Arc::new(RwLock::new(app_state)))
}

/// Creates a test application router that always replies "Hello
/// World!" in three increments.
pub fn test_app() -> Router {
    test_app_with(Arc::new(ScriptedBackend::new(&["Hello", " World", "!"])))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not valid UTF-8")
}

/// Parses the data of each server-sent event in a chat response.
pub fn parse_events(body: &str) -> Vec<ChatStreamEvent> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("Invalid event data"))
        .collect()
}
