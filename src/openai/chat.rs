use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;

use crate::ai::chat::{GenerationBackend, IncrementStream, OutboundRequest};
use crate::core::AppConfig;
use crate::openai::{Message, completion, completion_stream};

/// Generates replies using an OpenAI compatible chat completions API.
#[derive(Clone, Debug)]
pub struct OpenAiBackend {
    api_hostname: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_hostname: &str, api_key: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.openai_api_hostname, &config.openai_api_key)
    }
}

fn to_messages(request: &OutboundRequest) -> Vec<Message> {
    request.messages().iter().map(Message::from).collect()
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(
        &self,
        request: &OutboundRequest,
        model: &str,
        temperature: f64,
    ) -> Result<String, Error> {
        let messages = to_messages(request);
        let resp = completion(
            &messages,
            &self.api_hostname,
            &self.api_key,
            model,
            temperature,
        )
        .await?;

        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow!("No message received. Resp:\n\n {}", resp))
    }

    async fn stream(
        &self,
        request: &OutboundRequest,
        model: &str,
        temperature: f64,
    ) -> Result<IncrementStream, Error> {
        let messages = to_messages(request);
        completion_stream(
            &messages,
            &self.api_hostname,
            &self.api_key,
            model,
            temperature,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::chat::{Delivery, GenerationConfig, LengthPreference, SessionStore, next_turn};
    use serde_json::json;

    fn config() -> GenerationConfig {
        GenerationConfig::new(
            "gpt-4.1-mini",
            0.2,
            LengthPreference::Brief,
            "You are helpful.",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_composed_request() {
        let mut server = mockito::Server::new_async().await;
        let request = config().request("Hello");

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4.1-mini",
                "temperature": 0.2,
                "messages": [
                    {"role": "system", "content": request.system_text()},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}]}"#)
            .create();

        let backend = OpenAiBackend::new(&server.url(), "test-key");
        let reply = backend
            .generate(&request, "gpt-4.1-mini", 0.2)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(reply, "Hi!");
    }

    #[tokio::test]
    async fn test_generate_missing_content() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create();

        let backend = OpenAiBackend::new(&server.url(), "test-key");
        let result = backend
            .generate(&config().request("Hello"), "gpt-4.1-mini", 0.2)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_streaming_turn_against_api() {
        let mut server = mockito::Server::new_async().await;

        let sse_response = concat!(
            "data: {\"id\":\"c1\",\"model\":\"gpt-4.1-mini\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c2\",\"model\":\"gpt-4.1-mini\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_response)
            .create();

        let backend = OpenAiBackend::new(&server.url(), "test-key");
        let mut history = SessionStore::new();
        let mut shown = String::new();

        let reply = next_turn(
            &mut history,
            &backend,
            &config(),
            "Hello",
            Delivery::Streaming,
            |inc| shown.push_str(inc),
        )
        .await
        .unwrap();

        assert_eq!(reply, "Hi there");
        assert_eq!(shown, "Hi there");
        assert_eq!(history.len(), 2);
        assert_eq!(history.all()[1].content(), "Hi there");
    }

    #[tokio::test]
    async fn test_failed_turn_against_api() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"You exceeded your current quota"}}"#)
            .create();

        let backend = OpenAiBackend::new(&server.url(), "test-key");
        let mut history = SessionStore::new();

        let result = next_turn(
            &mut history,
            &backend,
            &config(),
            "Hello",
            Delivery::Streaming,
            |_| {},
        )
        .await;

        assert!(result.unwrap_err().to_string().contains("quota"));
        assert!(history.is_empty());
    }
}
