use std::time::Duration;

use anyhow::{Error, Result, bail};
use async_stream::try_stream;
use futures::stream::{BoxStream, Stream};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ai::chat::{ChatMessage, Role as ChatRole};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

impl From<ChatRole> for Role {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::System => Role::System,
            ChatRole::Assistant => Role::Assistant,
            ChatRole::User => Role::User,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

impl From<&ChatMessage> for Message {
    fn from(msg: &ChatMessage) -> Self {
        Message::new(msg.role().into(), msg.content())
    }
}

fn completions_url(api_hostname: &str) -> String {
    format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"))
}

/// Fails with the status and body of the response if the request
/// wasn't successful.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Completion request failed with status {}: {}", status, body);
    }
    Ok(response)
}

pub async fn completion(
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
    temperature: f64,
) -> Result<Value, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
    });
    let response = reqwest::Client::new()
        .post(completions_url(api_hostname))
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 10))
        .json(&payload)
        .send()
        .await?;

    let response = check_status(response).await?.json().await?;

    Ok(response)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    // Role only deltas, null content, reasoning, etc.
    Other {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    #[allow(dead_code)]
    #[serde(default)]
    index: usize,
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[allow(dead_code)]
    #[serde(default)]
    id: String,
    #[allow(dead_code)]
    #[serde(default)]
    model: String,
    choices: Vec<CompletionChunkChoice>,
}

/// Turns the raw bytes of a server-sent events response into content
/// increments. The stream ends at `[DONE]` or when a choice has a
/// finish reason.
fn content_increments<S, B>(bytes: S) -> impl Stream<Item = Result<String, Error>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    try_stream! {
        let mut bytes = Box::pin(bytes);
        // Bytes are only decoded once a whole event has arrived so a
        // multibyte character split across frames stays intact
        let mut buffer: Vec<u8> = Vec::new();

        'outer: while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;

            // Append new data to buffer. This is necessary to handle SSE
            // fragmentation over HTTP/2 frames.
            buffer.extend_from_slice(chunk.as_ref());

            // Process all complete SSE events from the buffer
            while let Some(event_end) = buffer.windows(2).position(|w| w == b"\n\n") {
                let event: Vec<u8> = buffer.drain(..event_end + 2).collect();
                let event_data = std::str::from_utf8(&event[..event_end])?;

                let event_data = event_data.trim();
                if !event_data.starts_with("data: ") {
                    continue;
                }

                // Extract the JSON payload (after "data: ")
                let data = event_data[6..].trim();

                // Data can sometimes be empty. Not sure why.
                if data.is_empty() {
                    continue;
                }

                if data == "[DONE]" {
                    break 'outer;
                }

                let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
                    tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
                })?;

                // Usage chunks don't have any choices
                let Some(choice) = chunk.choices.first() else {
                    continue;
                };

                if let Delta::Content { content } = &choice.delta {
                    if !content.is_empty() {
                        yield content.clone();
                    }
                }

                if choice.finish_reason.is_some() {
                    break 'outer;
                }
            }
        }
    }
}

/// Requests a streaming completion and returns the content deltas as
/// a stream of increments.
pub async fn completion_stream(
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
    temperature: f64,
) -> Result<BoxStream<'static, Result<String, Error>>, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "stream": true,
    });
    let response = reqwest::Client::new()
        .post(completions_url(api_hostname))
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 5))
        .json(&payload)
        .send()
        .await?;

    let bytes = check_status(response).await?.bytes_stream();

    Ok(content_increments(bytes).boxed())
}
