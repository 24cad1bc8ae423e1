use anyhow::{Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;

use super::compose::{GenerationConfig, OutboundRequest};
use super::models::SessionStore;

/// A lazy sequence of text increments from the model. Each item is
/// one chunk of the reply in the order it arrived.
pub type IncrementStream = BoxStream<'static, Result<String, Error>>;

/// The model that generates replies, usually an OpenAI compatible
/// API.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate the whole reply in one response.
    async fn generate(
        &self,
        request: &OutboundRequest,
        model: &str,
        temperature: f64,
    ) -> Result<String, Error>;

    /// Generate the reply as a stream of increments.
    async fn stream(
        &self,
        request: &OutboundRequest,
        model: &str,
        temperature: f64,
    ) -> Result<IncrementStream, Error>;
}

/// Whether the reply should be streamed back as it's generated or
/// returned all at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Streaming,
    Whole,
}

/// Composes the request for `user_text` and gets the next reply from
/// the backend. Each increment is passed to `on_increment` in arrival
/// order and the concatenation of all increments is returned.
///
/// Does not touch any session history, see `next_turn`.
pub async fn next_reply<B, F>(
    backend: &B,
    config: &GenerationConfig,
    user_text: &str,
    delivery: Delivery,
    mut on_increment: F,
) -> Result<String, Error>
where
    B: GenerationBackend + ?Sized,
    F: FnMut(&str) + Send,
{
    let request = config.request(user_text);

    tracing::debug!(
        "Requesting reply from {} (temperature {}, length {})",
        config.model,
        config.temperature,
        config.length
    );

    match delivery {
        Delivery::Whole => {
            let reply = backend
                .generate(&request, &config.model, config.temperature)
                .await?;
            on_increment(&reply);
            Ok(reply)
        }
        Delivery::Streaming => {
            let mut stream = backend
                .stream(&request, &config.model, config.temperature)
                .await?;
            let mut reply = String::new();
            while let Some(increment) = stream.next().await {
                let increment = increment?;
                on_increment(&increment);
                reply.push_str(&increment);
            }
            Ok(reply)
        }
    }
}

/// Runs a full turn against `history`. The user message and the reply
/// are only appended once the reply has been fully received, if the
/// backend fails the history is left as it was.
pub async fn next_turn<B, F>(
    history: &mut SessionStore,
    backend: &B,
    config: &GenerationConfig,
    user_text: &str,
    delivery: Delivery,
    on_increment: F,
) -> Result<String, Error>
where
    B: GenerationBackend + ?Sized,
    F: FnMut(&str) + Send,
{
    let reply = next_reply(backend, config, user_text, delivery, on_increment).await?;
    history.record_turn(user_text, &reply);
    Ok(reply)
}
