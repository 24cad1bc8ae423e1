//! Router for the chat API

use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response, sse::Event, sse::KeepAlive, sse::Sse},
    routing::{get, post},
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public::{self, ChatStreamEvent};
use crate::ai::chat::{Delivery, GenerationConfig, next_reply};
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Get the history of a single chat session
async fn chat_session(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let shared_state = state.read().expect("Unable to read shared state");

    let Some(session) = shared_state.sessions.get(&id) else {
        return (
            StatusCode::NOT_FOUND,
            format!("Chat session {} not found", id),
        )
            .into_response();
    };

    axum::Json(public::ChatTranscriptResponse {
        session_id: id.clone(),
        messages: session.messages().to_vec(),
    })
    .into_response()
}

/// Clear the history of a chat session
async fn reset_session(State(state): State<SharedState>, Path(id): Path<String>) -> StatusCode {
    let existed = state
        .write()
        .expect("Unable to write shared state")
        .sessions
        .reset(&id);
    tracing::debug!("Reset chat session {} (existed: {})", id, existed);

    StatusCode::NO_CONTENT
}

/// Get a list of all chat sessions
async fn chat_list(State(state): State<SharedState>) -> axum::Json<public::ChatSessionsResponse> {
    let sessions = state
        .read()
        .expect("Unable to read shared state")
        .sessions
        .summaries();

    axum::Json(public::ChatSessionsResponse { sessions })
}

/// Add a turn to a chat session and stream the response
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let public::ChatRequest {
        session_id,
        message,
        model,
        temperature,
        length,
        system_prompt,
    } = payload;

    let (config, backend, ticket) = {
        let mut shared_state = state.write().expect("Unable to write shared state");
        let defaults = &shared_state.config;
        let config = GenerationConfig::new(
            model.as_deref().unwrap_or(&defaults.default_model),
            temperature.unwrap_or(defaults.default_temperature),
            length.unwrap_or_else(|| defaults.default_length.clone()),
            system_prompt.as_deref().unwrap_or(&defaults.system_message),
        )?;
        config.validate_model(&defaults.models)?;

        let backend = Arc::clone(&shared_state.backend);
        let ticket = shared_state
            .sessions
            .get_or_create(&session_id)
            .begin_turn()?;
        (config, backend, ticket)
    };

    let (tx, rx) = mpsc::unbounded_channel::<ChatStreamEvent>();
    let sse_stream =
        UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(event));

    // Get the next response
    tokio::spawn(async move {
        let increments = tx.clone();
        let result = next_reply(
            backend.as_ref(),
            &config,
            &message,
            Delivery::Streaming,
            move |content| {
                // The result is ignored here because the reply should
                // still be recorded if the client disconnected
                let _ = increments.send(ChatStreamEvent::Delta {
                    content: content.to_string(),
                });
            },
        )
        .await;

        // Record the exchange before telling the client the turn is
        // over
        let exchange = result
            .as_ref()
            .ok()
            .map(|reply| (message.as_str(), reply.as_str()));
        let recorded = state
            .write()
            .expect("Unable to write shared state")
            .sessions
            .get_or_create(&session_id)
            .finish_turn(ticket, exchange);

        let event = match result {
            Ok(reply) => {
                tracing::debug!("Chat session {} turn recorded: {}", session_id, recorded);
                ChatStreamEvent::Done { content: reply }
            }
            Err(e) => {
                tracing::error!("Chat handler error: {}. Root cause: {}", e, e.root_cause());
                ChatStreamEvent::Error {
                    message: format!("Something went wrong: {}", e),
                }
            }
        };
        let _ = tx.send(event);
    });

    let resp = Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_secs(10)),
        )
        .into_response();

    Ok(resp)
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/sessions", get(chat_list))
        .route("/{id}", get(chat_session).delete(reset_session))
}
