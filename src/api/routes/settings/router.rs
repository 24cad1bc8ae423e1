//! Router for the settings API

use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, routing::get};

use super::public::{LengthOption, SettingsResponse};
use crate::ai::chat::LengthPreference;
use crate::ai::chat::compose::{MAX_TEMPERATURE, MIN_TEMPERATURE};
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Get the available models and the default settings for a turn
async fn settings_handler(State(state): State<SharedState>) -> axum::Json<SettingsResponse> {
    let shared_state = state.read().expect("Unable to read shared state");
    let config = &shared_state.config;

    axum::Json(SettingsResponse {
        models: config.models.clone(),
        default_model: config.default_model.clone(),
        temperature: config.default_temperature,
        min_temperature: MIN_TEMPERATURE,
        max_temperature: MAX_TEMPERATURE,
        length: config.default_length.clone(),
        length_options: LengthPreference::known()
            .into_iter()
            .map(LengthOption::from)
            .collect(),
        system_prompt: config.system_message.clone(),
    })
}

/// Create the settings router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(settings_handler))
}
