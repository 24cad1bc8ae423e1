//! Public types for the settings API
use serde::{Deserialize, Serialize};

use crate::ai::chat::LengthPreference;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct LengthOption {
    pub value: LengthPreference,
    pub label: String,
}

impl From<LengthPreference> for LengthOption {
    fn from(value: LengthPreference) -> Self {
        let label = value.label().to_string();
        Self { value, label }
    }
}

/// Everything the UI needs to render the settings sidebar.
#[derive(Serialize, Deserialize, Debug)]
pub struct SettingsResponse {
    pub models: Vec<String>,
    pub default_model: String,
    pub temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub length: LengthPreference,
    pub length_options: Vec<LengthOption>,
    pub system_prompt: String,
}
