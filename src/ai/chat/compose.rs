//! Builds the outbound request for a turn from the current settings.
//!
//! Only the latest user message is sent to the model. Earlier turns
//! stay in the session history for display but are not included as
//! context.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{ChatMessage, Role};

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 2.0;

const BRIEF_INSTRUCTION: &str =
    "Give a short answer that covers only the key point in 1-2 sentences.";
const NORMAL_INSTRUCTION: &str = "Answer clearly at a moderate length (about 2-3 paragraphs).";
const DETAILED_INSTRUCTION: &str =
    "Give a detailed and comprehensive answer. Include examples or additional explanation.";
const VERY_DETAILED_INSTRUCTION: &str = "Give a very detailed, in-depth answer. Include multiple perspectives, examples and related information.";
const FALLBACK_INSTRUCTION: &str = "Answer at an appropriate length.";

/// How verbose the assistant should be. Parsing never fails, values
/// that aren't recognized are kept as-is and get the fallback
/// instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LengthPreference {
    Brief,
    #[default]
    Normal,
    Detailed,
    VeryDetailed,
    Unrecognized(String),
}

impl LengthPreference {
    /// All of the preferences that have a dedicated instruction, in
    /// display order.
    pub fn known() -> [LengthPreference; 4] {
        [
            LengthPreference::Brief,
            LengthPreference::Normal,
            LengthPreference::Detailed,
            LengthPreference::VeryDetailed,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            LengthPreference::Brief => "brief",
            LengthPreference::Normal => "normal",
            LengthPreference::Detailed => "detailed",
            LengthPreference::VeryDetailed => "very-detailed",
            LengthPreference::Unrecognized(s) => s,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LengthPreference::Brief => "Brief",
            LengthPreference::Normal => "Normal",
            LengthPreference::Detailed => "Detailed",
            LengthPreference::VeryDetailed => "Very detailed",
            LengthPreference::Unrecognized(s) => s,
        }
    }
}

impl From<&str> for LengthPreference {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "brief" => LengthPreference::Brief,
            "normal" => LengthPreference::Normal,
            "detailed" => LengthPreference::Detailed,
            "very-detailed" => LengthPreference::VeryDetailed,
            _ => LengthPreference::Unrecognized(value.to_string()),
        }
    }
}

impl From<String> for LengthPreference {
    fn from(value: String) -> Self {
        LengthPreference::from(value.as_str())
    }
}

impl From<LengthPreference> for String {
    fn from(item: LengthPreference) -> String {
        item.as_str().to_string()
    }
}

impl fmt::Display for LengthPreference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the instruction appended to the system prompt for the
/// given length preference.
pub fn length_instruction(preference: &LengthPreference) -> &'static str {
    match preference {
        LengthPreference::Brief => BRIEF_INSTRUCTION,
        LengthPreference::Normal => NORMAL_INSTRUCTION,
        LengthPreference::Detailed => DETAILED_INSTRUCTION,
        LengthPreference::VeryDetailed => VERY_DETAILED_INSTRUCTION,
        LengthPreference::Unrecognized(_) => FALLBACK_INSTRUCTION,
    }
}

/// The exact messages sent to the model for one turn: the enhanced
/// system prompt followed by the latest user message.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
    messages: [ChatMessage; 2],
}

impl OutboundRequest {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system_text(&self) -> &str {
        self.messages[0].content()
    }

    pub fn user_text(&self) -> &str {
        self.messages[1].content()
    }
}

pub fn compose(
    system_prompt: &str,
    latest_user_text: &str,
    length: &LengthPreference,
) -> OutboundRequest {
    let instruction = length_instruction(length);
    let enhanced_system_prompt = format!("{}\n\nResponse style: {}", system_prompt, instruction);

    OutboundRequest {
        messages: [
            ChatMessage::new(Role::System, &enhanced_system_prompt),
            ChatMessage::new(Role::User, latest_user_text),
        ],
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum GenerationConfigError {
    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    TemperatureOutOfRange(f64),
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
}

/// Per-turn generation settings. These are read fresh for every turn
/// and never stored with the history.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    pub length: LengthPreference,
    pub system_prompt: String,
}

impl GenerationConfig {
    pub fn new(
        model: &str,
        temperature: f64,
        length: LengthPreference,
        system_prompt: &str,
    ) -> Result<Self, GenerationConfigError> {
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(GenerationConfigError::TemperatureOutOfRange(temperature));
        }

        Ok(Self {
            model: model.to_string(),
            temperature,
            length,
            system_prompt: system_prompt.to_string(),
        })
    }

    /// Checks the selected model against the catalog of models the
    /// user is allowed to pick from.
    pub fn validate_model(&self, catalog: &[String]) -> Result<(), GenerationConfigError> {
        if catalog.iter().any(|m| *m == self.model) {
            Ok(())
        } else {
            Err(GenerationConfigError::UnknownModel(self.model.clone()))
        }
    }

    pub fn request(&self, latest_user_text: &str) -> OutboundRequest {
        compose(&self.system_prompt, latest_user_text, &self.length)
    }
}
