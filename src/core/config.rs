use std::env;

use anyhow::{Result, anyhow, bail};

use crate::ai::chat::{GenerationConfig, LengthPreference};

pub const DEFAULT_MODELS: [&str; 3] = ["gpt-4.1", "gpt-4.1-mini", "gpt-4.1-nano"];
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful and friendly AI assistant. Give accurate and useful answers to the user's questions, and include additional information or examples when they help the explanation.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    /// Models the user can pick from
    pub models: Vec<String>,
    pub default_model: String,
    pub default_temperature: f64,
    pub default_length: LengthPreference,
    pub system_message: String,
    pub web_ui_path: String,
}

impl AppConfig {
    /// Loads the config from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Loads the config using `lookup` to get the value of each
    /// variable.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_hostname = lookup("CHATBOT_LLM_HOST")
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let openai_api_key =
            lookup("OPENAI_API_KEY").unwrap_or_else(|| "thiswontworkforopenai".to_string());

        let models: Vec<String> = match lookup("CHATBOT_MODELS") {
            Some(models) => models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        let first_model = models
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("CHATBOT_MODELS must list at least one model"))?;
        let default_model = lookup("CHATBOT_MODEL").unwrap_or(first_model);
        if !models.contains(&default_model) {
            bail!(
                "CHATBOT_MODEL {} is not one of the available models: {}",
                default_model,
                models.join(", ")
            );
        }

        let default_temperature = match lookup("CHATBOT_TEMPERATURE") {
            Some(t) => t
                .trim()
                .parse::<f64>()
                .map_err(|e| anyhow!("Invalid CHATBOT_TEMPERATURE {}: {}", t, e))?,
            None => DEFAULT_TEMPERATURE,
        };
        let default_length = lookup("CHATBOT_RESPONSE_LENGTH")
            .map(LengthPreference::from)
            .unwrap_or_default();
        let system_message =
            lookup("CHATBOT_SYSTEM_MESSAGE").unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string());
        let web_ui_path =
            lookup("CHATBOT_WEB_UI_PATH").unwrap_or_else(|| "./web-ui/src".to_string());

        let config = Self {
            openai_api_hostname,
            openai_api_key,
            models,
            default_model,
            default_temperature,
            default_length,
            system_message,
            web_ui_path,
        };

        // Fail early on a default temperature that no turn could use
        config.default_generation_config()?;

        Ok(config)
    }

    /// The generation settings used when the user hasn't changed
    /// anything.
    pub fn default_generation_config(&self) -> Result<GenerationConfig> {
        let config = GenerationConfig::new(
            &self.default_model,
            self.default_temperature,
            self.default_length.clone(),
            &self.system_message,
        )?;
        Ok(config)
    }
}
