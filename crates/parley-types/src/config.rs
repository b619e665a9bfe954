//! Configuration types for Parley.
//!
//! `ParleyConfig` represents `config.toml` in the data directory. Every field
//! has a default, so an empty or missing file yields a working setup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Model used for every request unless auto-select retargets it.
    pub model: String,
    /// Larger-budget model used when a request does not fit `model`.
    pub long_message_model: String,
    /// Completion token ceiling, also reserved out of the model budget.
    pub max_tokens: u32,
    pub temperature: f64,
    /// Language replies are requested in.
    pub language: String,
    /// Language user input is translated into before it is sent.
    pub pivot_language: String,
    /// Number of prior turns sent with each request (W). Also caps
    /// continuation iterations.
    pub prior_conversation_size: usize,
    /// Maximum number of turns kept in the persisted history (H).
    pub context_history_size: usize,
    /// Characters per chunk in the summarization fold (C).
    pub chunk_size: usize,
    pub model_auto_select: bool,
    pub translate_user_message: bool,
    /// Base URL of the OpenAI-compatible chat-completion API.
    pub api_base_url: String,
    /// Context budget per model. Doubles as the allow-list of model names.
    pub model_budgets: BTreeMap<String, u32>,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            long_message_model: "gpt-3.5-turbo-16k".to_string(),
            max_tokens: 500,
            temperature: 0.0,
            language: "English".to_string(),
            pivot_language: "English".to_string(),
            prior_conversation_size: 6,
            context_history_size: 100,
            chunk_size: 1000,
            model_auto_select: true,
            translate_user_message: false,
            api_base_url: "https://api.openai.com/v1".to_string(),
            model_budgets: default_model_budgets(),
        }
    }
}

fn default_model_budgets() -> BTreeMap<String, u32> {
    BTreeMap::from([
        ("gpt-3.5-turbo".to_string(), 4097),
        ("gpt-4".to_string(), 2048),
        ("gpt-3.5-turbo-16k".to_string(), 16384),
    ])
}

impl ParleyConfig {
    /// Model names accepted for `model`, comma separated.
    pub fn allowed_models(&self) -> String {
        self.model_budgets
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Reject configurations the workflows cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.model_budgets.contains_key(&self.model) {
            return Err(ConfigError::UnknownModel {
                model: self.model.clone(),
                allowed: self.allowed_models(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chunk_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.context_history_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "context_history_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.prior_conversation_size > self.context_history_size {
            return Err(ConfigError::InvalidValue {
                field: "prior_conversation_size",
                reason: format!(
                    "{} exceeds context_history_size {}",
                    self.prior_conversation_size, self.context_history_size
                ),
            });
        }
        Ok(())
    }
}
