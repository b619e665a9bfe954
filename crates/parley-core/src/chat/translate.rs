//! Pivot-language translation of user input.

use tracing::{debug, instrument};

use parley_types::config::ParleyConfig;
use parley_types::error::TranslateError;
use parley_types::llm::CompletionRequest;

use crate::llm::box_provider::BoxCompletionService;
use crate::llm::token_budget::TokenBudgetEstimator;
use crate::prompt::{MessageTemplate, PromptSettings};

/// Translates user messages into the pivot language before they are sent.
#[derive(Debug, Clone)]
pub struct Translator {
    enabled: bool,
    settings: PromptSettings,
    estimator: TokenBudgetEstimator,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl Translator {
    pub fn new(
        enabled: bool,
        settings: PromptSettings,
        estimator: TokenBudgetEstimator,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            enabled,
            settings,
            estimator,
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    pub fn from_config(config: &ParleyConfig, estimator: TokenBudgetEstimator) -> Self {
        Self::new(
            config.translate_user_message,
            PromptSettings::from_config(config),
            estimator,
            config.model.clone(),
            config.max_tokens,
            config.temperature,
        )
    }

    /// True when `to_pivot_language` would call the service.
    pub fn is_active(&self) -> bool {
        self.enabled && self.settings.language != self.settings.pivot_language
    }

    /// Translate `text` into the pivot language.
    ///
    /// Identity when translation is disabled or the target language already
    /// is the pivot language. Long input is retargeted to the long-message
    /// model like any other request. Service failures surface as
    /// [`TranslateError::Completion`]; an empty translation yields the input.
    #[instrument(skip(self, service, text), fields(model = %self.model, len = text.len()))]
    pub async fn to_pivot_language(
        &self,
        service: &BoxCompletionService,
        text: &str,
    ) -> Result<String, TranslateError> {
        if !self.is_active() {
            return Ok(text.to_string());
        }
        if text.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let messages = MessageTemplate::Translate { text }.build(&self.settings);
        let selection = self.estimator.select_model(&messages, &self.model);
        let request = CompletionRequest {
            model: selection.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            functions: Vec::new(),
            function_call: None,
        };

        let response = service
            .complete(&request)
            .await
            .map_err(TranslateError::Completion)?;

        let translated = response.content.trim();
        if translated.is_empty() {
            debug!("Translation came back empty, keeping the original text");
            return Ok(text.to_string());
        }
        Ok(translated.to_string())
    }
}
