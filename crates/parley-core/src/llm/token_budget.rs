//! Token budget estimation and model auto-selection.
//!
//! Every model has a fixed context budget. Before a request goes out, the
//! estimator counts the prompt tokens and, when the prompt does not leave
//! room for the completion, retargets the request to a larger-budget model.
//! Selection is advisory: a request is never rejected here.

use std::collections::BTreeMap;
use std::sync::Arc;

use parley_types::config::ParleyConfig;
use parley_types::llm::Message;

/// Budget assumed for a model missing from the budget table.
pub const DEFAULT_MODEL_BUDGET: u32 = 2048;

/// Trait for token counting implementations.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in a plain text string.
    fn count_text(&self, text: &str) -> u32;

    /// Count tokens across the content of every message.
    fn count_messages(&self, messages: &[Message]) -> u32 {
        messages
            .iter()
            .map(|m| self.count_text(&m.content))
            .fold(0u32, u32::saturating_add)
    }
}

/// Character-based token estimate: roughly 4 characters per token.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    chars_per_token: f64,
}

impl HeuristicTokenCounter {
    pub fn new(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        let chars = text.chars().count() as f64;
        (chars / self.chars_per_token).ceil() as u32
    }
}

/// Outcome of [`TokenBudgetEstimator::select_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub estimated_tokens: u32,
    pub available_tokens: u32,
    /// Set when the request was retargeted to the fallback model.
    pub advisory: Option<String>,
}

impl ModelSelection {
    pub fn retargeted(&self) -> bool {
        self.advisory.is_some()
    }
}

/// Counts prompt tokens and picks the model a request should go to.
#[derive(Clone)]
pub struct TokenBudgetEstimator {
    counter: Arc<dyn TokenCounter>,
    budgets: BTreeMap<String, u32>,
    reserved_completion_tokens: u32,
    auto_select: bool,
    fallback_model: String,
}

impl TokenBudgetEstimator {
    pub fn new(
        counter: Arc<dyn TokenCounter>,
        budgets: BTreeMap<String, u32>,
        reserved_completion_tokens: u32,
        auto_select: bool,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            counter,
            budgets,
            reserved_completion_tokens,
            auto_select,
            fallback_model: fallback_model.into(),
        }
    }

    /// Build an estimator from the loaded configuration.
    ///
    /// The completion ceiling (`max_tokens`) is what gets reserved out of
    /// each model's budget.
    pub fn from_config(config: &ParleyConfig, counter: Arc<dyn TokenCounter>) -> Self {
        Self::new(
            counter,
            config.model_budgets.clone(),
            config.max_tokens,
            config.model_auto_select,
            config.long_message_model.clone(),
        )
    }

    /// Context budget for `model`, or [`DEFAULT_MODEL_BUDGET`] when unknown.
    pub fn max_budget(&self, model: &str) -> u32 {
        self.budgets
            .get(model)
            .copied()
            .unwrap_or(DEFAULT_MODEL_BUDGET)
    }

    /// Tokens the full message set would consume.
    pub fn estimate(&self, messages: &[Message]) -> u32 {
        self.counter.count_messages(messages)
    }

    /// Pick the model for a request.
    ///
    /// Returns the fallback model if and only if auto-select is enabled and
    /// the estimate exceeds `max_budget(base) - reserved_completion_tokens`.
    pub fn select_model(&self, messages: &[Message], base_model: &str) -> ModelSelection {
        let available = self
            .max_budget(base_model)
            .saturating_sub(self.reserved_completion_tokens);

        if messages.is_empty() {
            return ModelSelection {
                model: base_model.to_string(),
                estimated_tokens: 0,
                available_tokens: available,
                advisory: None,
            };
        }

        let estimated = self.estimate(messages);
        if self.auto_select && estimated > available {
            let advisory = format!(
                "Messages token count ({estimated}) exceeds available token size ({available}). \
                 Selected model: {}.",
                self.fallback_model
            );
            tracing::warn!(
                estimated,
                available,
                base_model,
                fallback_model = %self.fallback_model,
                "Prompt exceeds model budget, retargeting to fallback model"
            );
            return ModelSelection {
                model: self.fallback_model.clone(),
                estimated_tokens: estimated,
                available_tokens: available,
                advisory: Some(advisory),
            };
        }

        ModelSelection {
            model: base_model.to_string(),
            estimated_tokens: estimated,
            available_tokens: available,
            advisory: None,
        }
    }
}

impl std::fmt::Debug for TokenBudgetEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBudgetEstimator")
            .field("budgets", &self.budgets)
            .field("reserved_completion_tokens", &self.reserved_completion_tokens)
            .field("auto_select", &self.auto_select)
            .field("fallback_model", &self.fallback_model)
            .finish()
    }
}
