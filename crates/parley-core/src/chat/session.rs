//! One conversation turn, end to end.
//!
//! `ConversationSession::run_turn` reads the prior window, translates the
//! input when configured, builds the message set, picks a model against the
//! token budget, calls the completion service and, only on success, commits
//! the turn to the context store and the prompt log.

use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use parley_types::config::ParleyConfig;
use parley_types::conversation::{SessionState, Turn};
use parley_types::error::ConversationError;
use parley_types::llm::{CompletionRequest, StopReason};

use super::translate::Translator;
use crate::context::{ContextStore, PromptLog, PromptRecord};
use crate::llm::box_provider::BoxCompletionService;
use crate::llm::token_budget::TokenBudgetEstimator;
use crate::prompt::{MessageTemplate, PromptSettings};

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub text: String,
    pub stop_reason: StopReason,
    /// Model the request was actually sent to.
    pub model: String,
    /// Set when the request was retargeted to the long-message model.
    pub advisory: Option<String>,
}

impl TurnOutcome {
    pub fn is_complete(&self) -> bool {
        self.stop_reason.is_complete()
    }
}

/// A conversation session over a shared context store and prompt log.
///
/// Sessions are cheap and constructed per workflow invocation; everything
/// that outlives a session lives behind the store and log.
pub struct ConversationSession<S, L> {
    id: Uuid,
    service: Arc<BoxCompletionService>,
    store: Arc<S>,
    log: Arc<L>,
    estimator: TokenBudgetEstimator,
    translator: Translator,
    settings: PromptSettings,
    model: String,
    max_tokens: u32,
    temperature: f64,
    prior_window: usize,
    state: SessionState,
}

impl<S: ContextStore, L: PromptLog> ConversationSession<S, L> {
    pub fn new(
        config: &ParleyConfig,
        service: Arc<BoxCompletionService>,
        store: Arc<S>,
        log: Arc<L>,
        estimator: TokenBudgetEstimator,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            service,
            store,
            log,
            translator: Translator::from_config(config, estimator.clone()),
            estimator,
            settings: PromptSettings::from_config(config),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            prior_window: config.prior_conversation_size,
            state: SessionState::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Number of prior turns that seed each request (`W`).
    pub fn prior_window(&self) -> usize {
        self.prior_window
    }

    /// Attach the host view this session reports into.
    pub fn set_window(&mut self, window: Option<String>) {
        self.state.window = window;
    }

    pub fn is_code_review(&self) -> bool {
        self.state.code_review
    }

    /// Switch to the code-review template. Reviews never accumulate, so the
    /// persisted history is cleared first.
    pub async fn begin_code_review(&mut self) -> Result<(), ConversationError> {
        self.store.clear().await?;
        self.state.code_review = true;
        debug!(session_id = %self.id, "Code review started, history cleared");
        Ok(())
    }

    /// Close a finished review: clear the history and drop back to plain
    /// conversation.
    pub async fn finish_code_review(&mut self) -> Result<(), ConversationError> {
        self.store.clear().await?;
        self.state.code_review = false;
        debug!(session_id = %self.id, "Code review finished, history cleared");
        Ok(())
    }

    /// Run one turn. Nothing is persisted unless the completion succeeds.
    pub async fn run_turn(&mut self, user_message: &str) -> Result<TurnOutcome, ConversationError> {
        self.run_turn_until_cancelled(user_message, &CancellationToken::new())
            .await
    }

    /// Run one turn, giving up with [`ConversationError::Cancelled`] if
    /// `cancel` fires while a request is in flight. Once the reply has
    /// arrived the turn is committed to the store and log regardless.
    #[instrument(
        skip(self, user_message, cancel),
        fields(session_id = %self.id, code_review = self.state.code_review)
    )]
    pub async fn run_turn_until_cancelled(
        &mut self,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, ConversationError> {
        if user_message.trim().is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        let context = self.store.load().await;
        let prior = context.window(self.prior_window);

        let message = if self.state.code_review {
            user_message.to_string()
        } else {
            unless_cancelled(
                cancel,
                self.translator.to_pivot_language(&self.service, user_message),
            )
            .await??
        };

        let template = if self.state.code_review {
            MessageTemplate::CodeReview {
                prior,
                code: &message,
            }
        } else {
            MessageTemplate::Conversation {
                prior,
                user_message: &message,
            }
        };
        let messages = template.build(&self.settings);

        let selection = self.estimator.select_model(&messages, &self.model);
        debug!(
            model = %selection.model,
            estimated_tokens = selection.estimated_tokens,
            available_tokens = selection.available_tokens,
            prior_turns = prior.len(),
            "Sending conversation turn"
        );

        let request = CompletionRequest {
            model: selection.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            functions: Vec::new(),
            function_call: None,
        };
        let response = unless_cancelled(cancel, self.service.complete(&request)).await??;

        self.store
            .append(Turn::new(message.as_str(), response.content.as_str()))
            .await?;

        let record = PromptRecord::from_exchange(Local::now(), &request.messages, &response.content);
        if let Err(e) = self.log.append(&record).await {
            warn!(error = %e, "Failed to write prompt log");
        }

        self.state.last_stop_reason = Some(response.stop_reason.clone());

        Ok(TurnOutcome {
            text: response.content,
            stop_reason: response.stop_reason,
            model: selection.model,
            advisory: selection.advisory,
        })
    }
}

/// Await `fut` unless `cancel` fires first.
async fn unless_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, ConversationError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConversationError::Cancelled),
        out = fut => Ok(out),
    }
}

impl<S, L> std::fmt::Debug for ConversationSession<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("prior_window", &self.prior_window)
            .field("state", &self.state)
            .finish()
    }
}
