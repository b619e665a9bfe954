//! Application state wiring the infra adapters into the core workflows.
//!
//! The store and log are shared (`Arc`) by every workflow started from one
//! process, so their internal locks serialize all access to the files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use parley_core::chat::ConversationSession;
use parley_core::llm::box_provider::BoxCompletionService;
use parley_core::llm::token_budget::TokenBudgetEstimator;
use parley_core::summary::SummarizationPipeline;
use parley_infra::config::{API_KEY_ENV, load_api_key, load_config};
use parley_infra::context_store::JsonContextStore;
use parley_infra::fetch::HttpDocumentFetcher;
use parley_infra::filesystem::{context_path, prompt_log_path, resolve_data_dir};
use parley_infra::llm::openai::OpenAiCompatibleProvider;
use parley_infra::llm::tokenizer::TiktokenCounter;
use parley_infra::prompt_log::FilePromptLog;
use parley_types::config::ParleyConfig;

pub type ConcreteSession = ConversationSession<JsonContextStore, FilePromptLog>;
pub type ConcretePipeline = SummarizationPipeline<HttpDocumentFetcher>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ParleyConfig>,
    pub data_dir: PathBuf,
    pub store: Arc<JsonContextStore>,
    pub prompt_log: Arc<FilePromptLog>,
}

impl AppState {
    /// Resolve the data directory, load and validate configuration.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        config.validate().context("invalid configuration")?;

        let store = JsonContextStore::new(context_path(&data_dir), config.context_history_size);
        let prompt_log = FilePromptLog::new(prompt_log_path(&data_dir));

        Ok(Self {
            config: Arc::new(config),
            data_dir,
            store: Arc::new(store),
            prompt_log: Arc::new(prompt_log),
        })
    }

    /// Build the completion client. Needs `OPENAI_API_KEY`.
    pub fn completion_service(&self) -> anyhow::Result<Arc<BoxCompletionService>> {
        let api_key = load_api_key()
            .with_context(|| format!("{API_KEY_ENV} is not set"))?;
        let provider = OpenAiCompatibleProvider::new(api_key, self.config.api_base_url.clone())?;
        Ok(Arc::new(BoxCompletionService::new(provider)))
    }

    /// Model auto-selection counting with the configured model's tokenizer.
    fn token_budget(&self) -> TokenBudgetEstimator {
        let counter = Arc::new(TiktokenCounter::for_model(&self.config.model));
        TokenBudgetEstimator::from_config(&self.config, counter)
    }

    /// A fresh conversation session over the shared store and log.
    pub fn conversation_session(&self) -> anyhow::Result<ConcreteSession> {
        Ok(ConversationSession::new(
            &self.config,
            self.completion_service()?,
            self.store.clone(),
            self.prompt_log.clone(),
            self.token_budget(),
        ))
    }

    /// A summarization pipeline over the HTTP fetcher.
    pub fn summarization_pipeline(&self) -> anyhow::Result<ConcretePipeline> {
        let fetcher = HttpDocumentFetcher::new()?;
        Ok(SummarizationPipeline::new(
            &self.config,
            self.completion_service()?,
            Arc::new(fetcher),
            self.token_budget(),
        ))
    }
}
