//! URL-list summarization.
//!
//! Each URL is fetched, normalized, split into chunks and folded chunk by
//! chunk into one running summary. URLs are processed strictly in order and
//! the first failure aborts the whole run.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use parley_types::config::ParleyConfig;
use parley_types::error::SummarizationError;
use parley_types::event::SummaryEvent;
use parley_types::llm::{CompletionRequest, FunctionCallMode, Message};
use parley_types::summary::SummaryRecord;

use super::chunker::{normalize_text, split_chunks};
use super::render::render_summaries;
use crate::fetch::DocumentFetcher;
use crate::llm::box_provider::BoxCompletionService;
use crate::llm::token_budget::TokenBudgetEstimator;
use crate::prompt::find_urls::{decode_find_urls, find_urls_function, find_urls_messages};
use crate::prompt::{MessageTemplate, PromptSettings};

pub struct SummarizationPipeline<F> {
    service: Arc<BoxCompletionService>,
    fetcher: Arc<F>,
    estimator: TokenBudgetEstimator,
    settings: PromptSettings,
    model: String,
    max_tokens: u32,
    temperature: f64,
    chunk_size: usize,
    events: Option<mpsc::UnboundedSender<SummaryEvent>>,
    cancel: CancellationToken,
}

impl<F: DocumentFetcher> SummarizationPipeline<F> {
    pub fn new(
        config: &ParleyConfig,
        service: Arc<BoxCompletionService>,
        fetcher: Arc<F>,
        estimator: TokenBudgetEstimator,
    ) -> Self {
        Self {
            service,
            fetcher,
            estimator,
            settings: PromptSettings::from_config(config),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            chunk_size: config.chunk_size,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Report progress on `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<SummaryEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Stop before the next fetch or fold once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Summarize every URL and render the result.
    pub async fn summarize(&self, urls: &[String]) -> Result<String, SummarizationError> {
        let records = self.summarize_records(urls).await?;
        Ok(render_summaries(&records))
    }

    /// Summarize every URL, one record per URL in input order.
    ///
    /// Fails with [`SummarizationError::InvalidInput`] before any network
    /// call when `urls` is empty or contains a blank entry.
    #[instrument(skip(self, urls), fields(url_count = urls.len(), chunk_size = self.chunk_size))]
    pub async fn summarize_records(
        &self,
        urls: &[String],
    ) -> Result<Vec<SummaryRecord>, SummarizationError> {
        if urls.is_empty() {
            return Err(SummarizationError::InvalidInput(
                "expected a non-empty list of urls".to_string(),
            ));
        }
        if urls.iter().any(|u| u.trim().is_empty()) {
            return Err(SummarizationError::InvalidInput(
                "url list contains an empty entry".to_string(),
            ));
        }

        let mut records = Vec::with_capacity(urls.len());
        for url in urls {
            records.push(self.summarize_document(url).await?);
        }
        info!(documents = records.len(), "Summarization complete");
        Ok(records)
    }

    /// Fetch one URL and fold its chunks into a single summary.
    ///
    /// The running summary is replaced by each chunk's output, so the last
    /// chunk's completion is the document summary.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn summarize_document(&self, url: &str) -> Result<SummaryRecord, SummarizationError> {
        self.emit(SummaryEvent::Document {
            url: url.to_string(),
        });

        let document = self
            .guarded(self.fetcher.fetch(url))
            .await?
            .map_err(|source| SummarizationError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let text = normalize_text(&document.text);
        let chunks = split_chunks(&text, self.chunk_size);
        if chunks.is_empty() {
            warn!(url, "Document has no text to summarize");
        }
        debug!(title = %document.title, chars = text.chars().count(), chunks = chunks.len(), "Document fetched");

        let mut summary = String::new();
        for (index, chunk) in chunks.iter().copied().enumerate() {
            self.emit(SummaryEvent::Chunk {
                url: url.to_string(),
                index,
                total: chunks.len(),
            });

            let messages = MessageTemplate::Summarize {
                title: &document.title,
                prior_summary: &summary,
                chunk,
            }
            .build(&self.settings);
            let request = self.request(messages);

            let response = self
                .guarded(self.service.complete(&request))
                .await?
                .map_err(|source| SummarizationError::Completion {
                    url: url.to_string(),
                    source,
                })?;
            summary = response.content.trim().to_string();
        }

        Ok(SummaryRecord {
            url: url.to_string(),
            summary,
        })
    }

    /// Ask the service to pull the URLs out of free text through the
    /// `find_urls` function call.
    #[instrument(skip(self, text), fields(model = %self.model, len = text.len()))]
    pub async fn find_urls(&self, text: &str) -> Result<Vec<String>, SummarizationError> {
        if text.trim().is_empty() {
            return Err(SummarizationError::InvalidInput(
                "no text to search for urls".to_string(),
            ));
        }

        let mut request = self.request(find_urls_messages(text));
        request.functions = vec![find_urls_function()];
        request.function_call = Some(FunctionCallMode::Auto);

        let response = self
            .guarded(self.service.complete(&request))
            .await?
            .map_err(|e| SummarizationError::UrlExtraction(format!("completion failed: {e}")))?;

        let call = response.function_call.ok_or_else(|| {
            SummarizationError::UrlExtraction("response carried no function call".to_string())
        })?;
        let args = decode_find_urls(&call).map_err(SummarizationError::UrlExtraction)?;

        debug!(urls = args.urls.len(), "Extracted urls");
        Ok(args.urls)
    }

    /// Find the URLs in `text` and summarize them.
    pub async fn summarize_text(&self, text: &str) -> Result<String, SummarizationError> {
        let urls = self.find_urls(text).await?;
        self.summarize(&urls).await
    }

    /// Build a request, retargeting it when the prompt outgrows the model.
    fn request(&self, messages: Vec<Message>) -> CompletionRequest {
        let selection = self.estimator.select_model(&messages, &self.model);
        if let Some(message) = selection.advisory {
            self.emit(SummaryEvent::Advisory { message });
        }
        CompletionRequest {
            model: selection.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            functions: Vec::new(),
            function_call: None,
        }
    }

    /// Run `fut` unless cancellation fires first.
    async fn guarded<T>(&self, fut: impl Future<Output = T>) -> Result<T, SummarizationError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("Summarization cancelled");
                Err(SummarizationError::Cancelled)
            }
            out = fut => Ok(out),
        }
    }

    fn emit(&self, event: SummaryEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
