//! Scripted fakes for the core ports, shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use parley_types::conversation::{ConversationContext, Turn};
use parley_types::error::{FetchError, StoreError};
use parley_types::llm::{
    CompletionRequest, CompletionResponse, FunctionCall, LlmError, StopReason, Usage,
};
use parley_types::summary::Document;

use crate::context::{ContextStore, PromptLog, PromptRecord};
use crate::fetch::DocumentFetcher;
use crate::llm::provider::CompletionService;

pub fn response(content: &str, stop_reason: StopReason) -> CompletionResponse {
    CompletionResponse {
        id: "resp-test".to_string(),
        content: content.to_string(),
        model: "scripted-model".to_string(),
        stop_reason,
        function_call: None,
        usage: Usage::default(),
    }
}

/// Replays queued responses in order and records every request.
#[derive(Clone, Default)]
pub struct ScriptedCompletionService {
    responses: Arc<Mutex<VecDeque<Result<CompletionResponse, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<CompletionResponse, LlmError>) {
        self.responses.lock().unwrap().push_back(result);
    }

    /// Queue a naturally finished reply.
    pub fn push_text(&self, content: &str) {
        self.push(Ok(response(content, StopReason::Stop)));
    }

    /// Queue a reply cut short by the token ceiling.
    pub fn push_truncated(&self, content: &str) {
        self.push(Ok(response(content, StopReason::Length)));
    }

    pub fn push_error(&self, error: LlmError) {
        self.push(Err(error));
    }

    pub fn push_function_call(&self, name: &str, arguments: &str) {
        let mut resp = response("", StopReason::FunctionCall);
        resp.function_call = Some(FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        });
        self.push(Ok(resp));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CompletionService for ScriptedCompletionService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::Provider {
                    message: "no scripted response left".to_string(),
                })
            })
    }
}

/// Never answers.
#[derive(Clone, Default)]
pub struct StalledCompletionService;

impl CompletionService for StalledCompletionService {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        std::future::pending().await
    }
}

/// In-memory history with the same capping rule as the file store.
#[derive(Clone)]
pub struct MemoryContextStore {
    cap: usize,
    context: Arc<Mutex<ConversationContext>>,
}

impl MemoryContextStore {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            context: Arc::new(Mutex::new(ConversationContext::default())),
        }
    }

    pub fn with_turns(cap: usize, turns: Vec<Turn>) -> Self {
        let store = Self::new(cap);
        *store.context.lock().unwrap() = ConversationContext::new(turns);
        store
    }

    pub fn snapshot(&self) -> ConversationContext {
        self.context.lock().unwrap().clone()
    }
}

impl ContextStore for MemoryContextStore {
    async fn load(&self) -> ConversationContext {
        self.snapshot()
    }

    async fn append(&self, turn: Turn) -> Result<(), StoreError> {
        self.context.lock().unwrap().push_capped(turn, self.cap);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.context.lock().unwrap() = ConversationContext::default();
        Ok(())
    }
}

/// In-memory prompt log; `failing()` makes every append fail.
#[derive(Clone, Default)]
pub struct MemoryPromptLog {
    records: Arc<Mutex<Vec<PromptRecord>>>,
    fail: bool,
    cancel_on_append: Option<CancellationToken>,
}

impl MemoryPromptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Fires `cancel` while a turn is being committed.
    pub fn cancelling(cancel: CancellationToken) -> Self {
        Self {
            cancel_on_append: Some(cancel),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<PromptRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl PromptLog for MemoryPromptLog {
    async fn append(&self, record: &PromptRecord) -> Result<(), StoreError> {
        if let Some(cancel) = &self.cancel_on_append {
            cancel.cancel();
        }
        if self.fail {
            return Err(StoreError::Io("disk full".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn read(&self) -> Result<String, StoreError> {
        Ok(self.records().iter().map(PromptRecord::render).collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}

/// Serves fixed documents; unknown URLs fail with HTTP 404.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, Document>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, title: &str, text: &str) -> Self {
        self.documents.insert(
            url.to_string(),
            Document {
                title: title.to_string(),
                text: text.to_string(),
            },
        );
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or(FetchError::Http { status: 404 })
    }
}
