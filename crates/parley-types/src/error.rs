use thiserror::Error;

use crate::llm::LlmError;

/// Errors from a conversation turn.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("user message is empty")]
    EmptyInput,

    #[error("completion failed")]
    Completion(#[from] LlmError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("context store error")]
    Store(#[from] StoreError),

    #[error("conversation cancelled")]
    Cancelled,
}

/// Errors from translating user input into the pivot language.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("nothing to translate: message is empty")]
    EmptyInput,

    #[error("translation failed")]
    Completion(#[source] LlmError),
}

/// Errors from the URL summarization pipeline.
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to fetch '{url}'")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to summarize '{url}'")]
    Completion {
        url: String,
        #[source]
        source: LlmError,
    },

    #[error("failed to extract urls: {0}")]
    UrlExtraction(String),

    #[error("summarization cancelled")]
    Cancelled,
}

/// Errors from retrieving a document.
///
/// Network and HTTP failures are distinct from failures to make sense of
/// the body that came back.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("parse error: {0}")]
    Parse(String),
}

/// Errors from the persisted context store and prompt log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from validating the loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid model name: '{model}', allowed models: {allowed}")]
    UnknownModel { model: String, allowed: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
