//! CompletionService trait definition.
//!
//! The single primitive both workflows are built on: send a model name,
//! a message list and generation options, get back generated text plus a
//! termination reason.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for chat-completion service backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The
/// returned future must be `Send` so workflows can run on background tasks.
///
/// Implementations live in parley-infra (e.g., `OpenAiCompatibleProvider`).
pub trait CompletionService: Send + Sync {
    /// Human-readable service name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
