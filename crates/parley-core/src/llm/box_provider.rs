//! BoxCompletionService -- object-safe dynamic dispatch wrapper for CompletionService.
//!
//! 1. Define an object-safe `CompletionServiceDyn` trait with boxed futures
//! 2. Blanket-impl `CompletionServiceDyn` for all `T: CompletionService`
//! 3. `BoxCompletionService` wraps `Box<dyn CompletionServiceDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use tracing::{Instrument, info_span};

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::CompletionService;

/// Object-safe version of [`CompletionService`] with boxed futures.
pub trait CompletionServiceDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;
}

impl<T: CompletionService> CompletionServiceDyn for T {
    fn name(&self) -> &str {
        CompletionService::name(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased completion service for runtime backend selection.
///
/// Since `CompletionService` uses RPITIT, it cannot be used as a trait
/// object directly. Every call made through this wrapper runs inside a
/// `gen_ai.complete` span.
pub struct BoxCompletionService {
    inner: Box<dyn CompletionServiceDyn + Send + Sync>,
}

impl BoxCompletionService {
    /// Wrap a concrete `CompletionService` in a type-erased box.
    pub fn new<T: CompletionService + 'static>(service: T) -> Self {
        Self {
            inner: Box::new(service),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a completion request and receive the full response.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.inner.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.functions = request.functions.len(),
        );

        self.inner.complete_boxed(request).instrument(span).await
    }
}

impl std::fmt::Debug for BoxCompletionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxCompletionService")
            .field("name", &self.inner.name())
            .finish()
    }
}
