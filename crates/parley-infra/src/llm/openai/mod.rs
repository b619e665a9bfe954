//! OpenAiCompatibleProvider -- [`CompletionService`] for any endpoint that
//! speaks the OpenAI Chat Completions API.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::CompletionService;
use parley_types::llm::{
    CompletionRequest, CompletionResponse, FunctionCall, LlmError, StopReason, Usage,
};

use self::types::{ChatMessage, ChatRequest, ChatResponse};

/// Default base URL of the hosted API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completion client over reqwest.
///
/// Does not derive `Debug`; the key never reaches logs.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_chat_request(request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            functions: request.functions.clone(),
            function_call: request.function_call.clone(),
        }
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
fn status_error(status: u16, body: String) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited,
        400 => LlmError::InvalidRequest(body),
        _ => LlmError::Http { status, body },
    }
}

/// Decode a response body into the provider-agnostic response.
fn parse_response(body: &str) -> Result<CompletionResponse, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::MissingContent)?;

    let function_call = choice.message.function_call.map(|call| FunctionCall {
        name: call.name,
        arguments: call.arguments,
    });
    let content = match (choice.message.content, &function_call) {
        (Some(content), _) => content,
        (None, Some(_)) => String::new(),
        (None, None) => return Err(LlmError::MissingContent),
    };

    let stop_reason = match choice.finish_reason.as_deref() {
        Some(reason) => reason.parse().unwrap_or(StopReason::Stop),
        None => StopReason::Stop,
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: response.id,
        content,
        model: response.model,
        stop_reason,
        function_call,
        usage,
    })
}

impl CompletionService for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::to_chat_request(request);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| LlmError::Provider {
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), text));
        }

        let completion = parse_response(&text)?;
        tracing::debug!(
            model = %completion.model,
            stop_reason = %completion.stop_reason,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "Completion received"
        );
        Ok(completion)
    }
}
