//! Chat-completion request/response types for Parley.
//!
//! These types model the data shapes exchanged with a chat-completion
//! service: role-tagged messages, generation options, optional
//! function-call fields, termination reasons, and provider errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a chat-completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A callable function advertised to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the function arguments.
    pub parameters: serde_json::Value,
}

/// How the service may use the advertised functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionCallMode {
    Auto,
    None,
}

/// A function invocation returned by the completion service.
///
/// `arguments` is the raw JSON text produced by the model; callers decode
/// it into their own typed argument struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Request to a chat-completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallMode>,
}

/// Response from a chat-completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub usage: Usage,
}

/// Why the service stopped generating.
///
/// Only [`StopReason::Stop`] means the reply finished naturally; every other
/// reason is treated as a truncation by the continuation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Stop,
    Length,
    FunctionCall,
    ContentFilter,
    /// A reason this client does not recognize, kept verbatim.
    Other(String),
}

impl StopReason {
    /// Whether the completion terminated naturally.
    pub fn is_complete(&self) -> bool {
        matches!(self, StopReason::Stop)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Stop => write!(f, "stop"),
            StopReason::Length => write!(f, "length"),
            StopReason::FunctionCall => write!(f, "function_call"),
            StopReason::ContentFilter => write!(f, "content_filter"),
            StopReason::Other(reason) => write!(f, "{reason}"),
        }
    }
}

impl FromStr for StopReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "stop" => StopReason::Stop,
            "length" => StopReason::Length,
            "function_call" | "tool_calls" => StopReason::FunctionCall,
            "content_filter" => StopReason::ContentFilter,
            other => StopReason::Other(other.to_string()),
        })
    }
}

/// Token usage reported for a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from chat-completion service calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("response contained no choices")]
    MissingContent,

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_serializes_as_role_content() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_stop_reason_parse() {
        assert_eq!("stop".parse::<StopReason>().unwrap(), StopReason::Stop);
        assert_eq!("length".parse::<StopReason>().unwrap(), StopReason::Length);
        assert_eq!(
            "tool_calls".parse::<StopReason>().unwrap(),
            StopReason::FunctionCall
        );
        assert_eq!(
            "weird".parse::<StopReason>().unwrap(),
            StopReason::Other("weird".to_string())
        );
    }

    #[test]
    fn test_only_stop_is_complete() {
        assert!(StopReason::Stop.is_complete());
        assert!(!StopReason::Length.is_complete());
        assert!(!StopReason::ContentFilter.is_complete());
        assert!(!StopReason::Other("x".into()).is_complete());
    }

    #[test]
    fn test_request_omits_empty_function_fields() {
        let request = CompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![Message::user("hello")],
            max_tokens: 100,
            temperature: Some(0.0),
            functions: Vec::new(),
            function_call: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("functions").is_none());
        assert!(json.get("function_call").is_none());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
