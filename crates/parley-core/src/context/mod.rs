//! Persistence ports for conversation history and the prompt log.
//!
//! Defined in parley-core so workflows can persist turns without depending
//! on any storage implementation. The file-backed adapters live in
//! parley-infra.

use chrono::{DateTime, Local};

use parley_types::conversation::{ConversationContext, Turn};
use parley_types::error::StoreError;
use parley_types::llm::{Message, MessageRole};

/// Bounded, append-only conversation history.
///
/// Implementations must reload the persisted state on every `load` (no
/// caching across turns), keep at most the configured number of turns
/// (oldest evicted first), and replace the persisted document atomically
/// so readers never observe a partial write.
pub trait ContextStore: Send + Sync {
    /// Read the persisted history. Absent or unreadable storage yields an
    /// empty context instead of an error.
    fn load(&self) -> impl std::future::Future<Output = ConversationContext> + Send;

    /// Append a turn, truncate to the configured cap, persist.
    fn append(
        &self,
        turn: Turn,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Reset to an empty history.
    fn clear(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Append-only, human-readable transcript of every completed exchange.
pub trait PromptLog: Send + Sync {
    fn append(
        &self,
        record: &PromptRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// The whole log as text.
    fn read(&self) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;

    fn clear(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// One transcript block of the prompt log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub timestamp: DateTime<Local>,
    pub system: String,
    pub user: String,
    pub assistant: String,
}

impl PromptRecord {
    /// Summarize an exchange: the last system message, every user message
    /// joined by newlines, and the reply.
    pub fn from_exchange(timestamp: DateTime<Local>, messages: &[Message], reply: &str) -> Self {
        let system = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let user = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            timestamp,
            system,
            user,
            assistant: reply.to_string(),
        }
    }

    /// Render the block: a timestamp header, then `[System]`, `[User]` and
    /// `[Assistant]` sections, each only when non-empty.
    pub fn render(&self) -> String {
        let mut out = format!("=={}==\n", self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"));
        for (label, body) in [
            ("System", &self.system),
            ("User", &self.user),
            ("Assistant", &self.assistant),
        ] {
            if !body.is_empty() {
                out.push_str(&format!("[{label}]\n{body}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_from_exchange_collects_sections() {
        let messages = vec![
            Message::system("persona"),
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ];
        let record = PromptRecord::from_exchange(timestamp(), &messages, "answer");
        assert_eq!(record.system, "persona");
        assert_eq!(record.user, "first\nsecond");
        assert_eq!(record.assistant, "answer");
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let record = PromptRecord {
            timestamp: timestamp(),
            system: String::new(),
            user: "question".to_string(),
            assistant: "answer".to_string(),
        };
        let text = record.render();
        assert!(text.starts_with("==2024-05-01 12:30:00"));
        assert!(!text.contains("[System]"));
        assert!(text.contains("[User]\nquestion\n"));
        assert!(text.ends_with("[Assistant]\nanswer\n"));
    }
}
