//! Progress events emitted by the background workflows.
//!
//! Workflows never touch the host's view directly. They send these events
//! over a channel and the host applies them on its own event loop.

use serde::{Deserialize, Serialize};

/// Events emitted while a conversation runs through the continuation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// The request was retargeted to a larger-budget model.
    Advisory { message: String },

    /// A truncated reply; `iteration` counts continuations so far (0-based).
    Partial { text: String, iteration: u32 },

    /// The loop is about to ask the model to pick up where it stopped.
    Continuing { iteration: u32 },

    /// The final reply of the conversation.
    Completed { text: String, notice: String },

    /// The continuation cap was exceeded without a natural stop.
    LoopExceeded { iterations: u32 },

    /// A turn failed; the loop stopped without persisting it.
    Failed { message: String },

    /// The caller cancelled the loop.
    Cancelled,
}

/// Events emitted while the summarization pipeline works through its URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryEvent {
    /// Starting work on a URL.
    Document { url: String },

    /// Folding chunk `index` (0-based) of `total` for `url`.
    Chunk { url: String, index: usize, total: usize },

    /// A request was retargeted to a larger-budget model.
    Advisory { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_event_serde_tag() {
        let event = ConversationEvent::Continuing { iteration: 2 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "continuing");
        assert_eq!(json["iteration"], 2);
    }

    #[test]
    fn test_summary_event_serde_tag() {
        let event = SummaryEvent::Chunk {
            url: "https://example.com".to_string(),
            index: 0,
            total: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: SummaryEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
