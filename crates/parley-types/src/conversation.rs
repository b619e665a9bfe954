//! Conversation history types.
//!
//! A [`Turn`] pairs one user message with the assistant reply it produced.
//! The persisted [`ConversationContext`] document is a single `context`
//! field holding the turn sequence, oldest first:
//!
//! ```json
//! { "context": [ [ {"role": "user", ...}, {"role": "assistant", ...} ], ... ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::llm::{Message, StopReason};

/// One user message paired with its assistant reply.
///
/// Serialized as a two-element array `[user, assistant]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Message, Message)", into = "(Message, Message)")]
pub struct Turn {
    pub user: Message,
    pub assistant: Message,
}

impl Turn {
    pub fn new(user_content: impl Into<String>, assistant_content: impl Into<String>) -> Self {
        Self {
            user: Message::user(user_content),
            assistant: Message::assistant(assistant_content),
        }
    }

    /// The turn as the message pair sent back to the service.
    pub fn messages(&self) -> [Message; 2] {
        [self.user.clone(), self.assistant.clone()]
    }
}

impl From<(Message, Message)> for Turn {
    fn from((user, assistant): (Message, Message)) -> Self {
        Self { user, assistant }
    }
}

impl From<Turn> for (Message, Message) {
    fn from(turn: Turn) -> Self {
        (turn.user, turn.assistant)
    }
}

/// The persisted conversation history, newest turn last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    pub context: Vec<Turn>,
}

impl ConversationContext {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { context: turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.context.len()
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }

    /// Append a turn, then evict the oldest turns until at most `cap` remain.
    pub fn push_capped(&mut self, turn: Turn, cap: usize) {
        self.context.push(turn);
        if self.context.len() > cap {
            let excess = self.context.len() - cap;
            self.context.drain(..excess);
        }
    }

    /// The last `size` turns, used to seed a new request.
    pub fn window(&self, size: usize) -> &[Turn] {
        let start = self.context.len().saturating_sub(size);
        &self.context[start..]
    }
}

/// Per-session mutable state.
///
/// Created when a session starts, updated every turn, discarded with the
/// session object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Identifier of the host view receiving this session's output.
    pub window: Option<String>,
    /// Selects the code-review message template instead of plain conversation.
    pub code_review: bool,
    /// Termination reason of the most recent completion.
    pub last_stop_reason: Option<StopReason>,
}
