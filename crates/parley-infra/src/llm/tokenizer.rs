//! BPE token counting via tiktoken.

use tiktoken_rs::CoreBPE;

use parley_core::llm::token_budget::{HeuristicTokenCounter, TokenCounter};
use parley_types::llm::Message;

/// Tokens added per message for role and framing.
const TOKENS_PER_MESSAGE: u32 = 4;
/// Tokens that prime the assistant reply.
const REPLY_PRIMER_TOKENS: u32 = 3;

/// Counts tokens with the model's BPE, or the character heuristic when the
/// model has no known encoding.
pub struct TiktokenCounter {
    bpe: Option<CoreBPE>,
    fallback: HeuristicTokenCounter,
}

impl TiktokenCounter {
    pub fn for_model(model: &str) -> Self {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(model, error = %e, "No tokenizer for model, using character estimate");
                None
            }
        };
        Self {
            bpe,
            fallback: HeuristicTokenCounter::default(),
        }
    }

    /// Whether counts come from a real tokenizer.
    pub fn is_exact(&self) -> bool {
        self.bpe.is_some()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_text(&self, text: &str) -> u32 {
        match &self.bpe {
            Some(bpe) => u32::try_from(bpe.encode_with_special_tokens(text).len()).unwrap_or(u32::MAX),
            None => self.fallback.count_text(text),
        }
    }

    fn count_messages(&self, messages: &[Message]) -> u32 {
        messages
            .iter()
            .map(|m| TOKENS_PER_MESSAGE.saturating_add(self.count_text(&m.content)))
            .fold(REPLY_PRIMER_TOKENS, u32::saturating_add)
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("exact", &self.is_exact())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_counts_exactly() {
        let counter = TiktokenCounter::for_model("gpt-3.5-turbo");
        assert!(counter.is_exact());
        assert_eq!(counter.count_text(""), 0);
        let n = counter.count_text("hello world");
        assert!((1..=3).contains(&n));
    }

    #[test]
    fn test_unknown_model_falls_back() {
        let counter = TiktokenCounter::for_model("definitely-not-a-model");
        assert!(!counter.is_exact());
        assert_eq!(counter.count_text("abcdefgh"), 2);
    }

    #[test]
    fn test_message_overhead() {
        let counter = TiktokenCounter::for_model("definitely-not-a-model");
        let messages = vec![Message::user("abcd"), Message::assistant("abcd")];
        assert_eq!(counter.count_messages(&messages), 3 + 2 * (4 + 1));
    }
}
