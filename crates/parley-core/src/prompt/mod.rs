//! Message templates for every workflow.
//!
//! All templates produce the same shape -- a `Vec<Message>` of role-tagged
//! messages -- and are pure functions of their inputs. None perform I/O.

pub mod code_review;
pub mod conversation;
pub mod find_urls;
pub mod summarize;
pub mod translate;

use parley_types::config::ParleyConfig;
use parley_types::conversation::Turn;
use parley_types::llm::Message;

/// Settings shared by the templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    /// Language replies are requested in.
    pub language: String,
    /// Language user input is translated into.
    pub pivot_language: String,
    /// Completion token ceiling quoted to the model.
    pub max_tokens: u32,
}

impl PromptSettings {
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self {
            language: config.language.clone(),
            pivot_language: config.pivot_language.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

/// A message-template variant with its inputs.
#[derive(Debug, Clone, Copy)]
pub enum MessageTemplate<'a> {
    /// Persona system message, prior turns, then the new user message.
    Conversation {
        prior: &'a [Turn],
        user_message: &'a str,
    },
    /// Fixed review scaffold with prior turns, ending with the code.
    CodeReview { prior: &'a [Turn], code: &'a str },
    /// Translate `text` into the pivot language.
    Translate { text: &'a str },
    /// Fold one chunk of a document into the running summary.
    Summarize {
        title: &'a str,
        prior_summary: &'a str,
        chunk: &'a str,
    },
}

impl MessageTemplate<'_> {
    pub fn build(&self, settings: &PromptSettings) -> Vec<Message> {
        match *self {
            MessageTemplate::Conversation {
                prior,
                user_message,
            } => conversation::conversation_messages(settings, prior, user_message),
            MessageTemplate::CodeReview { prior, code } => {
                code_review::code_review_messages(settings, prior, code)
            }
            MessageTemplate::Translate { text } => translate::translate_messages(settings, text),
            MessageTemplate::Summarize {
                title,
                prior_summary,
                chunk,
            } => summarize::summarize_messages(settings, title, prior_summary, chunk),
        }
    }
}

/// Flatten turns into `user, assistant, user, assistant, ...`.
pub fn flatten_turns(turns: &[Turn]) -> impl Iterator<Item = Message> + '_ {
    turns.iter().flat_map(Turn::messages)
}
