//! Plain conversation template.

use parley_types::conversation::Turn;
use parley_types::llm::Message;

use super::{PromptSettings, flatten_turns};

/// Persona, reply language, token ceiling, and the "I don't know" escape hatch.
pub fn conversation_system_prompt(settings: &PromptSettings) -> String {
    format!(
        "You are a programming specialist assisting a programmer. \
         Respond in {}, concisely, within {} tokens. \
         If unsure, reply 'I don't know'.",
        settings.language, settings.max_tokens
    )
}

/// System message, then the flattened prior turns, then the new user message.
pub fn conversation_messages(
    settings: &PromptSettings,
    prior: &[Turn],
    user_message: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(prior.len() * 2 + 2);
    messages.push(Message::system(conversation_system_prompt(settings)));
    messages.extend(flatten_turns(prior));
    messages.push(Message::user(user_message));
    messages
}
