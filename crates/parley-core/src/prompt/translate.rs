//! Translate-to-pivot-language template.

use parley_types::llm::Message;

use super::PromptSettings;

/// A system+user pair asking for a translation into the pivot language.
///
/// Empty when the configured language already is the pivot language.
pub fn translate_messages(settings: &PromptSettings, text: &str) -> Vec<Message> {
    if settings.language == settings.pivot_language {
        return Vec::new();
    }
    vec![
        Message::system(format!(
            "Translate the following from {} to {}:",
            settings.language, settings.pivot_language
        )),
        Message::user(text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::MessageRole;

    #[test]
    fn test_same_language_yields_nothing() {
        let settings = PromptSettings {
            language: "English".to_string(),
            pivot_language: "English".to_string(),
            max_tokens: 500,
        };
        assert!(translate_messages(&settings, "hello").is_empty());
    }

    #[test]
    fn test_pair_names_both_languages() {
        let settings = PromptSettings {
            language: "Japanese".to_string(),
            pivot_language: "English".to_string(),
            max_tokens: 500,
        };
        let messages = translate_messages(&settings, "こんにちは");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "Translate the following from Japanese to English:");
        assert_eq!(messages[1], Message::user("こんにちは"));
    }
}
