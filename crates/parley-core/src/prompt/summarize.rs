//! Chunk-fold summarization template.

use parley_types::llm::Message;

use super::PromptSettings;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Word ceiling quoted to the model for each running summary.
pub const SUMMARY_WORD_LIMIT: u32 = 500;

/// Ask the model to fold `chunk` into `prior_summary`.
///
/// The prior summary and the chunk share one fenced body, separated by a
/// `---` line, so the model rewrites the summary instead of appending to it.
pub fn summarize_messages(
    settings: &PromptSettings,
    title: &str,
    prior_summary: &str,
    chunk: &str,
) -> Vec<Message> {
    let user_message = format!(
        "Extract key information from the following text and summarize it.\n\
         Title: {title}\n\
         Body:\n\
         ```\n\
         {prior_summary}\n\
         ---\n\
         {chunk}\n\
         ```\n\
         Output language: {language} \
         Summary length: less than {SUMMARY_WORD_LIMIT} words, \
         but useful examples are more important than the length.",
        language = settings.language,
    );

    vec![
        Message::system(SUMMARY_SYSTEM_PROMPT),
        Message::user(user_message),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::MessageRole;

    #[test]
    fn test_summarize_message_contents() {
        let settings = PromptSettings {
            language: "German".to_string(),
            pivot_language: "English".to_string(),
            max_tokens: 500,
        };
        let messages = summarize_messages(&settings, "Rust Book", "so far", "next chunk");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);

        let body = &messages[1].content;
        assert!(body.contains("Title: Rust Book"));
        assert!(body.contains("so far\n---\nnext chunk"));
        assert!(body.contains("Output language: German"));
        assert!(body.contains("less than 500 words"));
    }
}
