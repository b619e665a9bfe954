//! Terminal rendering of workflow events, history and the spinner.

use std::io::Write;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use parley_types::conversation::ConversationContext;
use parley_types::event::{ConversationEvent, SummaryEvent};
use parley_types::llm::MessageRole;

/// A cyan spinner on stderr with `msg`.
pub fn spinner(msg: &str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(spinner)
}

/// Apply one conversation event to the terminal.
///
/// Reply text goes to stdout; notices go to stderr so piping the output
/// captures only what the model wrote.
pub fn conversation_event(event: &ConversationEvent, spinner: &ProgressBar) {
    match event {
        ConversationEvent::Advisory { message } => {
            spinner.suspend(|| eprintln!("  {} {message}", style("!").yellow().bold()));
        }
        ConversationEvent::Partial { text, .. } => {
            spinner.suspend(|| print!("{text}"));
        }
        ConversationEvent::Continuing { iteration } => {
            spinner.set_message(format!("Conversation continuing ({iteration})..."));
        }
        ConversationEvent::Completed { text, notice } => {
            spinner.finish_and_clear();
            println!("{text}");
            eprintln!("{}", style(notice).dim());
        }
        ConversationEvent::LoopExceeded { .. } | ConversationEvent::Cancelled => {
            spinner.finish_and_clear();
            eprintln!("{}", style(notice(event).unwrap_or_default()).yellow());
        }
        // The error itself is returned to main and printed there.
        ConversationEvent::Failed { .. } => spinner.finish_and_clear(),
    }
}

/// Write `event` as one JSON line. `--json` output for every command goes
/// to stdout through here.
pub fn write_json_event<T: Serialize>(out: &mut impl Write, event: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)?;
    Ok(())
}

/// Notice text for events that end a conversation without a reply.
pub fn notice(event: &ConversationEvent) -> Option<String> {
    match event {
        ConversationEvent::LoopExceeded { iterations } => Some(format!(
            "Loop count exceeded {iterations}.\nConversation stopped."
        )),
        ConversationEvent::Cancelled => Some("Conversation cancelled.".to_string()),
        _ => None,
    }
}

/// Apply one summarization event to the terminal.
pub fn summary_event(event: &SummaryEvent, spinner: &ProgressBar) {
    match summary_progress(event) {
        Some(message) => spinner.set_message(message),
        None => {
            if let SummaryEvent::Advisory { message } = event {
                spinner.suspend(|| eprintln!("  {} {message}", style("!").yellow().bold()));
            }
        }
    }
}

/// Spinner message for a summarization progress event.
pub fn summary_progress(event: &SummaryEvent) -> Option<String> {
    match event {
        SummaryEvent::Document { url } => Some(format!("Fetching {url}...")),
        SummaryEvent::Chunk { url, index, total } => {
            Some(format!("Summarizing {url} ({}/{total})...", index + 1))
        }
        SummaryEvent::Advisory { .. } => None,
    }
}

/// `Q:`/`A:` blocks for every stored turn, oldest first.
pub fn history(context: &ConversationContext) -> String {
    let mut out = String::new();
    for turn in context.turns() {
        for message in turn.messages() {
            let label = match message.role {
                MessageRole::User => "Q",
                MessageRole::Assistant => "A",
                MessageRole::System => continue,
            };
            out.push_str(&format!("\n{label}:{}\n", message.content));
        }
    }
    out
}
