//! `parley summarize`.

use anyhow::Context;
use tokio::sync::mpsc;

use parley_types::error::SummarizationError;
use parley_types::event::SummaryEvent;

use super::chat::cancel_on_ctrl_c;
use super::render;
use crate::state::AppState;

/// What to summarize.
pub enum SummaryInput {
    /// Free text; URLs are extracted through the model first.
    Text(String),
    /// URLs given directly.
    Urls(Vec<String>),
}

/// Summarize on a background task, rendering progress until it finishes.
pub async fn run(state: &AppState, input: SummaryInput, json: bool) -> anyhow::Result<()> {
    let cancel = cancel_on_ctrl_c();
    let (tx, mut rx) = mpsc::unbounded_channel::<SummaryEvent>();
    let pipeline = state
        .summarization_pipeline()?
        .with_events(tx)
        .with_cancellation(cancel.clone());

    let worker = tokio::spawn(async move {
        match input {
            SummaryInput::Text(text) => pipeline.summarize_text(&text).await,
            SummaryInput::Urls(urls) => pipeline.summarize(&urls).await,
        }
    });

    let spinner = if json {
        None
    } else {
        Some(render::spinner("Please wait. AI is thinking...")?)
    };
    while let Some(event) = rx.recv().await {
        match &spinner {
            Some(spinner) => render::summary_event(&event, spinner),
            None => render::write_json_event(&mut std::io::stdout(), &event)?,
        }
    }
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    let result = worker.await.context("summarization task panicked")?;
    cancel.cancel();
    match result {
        Ok(text) if json => {
            println!("{}", serde_json::json!({ "summary": text }));
            Ok(())
        }
        Ok(text) => {
            println!("{}", text.trim_start());
            Ok(())
        }
        Err(SummarizationError::Cancelled) => {
            eprintln!("{}", console::style("Summarization cancelled.").yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
