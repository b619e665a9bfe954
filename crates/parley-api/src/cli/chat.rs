//! `parley chat` and `parley review`.

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use parley_core::chat::{ContinuationController, ContinuationOutcome};
use parley_types::error::ConversationError;
use parley_types::event::ConversationEvent;

use super::render;
use crate::state::AppState;

/// Run the continuation loop for `message` on a background task.
///
/// With `code_review`, the message is the code to review; the history is
/// cleared before the first turn and again once the review completes.
pub async fn run(state: &AppState, message: String, code_review: bool, json: bool) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!(ConversationError::EmptyInput);
    }

    let mut session = state.conversation_session()?;
    let cancel = cancel_on_ctrl_c();
    let (tx, mut rx) = mpsc::unbounded_channel::<ConversationEvent>();

    let worker = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if code_review {
                session.begin_code_review().await?;
            }
            let mut controller = ContinuationController::new(&mut session, tx, cancel);
            controller.run(&message).await
        }
    });

    let spinner = if json {
        None
    } else {
        let waiting = if code_review { "Reviewing..." } else { "Thinking..." };
        Some(render::spinner(waiting)?)
    };
    while let Some(event) = rx.recv().await {
        match &spinner {
            Some(spinner) => render::conversation_event(&event, spinner),
            None => render::write_json_event(&mut std::io::stdout(), &event)?,
        }
    }

    let result = worker.await.context("conversation task panicked")?;
    cancel.cancel();
    match result {
        Ok(ContinuationOutcome::Completed { .. }) | Ok(ContinuationOutcome::LoopExceeded { .. }) => Ok(()),
        // Already reported through the event stream.
        Err(ConversationError::Cancelled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// A token cancelled by the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    tracing::info!("Ctrl-C received, cancelling");
                    token.cancel();
                }
            }
        }
    });
    cancel
}
