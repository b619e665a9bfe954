//! Continuation loop for truncated replies.
//!
//! ```text
//!   Sending ──stop──────────────► Done
//!      │
//!      └─truncated──► Continuing ──stop──► Done
//!                        │  ▲
//!                        └──┘ truncated (i <= W)
//!
//!   any turn error / cancel / i > W ──► Aborted
//! ```

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use parley_types::error::ConversationError;
use parley_types::event::ConversationEvent;

use super::session::ConversationSession;
use crate::context::{ContextStore, PromptLog};

/// Sent in place of a user message when the previous reply was cut short.
pub const CONTINUE_DIRECTIVE: &str = "Please continue from where it left off.";

pub const CONVERSATION_FINISHED: &str = "Conversation finished.";
pub const CODE_REVIEW_FINISHED: &str = "Code review done and conversation history cleared.";

/// Where the loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationState {
    Sending,
    Continuing { iteration: u32 },
    Done,
    Aborted,
}

impl ContinuationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContinuationState::Done | ContinuationState::Aborted)
    }
}

/// How a loop that did not fail came to an end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationOutcome {
    /// The model signalled a natural stop.
    Completed { text: String, turns: u32 },
    /// The model kept truncating past the continuation cap.
    LoopExceeded { turns: u32 },
}

/// Drives a [`ConversationSession`] until the reply completes, a turn
/// fails, the cap is exceeded or the caller cancels.
pub struct ContinuationController<'a, S, L> {
    session: &'a mut ConversationSession<S, L>,
    events: mpsc::UnboundedSender<ConversationEvent>,
    cancel: CancellationToken,
    max_continuations: u32,
    state: ContinuationState,
}

impl<'a, S: ContextStore, L: PromptLog> ContinuationController<'a, S, L> {
    /// The continuation cap is the session's prior-window size `W`.
    pub fn new(
        session: &'a mut ConversationSession<S, L>,
        events: mpsc::UnboundedSender<ConversationEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let max_continuations = u32::try_from(session.prior_window()).unwrap_or(u32::MAX);
        Self {
            session,
            events,
            cancel,
            max_continuations,
            state: ContinuationState::Sending,
        }
    }

    pub fn state(&self) -> ContinuationState {
        self.state
    }

    /// Run the loop from `message`. At most `W + 1` turns are issued.
    #[instrument(skip(self, message), fields(session_id = %self.session.id(), max_continuations = self.max_continuations))]
    pub async fn run(&mut self, message: &str) -> Result<ContinuationOutcome, ConversationError> {
        self.state = ContinuationState::Sending;
        let mut next = message.to_string();
        let mut iteration: u32 = 0;
        let mut turns: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.abort_cancelled());
            }

            // Only the in-flight requests race the token; a reply that has
            // arrived is committed and reported.
            let result = self
                .session
                .run_turn_until_cancelled(&next, &self.cancel)
                .await;
            turns += 1;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(ConversationError::Cancelled) => return Err(self.abort_cancelled()),
                Err(e) => {
                    warn!(error = %e, turns, "Conversation turn failed");
                    self.state = ContinuationState::Aborted;
                    self.emit(ConversationEvent::Failed {
                        message: describe(&e),
                    });
                    return Err(e);
                }
            };

            if let Some(message) = outcome.advisory.clone() {
                self.emit(ConversationEvent::Advisory { message });
            }

            if outcome.is_complete() {
                return self.finish(outcome.text, turns).await;
            }

            debug!(iteration, stop_reason = %outcome.stop_reason, "Reply truncated");
            self.emit(ConversationEvent::Partial {
                text: outcome.text,
                iteration,
            });
            iteration += 1;

            if iteration > self.max_continuations {
                info!(turns, "Continuation cap exceeded");
                self.state = ContinuationState::Aborted;
                self.emit(ConversationEvent::LoopExceeded { iterations: turns });
                return Ok(ContinuationOutcome::LoopExceeded { turns });
            }

            self.state = ContinuationState::Continuing { iteration };
            self.emit(ConversationEvent::Continuing { iteration });
            next = CONTINUE_DIRECTIVE.to_string();
        }
    }

    async fn finish(
        &mut self,
        text: String,
        turns: u32,
    ) -> Result<ContinuationOutcome, ConversationError> {
        let notice = if self.session.is_code_review() {
            if let Err(e) = self.session.finish_code_review().await {
                self.state = ContinuationState::Aborted;
                self.emit(ConversationEvent::Failed {
                    message: describe(&e),
                });
                return Err(e);
            }
            CODE_REVIEW_FINISHED
        } else {
            CONVERSATION_FINISHED
        };

        self.state = ContinuationState::Done;
        self.emit(ConversationEvent::Completed {
            text: text.clone(),
            notice: notice.to_string(),
        });
        info!(turns, "Conversation completed");
        Ok(ContinuationOutcome::Completed { text, turns })
    }

    fn abort_cancelled(&mut self) -> ConversationError {
        info!("Conversation cancelled");
        self.state = ContinuationState::Aborted;
        self.emit(ConversationEvent::Cancelled);
        ConversationError::Cancelled
    }

    fn emit(&self, event: ConversationEvent) {
        // A closed receiver means the host stopped listening.
        let _ = self.events.send(event);
    }
}

/// `err` followed by its causes, `: `-separated.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::llm::box_provider::BoxCompletionService;
    use crate::llm::token_budget::{HeuristicTokenCounter, TokenBudgetEstimator};
    use crate::llm::provider::CompletionService;
    use crate::testing::{
        MemoryContextStore, MemoryPromptLog, ScriptedCompletionService, StalledCompletionService,
    };
    use parley_types::config::ParleyConfig;
    use parley_types::conversation::Turn;
    use parley_types::llm::LlmError;

    type Session = ConversationSession<MemoryContextStore, MemoryPromptLog>;

    fn setup(window: usize) -> (Session, ScriptedCompletionService, Arc<MemoryContextStore>) {
        let scripted = ScriptedCompletionService::new();
        let (session, store) = session_with(window, scripted.clone(), MemoryPromptLog::new());
        (session, scripted, store)
    }

    fn session_with(
        window: usize,
        service: impl CompletionService + 'static,
        log: MemoryPromptLog,
    ) -> (Session, Arc<MemoryContextStore>) {
        let config = ParleyConfig {
            prior_conversation_size: window,
            ..ParleyConfig::default()
        };
        let store = Arc::new(MemoryContextStore::new(config.context_history_size));
        let estimator =
            TokenBudgetEstimator::from_config(&config, Arc::new(HeuristicTokenCounter::default()));
        let session = ConversationSession::new(
            &config,
            Arc::new(BoxCompletionService::new(service)),
            store.clone(),
            Arc::new(log),
            estimator,
        );
        (session, store)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_stop_on_first_turn_completes_in_one() {
        let (mut session, scripted, _) = setup(6);
        scripted.push_text("done");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, CancellationToken::new());
        let outcome = controller.run("hi").await.unwrap();

        assert_eq!(
            outcome,
            ContinuationOutcome::Completed {
                text: "done".to_string(),
                turns: 1
            }
        );
        assert_eq!(controller.state(), ContinuationState::Done);
        assert_eq!(scripted.requests().len(), 1);
        assert_eq!(
            drain(&mut rx),
            vec![ConversationEvent::Completed {
                text: "done".to_string(),
                notice: CONVERSATION_FINISHED.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_truncation_sends_continue_directive() {
        let (mut session, scripted, store) = setup(6);
        scripted.push_truncated("part one");
        scripted.push_text("part two");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, CancellationToken::new());
        let outcome = controller.run("tell me a story").await.unwrap();

        assert!(matches!(outcome, ContinuationOutcome::Completed { turns: 2, .. }));
        let requests = scripted.requests();
        assert_eq!(
            requests[1].messages.last().unwrap().content,
            CONTINUE_DIRECTIVE
        );
        assert_eq!(
            store.snapshot().turns(),
            &[
                Turn::new("tell me a story", "part one"),
                Turn::new(CONTINUE_DIRECTIVE, "part two"),
            ]
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                ConversationEvent::Partial {
                    text: "part one".to_string(),
                    iteration: 0
                },
                ConversationEvent::Continuing { iteration: 1 },
                ConversationEvent::Completed {
                    text: "part two".to_string(),
                    notice: CONVERSATION_FINISHED.to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_never_stopping_is_bounded_by_window_plus_one() {
        for window in [0usize, 1, 3] {
            let (mut session, scripted, _) = setup(window);
            for _ in 0..10 {
                scripted.push_truncated("more");
            }
            let (tx, mut rx) = mpsc::unbounded_channel();

            let mut controller =
                ContinuationController::new(&mut session, tx, CancellationToken::new());
            let outcome = controller.run("go").await.unwrap();

            let expected = window as u32 + 1;
            assert_eq!(outcome, ContinuationOutcome::LoopExceeded { turns: expected });
            assert_eq!(controller.state(), ContinuationState::Aborted);
            assert_eq!(scripted.requests().len(), expected as usize);
            assert_eq!(
                drain(&mut rx).last(),
                Some(&ConversationEvent::LoopExceeded {
                    iterations: expected
                })
            );
        }
    }

    #[tokio::test]
    async fn test_failure_aborts_and_reports() {
        let (mut session, scripted, store) = setup(6);
        scripted.push_truncated("partial");
        scripted.push_error(LlmError::AuthenticationFailed);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, CancellationToken::new());
        let err = controller.run("hi").await.unwrap_err();

        assert!(matches!(
            err,
            ConversationError::Completion(LlmError::AuthenticationFailed)
        ));
        assert_eq!(controller.state(), ContinuationState::Aborted);
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(
            drain(&mut rx).last(),
            Some(&ConversationEvent::Failed {
                message: "completion failed: authentication failed".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_code_review_completion_clears_context() {
        let (mut session, scripted, store) = setup(6);
        scripted.push_truncated("## Score");
        scripted.push_text("## Bugs\nN/A");
        session.begin_code_review().await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, CancellationToken::new());
        controller.run("let x = 1;").await.unwrap();
        drop(controller);

        assert!(!session.is_code_review());
        assert!(store.snapshot().is_empty());
        assert_eq!(
            drain(&mut rx).last(),
            Some(&ConversationEvent::Completed {
                text: "## Bugs\nN/A".to_string(),
                notice: CODE_REVIEW_FINISHED.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let (mut session, scripted, store) = setup(6);
        scripted.push_text("unused");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, cancel);
        let err = controller.run("hi").await.unwrap_err();

        assert!(matches!(err, ConversationError::Cancelled));
        assert!(scripted.requests().is_empty());
        assert!(store.snapshot().is_empty());
        assert_eq!(drain(&mut rx), vec![ConversationEvent::Cancelled]);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_not_an_error() {
        let (mut session, scripted, _) = setup(6);
        scripted.push_text("done");
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let mut controller = ContinuationController::new(&mut session, tx, CancellationToken::new());
        assert!(controller.run("hi").await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_persists_nothing() {
        let (mut session, store) =
            session_with(6, StalledCompletionService, MemoryPromptLog::new());
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let mut controller = ContinuationController::new(&mut session, tx, cancel);
        let err = controller.run("hi").await.unwrap_err();

        assert!(matches!(err, ConversationError::Cancelled));
        assert_eq!(controller.state(), ContinuationState::Aborted);
        assert!(store.snapshot().is_empty());
        assert_eq!(drain(&mut rx), vec![ConversationEvent::Cancelled]);
    }

    #[tokio::test]
    async fn test_cancel_after_reply_arrived_still_reports_it() {
        let cancel = CancellationToken::new();
        let scripted = ScriptedCompletionService::new();
        scripted.push_text("done");
        let (mut session, store) =
            session_with(6, scripted, MemoryPromptLog::cancelling(cancel.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, cancel.clone());
        let outcome = controller.run("hi").await.unwrap();

        assert!(cancel.is_cancelled());
        assert!(matches!(outcome, ContinuationOutcome::Completed { turns: 1, .. }));
        assert_eq!(store.snapshot().turns(), &[Turn::new("hi", "done")]);
        assert_eq!(
            drain(&mut rx),
            vec![ConversationEvent::Completed {
                text: "done".to_string(),
                notice: CONVERSATION_FINISHED.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_cancel_after_partial_stops_before_next_turn() {
        let cancel = CancellationToken::new();
        let scripted = ScriptedCompletionService::new();
        scripted.push_truncated("part one");
        scripted.push_text("never sent");
        let (mut session, store) =
            session_with(6, scripted.clone(), MemoryPromptLog::cancelling(cancel.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut controller = ContinuationController::new(&mut session, tx, cancel);
        let err = controller.run("story").await.unwrap_err();

        assert!(matches!(err, ConversationError::Cancelled));
        assert_eq!(scripted.requests().len(), 1);
        assert_eq!(store.snapshot().turns(), &[Turn::new("story", "part one")]);
        assert_eq!(
            drain(&mut rx),
            vec![
                ConversationEvent::Partial {
                    text: "part one".to_string(),
                    iteration: 0
                },
                ConversationEvent::Continuing { iteration: 1 },
                ConversationEvent::Cancelled,
            ]
        );
    }
}
