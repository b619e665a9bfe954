//! Conversation workflow: translation, single turns and the continuation
//! loop that drives them.

pub mod continuation;
pub mod session;
pub mod translate;

pub use continuation::{ContinuationController, ContinuationOutcome, ContinuationState};
pub use session::{ConversationSession, TurnOutcome};
pub use translate::Translator;
