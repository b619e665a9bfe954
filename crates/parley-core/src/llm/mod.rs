//! Chat-completion service abstractions for Parley.
//!
//! - `CompletionService`: RPITIT trait for concrete service clients
//! - `BoxCompletionService`: object-safe wrapper for dynamic dispatch
//! - `TokenBudgetEstimator`: token counting and budget-driven model selection

pub mod box_provider;
pub mod provider;
pub mod token_budget;
