//! Business logic and port trait definitions for Parley.
//!
//! This crate defines the "ports" (service and storage traits) that the
//! infrastructure layer implements, plus the two workflows built on them:
//! the conversation continuation loop and the URL summarization pipeline.
//! It depends only on `parley-types` -- never on `parley-infra` or any
//! network/filesystem crate.

pub mod chat;
pub mod context;
pub mod fetch;
pub mod llm;
pub mod prompt;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;
