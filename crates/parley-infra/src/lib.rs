//! Infrastructure layer for Parley.
//!
//! Implements the ports defined in `parley-core`: the JSON context store,
//! the prompt log file, the OpenAI-compatible completion client, the HTTP
//! document fetcher and the BPE token counter. Also loads configuration and
//! resolves the data directory.

pub mod config;
pub mod context_store;
pub mod fetch;
pub mod filesystem;
pub mod llm;
pub mod prompt_log;
