//! Shared domain types for Parley.
//!
//! This crate contains the data shapes used across the Parley workspace:
//! completion requests and responses, conversation turns and the persisted
//! context document, session state, progress events, configuration, and
//! the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod llm;
pub mod summary;
