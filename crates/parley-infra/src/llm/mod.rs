//! Completion service and tokenizer adapters.

pub mod openai;
pub mod tokenizer;
