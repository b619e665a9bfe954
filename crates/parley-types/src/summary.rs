//! Summarization result types.

use serde::{Deserialize, Serialize};

/// Title and extracted plain text of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub text: String,
}

/// The summary of one successfully processed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub url: String,
    pub summary: String,
}
