//! URL summarization: normalization and chunking, the chunk fold, and
//! rendering of the per-URL results.

pub mod chunker;
pub mod pipeline;
pub mod render;

pub use pipeline::SummarizationPipeline;
pub use render::render_summaries;
