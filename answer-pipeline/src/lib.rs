pub mod cache;
pub mod context;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod scoring;

use common::storage::types::knowledge_entry::KnowledgeEntry;

pub use cache::EmbeddingCache;
pub use generation::AnswerGenerator;
pub use pipeline::{AnswerConfig, AnswerOutcome, AnswerPipeline};

// A corpus entry together with its cosine similarity against the query.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: KnowledgeEntry,
    pub score: f32,
}
