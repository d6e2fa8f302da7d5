use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),
    #[error("Generation service error: {0}")]
    GenerationService(String),
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Authorization error: {0}")]
    Auth(String),
}
