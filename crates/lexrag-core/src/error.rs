use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Page-text collaborator failed for a source file.
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    /// Embedding model failed to encode a batch.
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Dimension mismatch or backend I/O failure in the vector index.
    #[error("Index error: {0}")]
    Index(String),

    /// Transport, auth or rate-limit failure of the language model.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
