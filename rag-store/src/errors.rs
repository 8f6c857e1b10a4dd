//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors (index file).
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// PDF could not be read or decoded.
    #[error("pdf error in {path}: {reason}")]
    Pdf { path: String, reason: String },

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Chunk size/overlap rejected by the splitter.
    #[error("chunking error: {0}")]
    Chunking(#[from] text_splitter::ChunkConfigError),

    /// No PDF pages with text were found under the data directory.
    #[error("No documents found to build the vector store.")]
    NoDocuments,

    /// The persisted index does not exist yet.
    #[error("vector index not found at {0}")]
    IndexMissing(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding backend failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] ai_llm_service::AiLlmError),
}
