//! Runtime configuration for ingestion and retrieval.

use std::path::PathBuf;

use crate::errors::RagError;

/// Index file name inside the persist directory.
pub const INDEX_FILE: &str = "index.json";

/// Configuration for RAG ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Directory scanned for `*.pdf` files.
    pub data_dir: PathBuf,
    /// Directory holding the persisted vector index.
    pub persist_dir: PathBuf,
    /// Max characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Texts per embeddings request during ingestion.
    pub embed_batch: usize,
}

impl RagConfig {
    /// Defaults: `data/`, `vector_db/`, 1000/200 chunking.
    pub fn new_default(data_dir: impl Into<PathBuf>, persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            persist_dir: persist_dir.into(),
            chunk_size: 1000,
            chunk_overlap: 200,
            embed_batch: 32,
        }
    }

    /// Path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.persist_dir.join(INDEX_FILE)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(
                "chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        if self.embed_batch == 0 {
            return Err(RagError::Config("embed_batch must be > 0".into()));
        }
        if self.persist_dir.as_os_str().is_empty() {
            return Err(RagError::Config("persist_dir is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(RagConfig::new_default("data", "vector_db").validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut cfg = RagConfig::new_default("data", "vector_db");
        cfg.chunk_overlap = cfg.chunk_size;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn index_lives_under_persist_dir() {
        let cfg = RagConfig::new_default("data", "db");
        assert_eq!(cfg.index_path(), PathBuf::from("db").join(INDEX_FILE));
    }
}
