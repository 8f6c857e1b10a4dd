//! High-level RAG facade: PDF ingestion + retrieval over a local vector index.
//!
//! This crate provides a clean API to:
//! - Load PDFs page by page and split them into overlapping chunks
//! - Embed chunks and persist them under a directory
//! - Retrieve top‑K chunks for a textual query with a similarity score
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod documents;
mod embed;
mod errors;
mod index;
mod ingest;
mod record;
mod retrieve;
mod splitter;

pub use config::{INDEX_FILE, RagConfig};
pub use documents::{load_documents, load_pdf};
pub use embed::{EmbedFuture, EmbeddingsProvider, jina::JinaEmbedder};
pub use errors::RagError;
pub use index::{LocalIndex, distance_to_similarity};
pub use ingest::{build_index, embed_chunks};
pub use record::{Chunk, Document, RagHit, RagQuery, RagRecord};
pub use splitter::split_documents;

use std::sync::Arc;

use tracing::{debug, info};

/// Single entry point for application code: an index plus the provider
/// used to embed queries against it.
pub struct RagStore {
    cfg: RagConfig,
    index: LocalIndex,
    provider: Arc<dyn EmbeddingsProvider>,
}

impl RagStore {
    /// Wraps an already loaded or built index.
    pub fn new(cfg: RagConfig, index: LocalIndex, provider: Arc<dyn EmbeddingsProvider>) -> Self {
        Self {
            cfg,
            index,
            provider,
        }
    }

    /// `true` if a persisted index exists under `cfg.persist_dir`.
    pub fn exists(cfg: &RagConfig) -> bool {
        cfg.index_path().is_file()
    }

    /// Loads the persisted index, or builds it when missing or `rebuild` is set.
    ///
    /// # Errors
    /// Returns [`RagError::NoDocuments`] when a build is needed and the data
    /// directory has no readable PDFs.
    pub async fn open_or_build(
        cfg: RagConfig,
        provider: Arc<dyn EmbeddingsProvider>,
        model: &str,
        rebuild: bool,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        let index = if !rebuild && Self::exists(&cfg) {
            info!(dir = %cfg.persist_dir.display(), "loading existing vector store");
            LocalIndex::load(&cfg.index_path())?
        } else {
            info!(dir = %cfg.persist_dir.display(), rebuild, "building vector store");
            build_index(&cfg, provider.as_ref(), model, rebuild).await?
        };
        Ok(Self::new(cfg, index, provider))
    }

    /// Retrieves the top-`k` chunks for `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RagHit>, RagError> {
        debug!(k, query_len = query.len(), "RagStore::retrieve");
        retrieve::rag_context(
            &self.index,
            RagQuery {
                text: query,
                top_k: k,
            },
            self.provider.as_ref(),
        )
        .await
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }
}
