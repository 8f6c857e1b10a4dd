//! Ingestion pipeline: PDFs → pages → chunks → embeddings → persisted index.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::documents::load_documents;
use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::LocalIndex;
use crate::record::{Chunk, RagRecord};
use crate::splitter::split_documents;

/// Builds the index from `cfg.data_dir` and writes it under `cfg.persist_dir`.
///
/// With `force_recreate` the persist directory is cleared, but only once the
/// new index is embedded; a failed rebuild leaves the old store in place.
///
/// # Errors
/// - [`RagError::NoDocuments`] if no PDF page with text was found
/// - embedding, I/O or serialization failures
pub async fn build_index(
    cfg: &RagConfig,
    provider: &dyn EmbeddingsProvider,
    model: &str,
    force_recreate: bool,
) -> Result<LocalIndex, RagError> {
    cfg.validate()?;

    let docs = load_documents(&cfg.data_dir)?;
    if docs.is_empty() {
        return Err(RagError::NoDocuments);
    }
    info!(pages = docs.len(), dir = %cfg.data_dir.display(), "documents loaded");

    let chunks = split_documents(&docs, cfg.chunk_size, cfg.chunk_overlap)?;
    info!(chunks = chunks.len(), "documents split");

    let index = embed_chunks(chunks, provider, model, cfg.embed_batch).await?;

    if force_recreate && cfg.persist_dir.exists() {
        warn!(dir = %cfg.persist_dir.display(), "removing existing vector store");
        std::fs::remove_dir_all(&cfg.persist_dir)?;
    }
    index.save(&cfg.index_path())?;
    Ok(index)
}

/// Embeds chunks batch by batch into a fresh index, with a progress bar.
pub async fn embed_chunks(
    chunks: Vec<Chunk>,
    provider: &dyn EmbeddingsProvider,
    model: &str,
    batch: usize,
) -> Result<LocalIndex, RagError> {
    let batch = batch.max(1);
    let mut index = LocalIndex::new(model);

    let pb = ProgressBar::new(chunks.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} chunks ({eta})",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }

    for group in chunks.chunks(batch) {
        let texts: Vec<&str> = group.iter().map(|c| c.text.as_str()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        if vectors.len() != group.len() {
            pb.abandon();
            return Err(RagError::Config(format!(
                "provider returned {} vectors for {} chunks",
                vectors.len(),
                group.len()
            )));
        }
        for (chunk, embedding) in group.iter().cloned().zip(vectors) {
            index.push(RagRecord { chunk, embedding })?;
        }
        pb.inc(group.len() as u64);
    }

    pb.finish_with_message("embedding complete");
    info!(records = index.len(), dim = index.dim, "index built");
    Ok(index)
}
