//! Recursive character chunking of page documents.

use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

use crate::errors::RagError;
use crate::record::{Chunk, Document, chunk_id};

/// Splits documents into overlapping chunks of at most `size` characters.
///
/// Boundaries prefer paragraphs, then lines, then words. Each chunk keeps the
/// source and page of its document.
pub fn split_documents(
    docs: &[Document],
    size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, RagError> {
    let cfg = ChunkConfig::new(size).with_trim(true).with_overlap(overlap)?;
    let splitter = TextSplitter::new(cfg);

    let mut out = Vec::new();
    for doc in docs {
        for (ordinal, text) in splitter.chunks(&doc.text).enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            out.push(Chunk {
                id: chunk_id(&doc.source, doc.page, ordinal, text),
                text: text.to_string(),
                source: doc.source.clone(),
                page: doc.page,
            });
        }
    }

    debug!(documents = docs.len(), chunks = out.len(), size, overlap, "split documents");
    Ok(out)
}
