//! Query-time retrieval: embed the query, search the index.

use tracing::trace;

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::LocalIndex;
use crate::record::{RagHit, RagQuery};

/// Embeds the query text and returns the top-`k` hits, best first.
pub async fn rag_context(
    index: &LocalIndex,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<RagHit>, RagError> {
    trace!("retrieve::rag_context top_k={}", query.top_k);

    let qv = provider.embed(query.text).await?;
    let hits = index.search(&qv, query.top_k)?;

    trace!(
        "retrieve::rag_context hits={} top_score={:?}",
        hits.len(),
        hits.first().map(|h| h.score)
    );
    Ok(hits)
}
