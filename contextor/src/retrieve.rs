//! Retrieval seam used by the QA pipelines.

use std::{future::Future, pin::Pin};

use rag_store::{RagError, RagHit, RagStore};

/// Boxed future returned by [`Retriever::retrieve`].
pub type RetrieveFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<RagHit>, RagError>> + Send + 'a>>;

/// Top-`k` chunk lookup, best first, scores in `(0, 1]`.
pub trait Retriever: Send + Sync {
    fn retrieve<'a>(&'a self, query: &'a str, k: usize) -> RetrieveFuture<'a>;
}

impl Retriever for RagStore {
    fn retrieve<'a>(&'a self, query: &'a str, k: usize) -> RetrieveFuture<'a> {
        Box::pin(async move { RagStore::retrieve(self, query, k).await })
    }
}
