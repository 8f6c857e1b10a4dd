use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Boxed future returned by provider methods.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Async because real providers perform HTTP requests. Implement this trait
/// to plug in another backend or an in-memory fake for tests.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds a single text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>>;

    /// Embeds many texts, preserving order.
    ///
    /// The default calls [`EmbeddingsProvider::embed`] sequentially.
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(*t).await?);
            }
            Ok(out)
        })
    }
}

pub mod jina;
