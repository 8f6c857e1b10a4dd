//! Jina embedding provider backed by the shared LLM service.

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;

use super::EmbedFuture;
use crate::EmbeddingsProvider;

/// Embedder that forwards to the `embedding` profile of [`LlmServiceProfiles`].
#[derive(Clone)]
pub struct JinaEmbedder {
    svc: Arc<LlmServiceProfiles>,
}

impl JinaEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl EmbeddingsProvider for JinaEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move { Ok(self.svc.embed(text).await?) })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(self.svc.embed_many(texts).await?) })
    }
}
