//! Generation seam used by the QA pipelines.

use std::{future::Future, pin::Pin};

use ai_llm_service::{AiLlmError, LlmServiceProfiles};

/// Boxed future returned by [`Generator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Anything that turns an optional system instruction plus a user prompt into text.
///
/// Implemented for [`LlmServiceProfiles`]; tests plug in scripted fakes.
pub trait Generator: Send + Sync {
    fn generate<'a>(&'a self, system: Option<&'a str>, prompt: &'a str) -> GenerateFuture<'a>;
}

impl Generator for LlmServiceProfiles {
    fn generate<'a>(&'a self, system: Option<&'a str>, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move { LlmServiceProfiles::generate(self, prompt, system).await })
    }
}
