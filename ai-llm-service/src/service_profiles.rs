//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::LlmServiceProfiles;
//! use ai_llm_service::config::default_config::{config_gemini_chat, config_jina_embedding};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let chat = config_gemini_chat("gemini-2.5-flash", 1.0, 30)?;
//! let embedding = config_jina_embedding()?;
//! let svc = Arc::new(LlmServiceProfiles::new(chat, embedding)?);
//!
//! let txt = svc.generate("When must I stop for a school bus?", None).await?;
//! let emb = svc.embed("school bus").await?;
//! println!("{txt} / dim={}", emb.len());
//! # Ok(())
//! # }
//! ```

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{gemini_service::GeminiService, jina_service::JinaService},
};

/// Max inputs per embeddings request.
const EMBED_BATCH: usize = 64;

/// Shared service that manages the **chat** and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat: LlmModelConfig,
    embedding: LlmModelConfig,

    gemini: RwLock<HashMap<ClientKey, Arc<GeminiService>>>,
    jina: RwLock<HashMap<ClientKey, Arc<JinaService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service from validated profiles.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] if either profile fails validation.
    pub fn new(chat: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        chat.validate()?;
        embedding.validate()?;
        Ok(Self {
            chat,
            embedding,
            gemini: RwLock::new(HashMap::new()),
            jina: RwLock::new(HashMap::new()),
        })
    }

    /// Generates text with the **chat** profile.
    ///
    /// The call is bounded by the profile's `timeout_secs`; an elapsed deadline
    /// yields [`AiLlmError::Timeout`].
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let limit = Duration::from_secs(self.chat.timeout_secs.unwrap_or(60));
        match self.chat.provider {
            LlmProvider::Gemini => {
                let cli = self.get_or_init_gemini(&self.chat).await?;
                match tokio::time::timeout(limit, cli.generate(prompt, system)).await {
                    Ok(res) => res,
                    Err(_) => {
                        warn!(model = %self.chat.model, ?limit, "generation deadline elapsed");
                        Err(AiLlmError::Timeout(limit))
                    }
                }
            }
            LlmProvider::Jina => Err(ProviderError::new(
                Provider::Jina,
                ProviderErrorKind::InvalidProvider,
            )
            .into()),
        }
    }

    /// Computes one embedding with the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let mut out = self.embed_many(&[input]).await?;
        out.pop().ok_or_else(|| {
            ProviderError::new(
                Provider::Jina,
                ProviderErrorKind::Decode("empty embeddings response".into()),
            )
            .into()
        })
    }

    /// Computes embeddings for many inputs, chunked into provider-sized batches.
    pub async fn embed_many(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        match self.embedding.provider {
            LlmProvider::Jina => {
                let cli = self.get_or_init_jina(&self.embedding).await?;
                let mut out = Vec::with_capacity(inputs.len());
                for batch in inputs.chunks(EMBED_BATCH) {
                    out.extend(cli.embeddings(batch).await?);
                }
                Ok(out)
            }
            LlmProvider::Gemini => Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidProvider,
            )
            .into()),
        }
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.chat, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_gemini(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<GeminiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.gemini.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.gemini.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(GeminiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_jina(&self, cfg: &LlmModelConfig) -> Result<Arc<JinaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.jina.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.jina.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(JinaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.endpoint == other.endpoint
            && self.model == other.model
            && self.api_key == other.api_key
            && self.timeout == other.timeout
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        self.api_key.hash(state);
        self.timeout.hash(state);
    }
}
