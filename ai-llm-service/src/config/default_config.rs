//! Default LLM configs loaded from environment variables.
//!
//! Two roles are supported:
//!
//! - **Chat**      → Google Gemini, answers and faithfulness judging
//! - **Embedding** → Jina AI embeddings for the vector store
//!
//! # Environment variables
//!
//! - `GOOGLE_API_KEY`       = Gemini API key (mandatory)
//! - `JINA_API_KEY`         = Jina API key (mandatory)
//! - `GEMINI_ENDPOINT`      = override for the Gemini base URL (optional)
//! - `JINA_ENDPOINT`        = override for the Jina base URL (optional)
//! - `JINA_EMBEDDING_MODEL` = embedding model (optional)
//! - `LLM_MAX_TOKENS`       = optional max output tokens (u32)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, env_opt_u32, must_env, opt_env},
};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_JINA_ENDPOINT: &str = "https://api.jina.ai";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "jina-embeddings-v2-base-en";

/// Constructs the Gemini chat profile.
///
/// `model` and `temperature` come from the caller's runtime settings; the key
/// and optional endpoint override come from the environment.
///
/// # Env
/// - `GOOGLE_API_KEY` (required)
/// - `GEMINI_ENDPOINT`, `LLM_MAX_TOKENS` (optional)
pub fn config_gemini_chat(
    model: &str,
    temperature: f32,
    timeout_secs: u64,
) -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GOOGLE_API_KEY")?;
    let endpoint = opt_env("GEMINI_ENDPOINT").unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.into());
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    let cfg = LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: model.to_string(),
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the Jina embedding profile.
///
/// # Env
/// - `JINA_API_KEY` (required)
/// - `JINA_ENDPOINT`, `JINA_EMBEDDING_MODEL` (optional)
///
/// # Defaults
/// - `model = jina-embeddings-v2-base-en`
/// - `timeout_secs = Some(60)`
pub fn config_jina_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("JINA_API_KEY")?;
    let endpoint = opt_env("JINA_ENDPOINT").unwrap_or_else(|| DEFAULT_JINA_ENDPOINT.into());
    let model = opt_env("JINA_EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into());

    let cfg = LlmModelConfig {
        provider: LlmProvider::Jina,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(60),
    };
    cfg.validate()?;
    Ok(cfg)
}
