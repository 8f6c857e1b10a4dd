//! Resolved runtime settings and startup validation.

use std::path::PathBuf;
use std::time::Duration;

use ai_llm_service::error_handler::opt_env;
use contextor::SecureQaConfig;
use rag_store::RagConfig;

use crate::cli::Cli;

/// Secrets that must be present before any network call.
const REQUIRED_KEYS: &[&str] = &["GOOGLE_API_KEY", "JINA_API_KEY"];

/// Texts per embeddings request during ingestion.
const EMBED_BATCH: usize = 32;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub persist_dir: PathBuf,
    pub output_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub k: usize,
    pub model: String,
    pub temperature: f32,
    pub retrieval_threshold: f32,
    pub llm_timeout: Duration,
    pub max_response_words: usize,
    pub max_query_chars: usize,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            persist_dir: cli.persist_dir.clone(),
            output_dir: cli.output_dir.clone(),
            chunk_size: cli.chunk_size,
            chunk_overlap: cli.chunk_overlap,
            k: cli.k,
            model: cli.model.clone(),
            temperature: cli.temperature,
            retrieval_threshold: cli.retrieval_threshold,
            llm_timeout: Duration::from_secs(cli.llm_timeout_secs),
            max_response_words: cli.max_response_words,
            max_query_chars: cli.max_query_chars,
        }
    }
}

impl Settings {
    /// Every problem found, so the user can fix them in one go.
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| opt_env(k).is_none())
            .map(|k| format!("{k} not found in environment variables."))
            .collect();

        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            errors.push("--chunk-overlap must be smaller than a non-zero --chunk-size.".into());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            errors.push("--temperature must be within [0, 2].".into());
        }
        // k, threshold, timeout and the query/response limits
        if let Err(e) = self.secure_config().validate() {
            errors.push(e.to_string());
        }
        errors
    }

    pub fn rag_config(&self) -> RagConfig {
        RagConfig {
            data_dir: self.data_dir.clone(),
            persist_dir: self.persist_dir.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            embed_batch: EMBED_BATCH,
        }
    }

    pub fn secure_config(&self) -> SecureQaConfig {
        SecureQaConfig {
            top_k: self.k,
            retrieval_threshold: self.retrieval_threshold,
            llm_timeout: self.llm_timeout,
            max_query_chars: self.max_query_chars,
            max_response_words: self.max_response_words,
            run_faithfulness: true,
        }
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(contextor::ResultLog::FILE_NAME)
    }
}
