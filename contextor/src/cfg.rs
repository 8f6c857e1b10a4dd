//! Runtime configuration for the guarded QA pipeline.

use std::time::Duration;

use crate::error::ContextorError;

/// Limits and thresholds applied by [`crate::SecureQa`].
#[derive(Clone, Debug, PartialEq)]
pub struct SecureQaConfig {
    /// Chunks fetched per query.
    pub top_k: usize,
    /// Minimum top similarity required before the model is called.
    pub retrieval_threshold: f32,
    /// Bound on every generation call, the judge call included.
    pub llm_timeout: Duration,
    pub max_query_chars: usize,
    pub max_response_words: usize,
    /// Run the faithfulness judge after each successful answer.
    pub run_faithfulness: bool,
}

impl Default for SecureQaConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            retrieval_threshold: 0.3,
            llm_timeout: Duration::from_secs(30),
            max_query_chars: 500,
            max_response_words: 500,
            run_faithfulness: true,
        }
    }
}

impl SecureQaConfig {
    /// Rejects values that would make every query fail.
    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.top_k == 0 {
            return Err(ContextorError::InvalidConfig("top_k must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.retrieval_threshold) {
            return Err(ContextorError::InvalidConfig(format!(
                "retrieval_threshold must be within [0, 1], got {}",
                self.retrieval_threshold
            )));
        }
        if self.llm_timeout.is_zero() {
            return Err(ContextorError::InvalidConfig("llm_timeout must be > 0".into()));
        }
        if self.max_query_chars == 0 || self.max_response_words == 0 {
            return Err(ContextorError::InvalidConfig(
                "query and response limits must be > 0".into(),
            ));
        }
        Ok(())
    }
}
