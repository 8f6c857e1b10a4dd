//! Typed errors and guardrail error codes for the contextor crate.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Errors from the LLM service.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Result log I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Outcome code attached to a guarded answer.
///
/// At most one code is recorded per query. [`ErrorCode::PiiDetected`] is the
/// only soft code: processing continues and a later hard code replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    EmptyQuery,
    QueryTooLong,
    OffTopic,
    PiiDetected,
    PolicyBlock,
    RetrievalEmpty,
    LlmTimeout,
    LlmUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmptyQuery => "EMPTY_QUERY",
            ErrorCode::QueryTooLong => "QUERY_TOO_LONG",
            ErrorCode::OffTopic => "OFF_TOPIC",
            ErrorCode::PiiDetected => "PII_DETECTED",
            ErrorCode::PolicyBlock => "POLICY_BLOCK",
            ErrorCode::RetrievalEmpty => "RETRIEVAL_EMPTY",
            ErrorCode::LlmTimeout => "LLM_TIMEOUT",
            ErrorCode::LlmUnavailable => "LLM_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_in_screaming_snake_case() {
        assert_eq!(ErrorCode::QueryTooLong.to_string(), "QUERY_TOO_LONG");
        assert_eq!(ErrorCode::PolicyBlock.as_str(), "POLICY_BLOCK");
    }
}
