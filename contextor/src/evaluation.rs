//! Answer evaluation: LLM-judged faithfulness and retrieval relevance.
//!
//! The faithfulness score asks the same model whether its answer is supported
//! by the retrieved context. It is a heuristic signal, never a gate: every
//! failure degrades to [`Faithfulness::NotAvailable`].

use std::fmt;
use std::time::Duration;

use rag_store::RagHit;
use tracing::{debug, warn};

use crate::llm::Generator;
use crate::prompt::clip_chars;

/// Context budget (chars) sent to the judge.
pub const EVAL_CONTEXT_CHARS: usize = 3000;
/// Answer budget (chars) sent to the judge.
pub const EVAL_ANSWER_CHARS: usize = 1000;
/// Separator between chunks in the judge context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Judge verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faithfulness {
    Yes,
    No,
    NotAvailable,
}

impl Faithfulness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Faithfulness::Yes => "Yes",
            Faithfulness::No => "No",
            Faithfulness::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for Faithfulness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the judge's raw reply.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalScore {
    pub verdict: Faithfulness,
    pub justification: Option<String>,
}

impl EvalScore {
    pub fn not_available() -> Self {
        Self {
            verdict: Faithfulness::NotAvailable,
            justification: None,
        }
    }
}

impl Default for EvalScore {
    fn default() -> Self {
        Self::not_available()
    }
}

/// Builds the yes/no judge prompt with both inputs clipped.
pub fn faithfulness_prompt(answer: &str, context: &str) -> String {
    format!(
        "You are evaluating whether an answer is supported by the provided context.\n\n\
         Context:\n{}\n\n\
         Answer:\n{}\n\n\
         Is this answer fully supported by the context above? \
         Answer with exactly one word: Yes or No.",
        clip_chars(context, EVAL_CONTEXT_CHARS),
        clip_chars(answer, EVAL_ANSWER_CHARS),
    )
}

/// Reads the first word of the judge reply.
///
/// Leading punctuation or markdown is skipped; anything other than a
/// yes/no word is [`Faithfulness::NotAvailable`].
pub fn parse_verdict(reply: &str) -> Faithfulness {
    let word: String = reply
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_uppercase();

    match word.as_str() {
        "YES" => Faithfulness::Yes,
        "NO" => Faithfulness::No,
        _ => Faithfulness::NotAvailable,
    }
}

/// Joins chunk texts the way the judge sees them.
pub fn judge_context(hits: &[RagHit]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// One extra generation call scoring `answer` against `context`.
///
/// Never fails: empty inputs, timeouts, provider errors and malformed
/// replies all yield `N/A`.
pub async fn evaluate_faithfulness(
    generator: &dyn Generator,
    answer: &str,
    context: &str,
    limit: Duration,
) -> EvalScore {
    if answer.trim().is_empty() || context.trim().is_empty() {
        return EvalScore::not_available();
    }

    let prompt = faithfulness_prompt(answer, context);
    let reply = match tokio::time::timeout(limit, generator.generate(None, &prompt)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(error = %e, "faithfulness evaluation failed");
            return EvalScore::not_available();
        }
        Err(_) => {
            warn!(?limit, "faithfulness evaluation timed out");
            return EvalScore::not_available();
        }
    };

    let verdict = parse_verdict(&reply);
    debug!(%verdict, "faithfulness evaluated");
    EvalScore {
        verdict,
        justification: Some(clip_chars(reply.trim(), 200).to_string()),
    }
}

/// Retrieval relevance summary for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalStats {
    pub chunks: usize,
    /// Best similarity; `None` when nothing came back.
    pub top_score: Option<f32>,
}

impl RetrievalStats {
    /// `true` when at least one chunk scores at or above `threshold`.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.top_score.is_some_and(|s| s >= threshold)
    }
}

/// Counts hits and extracts the top similarity.
pub fn compute_retrieval_relevance(hits: &[RagHit]) -> RetrievalStats {
    let top = hits.iter().map(|h| h.score).fold(None, |best: Option<f32>, s| {
        Some(best.map_or(s, |b| b.max(s)))
    });
    RetrievalStats {
        chunks: hits.len(),
        top_score: top,
    }
}
