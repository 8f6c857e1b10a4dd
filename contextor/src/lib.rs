//! Question answering over the driver's handbook.
//!
//! Two entry points:
//! - [`ask`]: plain RAG. Retrieve top-K chunks, stuff them into a prompt,
//!   call the model, return the answer with its sources.
//! - [`SecureQa`]: the same flow wrapped in input/output guardrails, prompt
//!   injection defense, a generation timeout and a faithfulness check,
//!   producing one [`ResultRecord`] per query.

pub mod cfg;
pub mod error;
pub mod evaluation;
pub mod guardrails;
pub mod llm;
pub mod prompt;
pub mod prompt_defense;
pub mod record;
pub mod retrieve;
pub mod secure;
pub mod tally;

mod api_types;
mod progress;

pub use api_types::{AskOptions, QaAnswer, UsedChunk};
pub use cfg::SecureQaConfig;
pub use error::{ContextorError, ErrorCode};
pub use evaluation::{EvalScore, Faithfulness, RetrievalStats};
pub use guardrails::{Guardrail, GuardrailHit, GuardrailOutcome};
pub use llm::Generator;
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use record::{ResultLog, ResultRecord};
pub use retrieve::Retriever;
pub use secure::SecureQa;
pub use tally::RunTally;

use std::time::Instant;

use tracing::info;

const DEFAULT_TOP_K: usize = 3;
const DEFAULT_MAX_CTX_CHARS: usize = 8000;

/// Ask the model with RAG augmentation and get both answer and used context.
///
/// Any `AskOptions` field set to `0` is replaced by the crate default.
///
/// # Errors
/// Propagates `ContextorError` from embedding, retrieval, or generation.
///
/// # Example
/// ```no_run
/// # use contextor::{ask, AskOptions, NoopProgress, Generator, Retriever};
/// # async fn demo(r: &dyn Retriever, g: &dyn Generator) {
/// let qa = ask("What is Crosswalk guards?", r, g, AskOptions::default(), &NoopProgress)
///     .await
///     .unwrap();
/// println!("{}", qa.render());
/// # }
/// ```
pub async fn ask(
    question: &str,
    retriever: &dyn Retriever,
    generator: &dyn Generator,
    opts: AskOptions,
    prog: &dyn Progress,
) -> Result<QaAnswer, ContextorError> {
    let t0 = Instant::now();
    let top_k = if opts.top_k == 0 {
        DEFAULT_TOP_K
    } else {
        opts.top_k
    };
    let max_ctx_chars = if opts.max_ctx_chars == 0 {
        DEFAULT_MAX_CTX_CHARS
    } else {
        opts.max_ctx_chars
    };

    // 1) Retrieve
    prog.step("embedding + retrieving");
    let hits = retriever.retrieve(question, top_k).await?;

    // 2) Build prompt + generate
    prog.step("asking the model");
    let user_prompt = prompt::build_user_prompt(question, &hits, max_ctx_chars);
    let answer = generator
        .generate(Some(prompt::DEFAULT_SYSTEM), &user_prompt)
        .await?;
    prog.finish();

    info!(
        hits = hits.len(),
        latency_ms = t0.elapsed().as_millis() as u64,
        "basic query answered"
    );

    // 3) Convert used context for callers
    let context = hits
        .into_iter()
        .map(|h| UsedChunk {
            score: h.score,
            source: h.source,
            page: h.page,
            text: h.text,
        })
        .collect();

    Ok(QaAnswer {
        question: question.to_string(),
        answer: answer.trim().to_string(),
        context,
    })
}
