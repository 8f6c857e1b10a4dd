//! Guarded QA orchestrator.
//!
//! Pipeline: input guardrails, injection scan, retrieval, confidence gate,
//! generation under a timeout, output validation, length cap, evaluation.
//! A hard guardrail ends the run with a fixed message; nothing escapes as an
//! error.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cfg::SecureQaConfig;
use crate::error::ErrorCode;
use crate::evaluation::{
    EvalScore, RetrievalStats, compute_retrieval_relevance, evaluate_faithfulness, judge_context,
};
use crate::guardrails::{
    Guardrail, GuardrailHit, check_and_sanitize_pii, check_empty, check_off_topic,
    check_query_length, check_response_length,
};
use crate::llm::Generator;
use crate::prompt_defense::{
    INSUFFICIENT_CONTEXT, JAILBREAK_REFUSAL, build_system_prompt, sanitize_input, validate_output,
    wrap_context,
};
use crate::record::ResultRecord;
use crate::retrieve::Retriever;
use crate::tally::RunTally;

pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";
pub const UNAVAILABLE_MESSAGE: &str =
    "The answering service is currently unavailable. Please try again later.";

/// Guarded question answering over a retriever and a generator.
pub struct SecureQa {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    cfg: SecureQaConfig,
}

/// Mutable per-query state that becomes a [`ResultRecord`].
struct Trace {
    query: String,
    guardrails: Vec<Guardrail>,
    error_code: Option<ErrorCode>,
    retrieval: Option<RetrievalStats>,
    pii_warning: Option<String>,
    eval: EvalScore,
}

impl Trace {
    fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            guardrails: Vec::new(),
            error_code: None,
            retrieval: None,
            pii_warning: None,
            eval: EvalScore::not_available(),
        }
    }

    /// Prepends the PII warning unless it already ends with `text`.
    fn with_prefix(&self, text: &str) -> String {
        match &self.pii_warning {
            Some(w) if w.ends_with(text) => w.clone(),
            Some(w) => format!("{w} {text}"),
            None => text.to_string(),
        }
    }

    fn finish(self, answer: &str) -> ResultRecord {
        ResultRecord {
            answer: self.with_prefix(answer),
            query: self.query,
            guardrails: self.guardrails,
            error_code: self.error_code,
            retrieval: self.retrieval,
            eval: self.eval,
            injection_blocked: false,
        }
    }

    fn block(mut self, hit: GuardrailHit) -> ResultRecord {
        self.guardrails.push(hit.guardrail);
        ResultRecord {
            answer: self.with_prefix(&hit.message),
            query: self.query,
            guardrails: self.guardrails,
            error_code: Some(hit.code),
            retrieval: self.retrieval,
            eval: self.eval,
            injection_blocked: hit.guardrail == Guardrail::PromptInjection,
        }
    }
}

impl SecureQa {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        cfg: SecureQaConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            cfg,
        }
    }

    pub fn config(&self) -> &SecureQaConfig {
        &self.cfg
    }

    /// Runs one query through the guarded pipeline.
    pub async fn ask(&self, question: &str) -> ResultRecord {
        let t0 = Instant::now();
        let mut trace = Trace::new(question);

        let record = match self.run(question, &mut trace).await {
            Ok(answer) => trace.finish(&answer),
            Err(hit) => trace.block(hit),
        };

        info!(
            code = record.error_code.map_or("NONE", |c| c.as_str()),
            guardrails = record.guardrails.len(),
            faithfulness = %record.eval.verdict,
            latency_ms = t0.elapsed().as_millis() as u64,
            "secure query finished"
        );
        record
    }

    /// [`SecureQa::ask`] plus accumulation into `tally`.
    pub async fn ask_tallied(&self, question: &str, tally: &mut RunTally) -> ResultRecord {
        let record = self.ask(question).await;
        tally.add(&record);
        record
    }

    async fn run(&self, question: &str, trace: &mut Trace) -> Result<String, GuardrailHit> {
        // 1) Input guardrails on the raw query
        check_empty(question).escalate()?;
        check_query_length(question, self.cfg.max_query_chars).escalate()?;

        // 2) PII: redact and keep going
        let pii = check_and_sanitize_pii(question);
        trace.query = pii.sanitized;
        if let Some(hit) = pii.outcome.escalate()? {
            trace.guardrails.push(hit.guardrail);
            trace.error_code = Some(hit.code);
            trace.pii_warning = Some(hit.message);
        }
        let query = trace.query.clone();

        // 3) Injection scan and topic check on the redacted query
        sanitize_input(&query).escalate()?;
        check_off_topic(&query).escalate()?;

        // 4) Retrieve
        let hits = match self.retriever.retrieve(&query, self.cfg.top_k).await {
            Ok(h) => h,
            Err(e) => {
                warn!(guardrail = %Guardrail::RetrievalError, error = %e, "retrieval failed");
                trace.retrieval = Some(compute_retrieval_relevance(&[]));
                return Err(GuardrailHit::new(
                    Guardrail::RetrievalError,
                    ErrorCode::RetrievalEmpty,
                    INSUFFICIENT_CONTEXT,
                ));
            }
        };

        // 5) Confidence gate
        let stats = compute_retrieval_relevance(&hits);
        trace.retrieval = Some(stats);
        if !stats.is_confident(self.cfg.retrieval_threshold) {
            warn!(
                guardrail = %Guardrail::RetrievalLowConfidence,
                chunks = stats.chunks,
                top_score = ?stats.top_score,
                threshold = self.cfg.retrieval_threshold,
                "guardrail triggered"
            );
            return Err(GuardrailHit::new(
                Guardrail::RetrievalLowConfidence,
                ErrorCode::RetrievalEmpty,
                INSUFFICIENT_CONTEXT,
            ));
        }

        // 6) Generate with data wrapped apart from instructions
        let system = build_system_prompt(&wrap_context(&hits));
        let answer = self.generate(&system, &query).await?;

        // 7) Output checks
        if let Err(violation) = validate_output(&answer) {
            debug!(?violation, "answer rejected");
            return Err(GuardrailHit::new(
                Guardrail::OutputValidation,
                ErrorCode::PolicyBlock,
                JAILBREAK_REFUSAL,
            ));
        }
        let answer = match check_response_length(&answer, self.cfg.max_response_words) {
            Some(cut) => {
                trace.guardrails.push(Guardrail::ResponseLength);
                cut
            }
            None => answer,
        };

        // 8) Evaluate
        if self.cfg.run_faithfulness {
            trace.eval = evaluate_faithfulness(
                self.generator.as_ref(),
                &answer,
                &judge_context(&hits),
                self.cfg.llm_timeout,
            )
            .await;
        }

        Ok(answer)
    }

    async fn generate(&self, system: &str, query: &str) -> Result<String, GuardrailHit> {
        let limit = self.cfg.llm_timeout;
        let timed_out = || {
            warn!(guardrail = %Guardrail::LlmTimeout, ?limit, "generation timed out");
            GuardrailHit::new(Guardrail::LlmTimeout, ErrorCode::LlmTimeout, TIMEOUT_MESSAGE)
        };
        let unavailable = |reason: &dyn std::fmt::Display| {
            warn!(guardrail = %Guardrail::LlmError, error = %reason, "generation failed");
            GuardrailHit::new(Guardrail::LlmError, ErrorCode::LlmUnavailable, UNAVAILABLE_MESSAGE)
        };

        match tokio::time::timeout(limit, self.generator.generate(Some(system), query)).await {
            Err(_) => Err(timed_out()),
            Ok(Err(e)) if e.is_timeout() => Err(timed_out()),
            Ok(Err(e)) => Err(unavailable(&e)),
            Ok(Ok(text)) if text.trim().is_empty() => Err(unavailable(&"empty answer")),
            Ok(Ok(text)) => Ok(text.trim().to_string()),
        }
    }
}
