//! Input and output guardrails.
//!
//! Every check is a pure function over a string. Hard failures come back as
//! [`GuardrailOutcome::Blocked`]; PII is the only soft outcome
//! ([`GuardrailOutcome::Warn`]) and carries the redacted query.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::ErrorCode;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a question.";
pub const OFF_TOPIC_MESSAGE: &str = "I can only answer questions about Nova Scotia driving rules.";
pub const TRUNCATION_SUFFIX: &str = "... [response truncated]";

/// Queries shorter than this (in chars) skip the topic check.
const SHORT_QUERY_CHARS: usize = 10;

/// Driving/road-rules vocabulary. Matched as whole words, with an optional
/// plural suffix; multi-word entries tolerate any whitespace.
const DRIVING_TOPIC_KEYWORDS: &[&str] = &[
    "drive", "driving", "driver", "vehicle", "car", "truck", "motorcycle", "bicycle",
    "cyclist", "road", "highway", "street", "intersection", "roundabout", "traffic",
    "signal", "sign", "light", "pedestrian", "crosswalk", "crossing", "bus", "school bus",
    "emergency", "ambulance", "park", "parking", "parked", "yield", "stop", "stopping",
    "speed", "speeding", "limit", "license", "licence", "permit", "pass", "passing",
    "lane", "rule", "law", "regulation", "nova scotia", "highway traffic act",
    "motor vehicle act", "crosswalk guard", "right of way", "turn", "turning", "merge",
    "merging", "brake", "seatbelt", "seat belt", "helmet", "collision", "accident",
    "demerit", "ticket", "impaired", "handbook", "overtake", "u-turn",
];

/// Name of a guardrail as it appears in logs and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Guardrail {
    EmptyQuery,
    QueryLength,
    PiiDetection,
    PromptInjection,
    OffTopic,
    RetrievalLowConfidence,
    RetrievalError,
    LlmTimeout,
    LlmError,
    OutputValidation,
    ResponseLength,
}

impl Guardrail {
    pub fn as_str(&self) -> &'static str {
        match self {
            Guardrail::EmptyQuery => "empty_query",
            Guardrail::QueryLength => "query_length_limit",
            Guardrail::PiiDetection => "pii_detection",
            Guardrail::PromptInjection => "prompt_injection",
            Guardrail::OffTopic => "off_topic_detection",
            Guardrail::RetrievalLowConfidence => "retrieval_empty_or_low_confidence",
            Guardrail::RetrievalError => "retrieval_error",
            Guardrail::LlmTimeout => "llm_timeout",
            Guardrail::LlmError => "llm_error",
            Guardrail::OutputValidation => "output_validation_failed",
            Guardrail::ResponseLength => "response_length_limit",
        }
    }
}

impl fmt::Display for Guardrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A triggered guardrail with its code and user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailHit {
    pub guardrail: Guardrail,
    pub code: ErrorCode,
    pub message: String,
}

impl GuardrailHit {
    pub fn new(guardrail: Guardrail, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            guardrail,
            code,
            message: message.into(),
        }
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardrailOutcome {
    Pass,
    /// Soft: record and continue.
    Warn(GuardrailHit),
    /// Hard: stop the pipeline.
    Blocked(GuardrailHit),
}

impl GuardrailOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, GuardrailOutcome::Pass)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, GuardrailOutcome::Blocked(_))
    }

    pub fn hit(&self) -> Option<&GuardrailHit> {
        match self {
            GuardrailOutcome::Pass => None,
            GuardrailOutcome::Warn(h) | GuardrailOutcome::Blocked(h) => Some(h),
        }
    }

    /// `Err` for a block, `Ok(Some)` for a warning, `Ok(None)` otherwise.
    pub fn escalate(self) -> Result<Option<GuardrailHit>, GuardrailHit> {
        match self {
            GuardrailOutcome::Pass => Ok(None),
            GuardrailOutcome::Warn(h) => Ok(Some(h)),
            GuardrailOutcome::Blocked(h) => Err(h),
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Input checks                                                              */
/* ------------------------------------------------------------------------- */

/// Rejects empty or whitespace-only queries.
pub fn check_empty(query: &str) -> GuardrailOutcome {
    if query.trim().is_empty() {
        warn!(guardrail = %Guardrail::EmptyQuery, "guardrail triggered");
        return GuardrailOutcome::Blocked(GuardrailHit::new(
            Guardrail::EmptyQuery,
            ErrorCode::EmptyQuery,
            EMPTY_QUERY_MESSAGE,
        ));
    }
    GuardrailOutcome::Pass
}

/// Rejects queries longer than `max_chars` characters.
pub fn check_query_length(query: &str, max_chars: usize) -> GuardrailOutcome {
    let len = query.chars().count();
    if len > max_chars {
        warn!(guardrail = %Guardrail::QueryLength, len, max_chars, "guardrail triggered");
        return GuardrailOutcome::Blocked(GuardrailHit::new(
            Guardrail::QueryLength,
            ErrorCode::QueryTooLong,
            format!("Your question is too long. Please keep it under {max_chars} characters."),
        ));
    }
    GuardrailOutcome::Pass
}

fn topic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alts: Vec<String> = DRIVING_TOPIC_KEYWORDS
            .iter()
            .map(|k| regex::escape(k).replace(' ', r"\s+"))
            .collect();
        let pattern = format!(r"(?i)\b(?:{})(?:s|es)?\b", alts.join("|"));
        Regex::new(&pattern).expect("topic keyword pattern compiles")
    })
}

/// `true` if the query mentions driving/road-rules vocabulary.
pub fn is_on_topic(query: &str) -> bool {
    topic_regex().is_match(query)
}

/// Keyword classifier for the driving domain.
///
/// Very short queries are let through as possible abbreviations.
pub fn check_off_topic(query: &str) -> GuardrailOutcome {
    let q = query.trim();
    if is_on_topic(q) || q.chars().count() < SHORT_QUERY_CHARS {
        return GuardrailOutcome::Pass;
    }
    warn!(guardrail = %Guardrail::OffTopic, "guardrail triggered");
    GuardrailOutcome::Blocked(GuardrailHit::new(
        Guardrail::OffTopic,
        ErrorCode::OffTopic,
        OFF_TOPIC_MESSAGE,
    ))
}

/* ------------------------------------------------------------------------- */
/* PII                                                                       */
/* ------------------------------------------------------------------------- */

/// Kinds of personal data stripped from queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiKind {
    Phone,
    Email,
    LicensePlate,
}

impl PiiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiKind::Phone => "phone",
            PiiKind::Email => "email",
            PiiKind::LicensePlate => "license_plate",
        }
    }

    fn replacement(&self) -> &'static str {
        match self {
            PiiKind::Phone => "[REDACTED_PHONE]",
            PiiKind::Email => "[REDACTED_EMAIL]",
            PiiKind::LicensePlate => "[REDACTED_PLATE]",
        }
    }

    fn regex(&self) -> &'static Regex {
        static PHONE: OnceLock<Regex> = OnceLock::new();
        static EMAIL: OnceLock<Regex> = OnceLock::new();
        static PLATE: OnceLock<Regex> = OnceLock::new();
        match self {
            PiiKind::Phone => PHONE.get_or_init(|| {
                Regex::new(r"(?:\(\d{3}\)\s*|\b\d{3}[-.\s]?)\d{3}[-.\s]?\d{4}\b")
                    .expect("phone pattern compiles")
            }),
            PiiKind::Email => EMAIL.get_or_init(|| {
                Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                    .expect("email pattern compiles")
            }),
            // Uppercase only: lowercase word+number pairs are ordinary prose.
            PiiKind::LicensePlate => PLATE.get_or_init(|| {
                Regex::new(r"\b[A-Z]{2,3}\s?\d{2,4}\b|\b\d{2,4}\s?[A-Z]{2,3}\b")
                    .expect("plate pattern compiles")
            }),
        }
    }
}

/// Redacted query plus what was found.
#[derive(Debug, Clone, PartialEq)]
pub struct PiiScan {
    pub sanitized: String,
    pub found: Vec<PiiKind>,
    pub outcome: GuardrailOutcome,
}

/// Detects phone numbers, emails and licence plates, replacing each match
/// with a `[REDACTED_*]` token. Processing continues with a warning.
pub fn check_and_sanitize_pii(query: &str) -> PiiScan {
    let mut sanitized = query.to_string();
    let mut found = Vec::new();

    for kind in [PiiKind::Phone, PiiKind::Email, PiiKind::LicensePlate] {
        let re = kind.regex();
        if re.is_match(&sanitized) {
            found.push(kind);
            sanitized = re.replace_all(&sanitized, kind.replacement()).into_owned();
        }
    }

    if found.is_empty() {
        return PiiScan {
            sanitized,
            found,
            outcome: GuardrailOutcome::Pass,
        };
    }

    let kinds = found.iter().map(PiiKind::as_str).collect::<Vec<_>>().join(", ");
    warn!(guardrail = %Guardrail::PiiDetection, kinds = %kinds, "guardrail triggered");

    let message = format!("PII detected ({kinds}) was removed. {OFF_TOPIC_MESSAGE}");
    PiiScan {
        sanitized,
        found,
        outcome: GuardrailOutcome::Warn(GuardrailHit::new(
            Guardrail::PiiDetection,
            ErrorCode::PiiDetected,
            message,
        )),
    }
}

/* ------------------------------------------------------------------------- */
/* Output                                                                    */
/* ------------------------------------------------------------------------- */

/// Caps a response at `max_words` whitespace-separated words.
///
/// Returns the truncated text, or `None` when the response already fits.
pub fn check_response_length(response: &str, max_words: usize) -> Option<String> {
    let words: Vec<&str> = response.split_whitespace().collect();
    if words.len() <= max_words {
        return None;
    }
    warn!(
        guardrail = %Guardrail::ResponseLength,
        words = words.len(),
        max_words,
        "guardrail triggered"
    );
    Some(format!("{}{TRUNCATION_SUFFIX}", words[..max_words].join(" ")))
}
