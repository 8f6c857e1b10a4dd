//! Per-query result records and the plain-text result log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ContextorError, ErrorCode};
use crate::evaluation::{EvalScore, Faithfulness, RetrievalStats};
use crate::guardrails::Guardrail;
use crate::tally::RunTally;

/// Everything logged about one guarded query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    /// Query as processed: PII already redacted.
    pub query: String,
    /// Triggered guardrails in pipeline order.
    pub guardrails: Vec<Guardrail>,
    pub error_code: Option<ErrorCode>,
    /// `None` when retrieval never ran.
    pub retrieval: Option<RetrievalStats>,
    pub answer: String,
    pub eval: EvalScore,
    pub injection_blocked: bool,
}

impl ResultRecord {
    pub fn faithfulness(&self) -> Faithfulness {
        self.eval.verdict
    }

    /// Renders the fixed seven-line block terminated by `---`.
    pub fn render_block(&self) -> String {
        let query = if self.query.is_empty() {
            "(empty)".to_string()
        } else {
            format!("{:?}", self.query)
        };
        let guardrails = if self.guardrails.is_empty() {
            "NONE".to_string()
        } else {
            self.guardrails
                .iter()
                .map(Guardrail::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let code = self.error_code.map_or("NONE", |c| c.as_str());
        let chunks = match self.retrieval {
            None => "NONE".to_string(),
            Some(RetrievalStats {
                chunks,
                top_score: None,
            }) => format!("{chunks} chunks, N/A"),
            Some(RetrievalStats {
                chunks,
                top_score: Some(s),
            }) => format!("{chunks} chunks, top score: {s:.4}"),
        };

        format!(
            "Query: {query}\n\
             Guardrails Triggered: {guardrails}\n\
             Error Code: {code}\n\
             Retrieved Chunks: {chunks}\n\
             Answer: {}\n\
             Faithfulness/Eval Score: {}\n\
             ---\n",
            self.answer, self.eval.verdict
        )
    }
}

/// Writer for `<output-dir>/results.txt`.
///
/// The file is truncated when the log is created; blocks are appended and
/// flushed one at a time so a crash keeps everything already written.
pub struct ResultLog {
    path: PathBuf,
    out: BufWriter<File>,
}

impl ResultLog {
    pub const FILE_NAME: &'static str = "results.txt";

    /// Creates `dir` if needed and truncates `dir/results.txt`.
    pub fn create(dir: &Path) -> Result<Self, ContextorError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        info!(path = %path.display(), "result log opened");
        Ok(Self {
            path,
            out: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends raw text.
    pub fn write_raw(&mut self, text: &str) -> Result<(), ContextorError> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn append(&mut self, record: &ResultRecord) -> Result<(), ContextorError> {
        self.write_raw(&record.render_block())
    }

    pub fn write_summary(&mut self, tally: &RunTally) -> Result<(), ContextorError> {
        self.write_raw(&tally.render_summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResultRecord {
        ResultRecord {
            query: "Can I park here?".into(),
            guardrails: vec![Guardrail::PiiDetection],
            error_code: Some(ErrorCode::PiiDetected),
            retrieval: Some(RetrievalStats {
                chunks: 3,
                top_score: Some(0.456789),
            }),
            answer: "No.".into(),
            eval: EvalScore {
                verdict: Faithfulness::Yes,
                justification: Some("Yes".into()),
            },
            injection_blocked: false,
        }
    }

    #[test]
    fn block_has_fixed_layout() {
        assert_eq!(
            record().render_block(),
            "Query: \"Can I park here?\"\n\
             Guardrails Triggered: pii_detection\n\
             Error Code: PII_DETECTED\n\
             Retrieved Chunks: 3 chunks, top score: 0.4568\n\
             Answer: No.\n\
             Faithfulness/Eval Score: Yes\n\
             ---\n"
        );
    }

    #[test]
    fn empty_query_without_retrieval_renders_none() {
        let r = ResultRecord {
            query: String::new(),
            guardrails: vec![Guardrail::EmptyQuery],
            error_code: Some(ErrorCode::EmptyQuery),
            retrieval: None,
            answer: "Please enter a question.".into(),
            eval: EvalScore::not_available(),
            injection_blocked: false,
        };
        let block = r.render_block();
        assert!(block.starts_with("Query: (empty)\n"));
        assert!(block.contains("Retrieved Chunks: NONE\n"));
        assert!(block.contains("Faithfulness/Eval Score: N/A\n"));
    }

    #[test]
    fn zero_chunks_render_not_available() {
        let r = ResultRecord {
            retrieval: Some(RetrievalStats {
                chunks: 0,
                top_score: None,
            }),
            ..record()
        };
        assert!(r.render_block().contains("Retrieved Chunks: 0 chunks, N/A\n"));
    }

    #[test]
    fn log_truncates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");

        let mut log = ResultLog::create(&out).unwrap();
        log.append(&record()).unwrap();
        drop(log);

        let mut log = ResultLog::create(&out).unwrap();
        log.append(&record()).unwrap();
        log.append(&record()).unwrap();
        let mut tally = RunTally::default();
        tally.add(&record());
        log.write_summary(&tally).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.matches("---\n").count(), 2);
        assert!(text.contains("=== SUMMARY ==="));
    }
}
