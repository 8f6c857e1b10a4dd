//! End-of-run counters for scenario runs.

use std::collections::BTreeMap;

use crate::evaluation::Faithfulness;
use crate::guardrails::Guardrail;
use crate::record::ResultRecord;

/// Explicit accumulator owned by the caller of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTally {
    pub total: usize,
    pub guardrail_counts: BTreeMap<Guardrail, usize>,
    pub injection_blocks: usize,
    /// Yes/No verdicts in query order; `N/A` is not counted.
    pub faithfulness: Vec<Faithfulness>,
}

impl RunTally {
    pub fn add(&mut self, record: &ResultRecord) {
        self.total += 1;
        for g in &record.guardrails {
            *self.guardrail_counts.entry(*g).or_default() += 1;
        }
        if record.injection_blocked {
            self.injection_blocks += 1;
        }
        if record.faithfulness() != Faithfulness::NotAvailable {
            self.faithfulness.push(record.faithfulness());
        }
    }

    /// Share of `Yes` among scored answers, in percent.
    pub fn yes_ratio(&self) -> Option<f64> {
        if self.faithfulness.is_empty() {
            return None;
        }
        let yes = self
            .faithfulness
            .iter()
            .filter(|f| **f == Faithfulness::Yes)
            .count();
        Some(yes as f64 / self.faithfulness.len() as f64 * 100.0)
    }

    pub fn render_summary(&self) -> String {
        let counts = if self.guardrail_counts.is_empty() {
            "NONE".to_string()
        } else {
            self.guardrail_counts
                .iter()
                .map(|(g, n)| format!("{g}: {n}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let scores = self
            .faithfulness
            .iter()
            .map(Faithfulness::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let average = self
            .yes_ratio()
            .map_or_else(|| "N/A".to_string(), |p| format!("{p:.1}% Yes"));

        format!(
            "\n=== SUMMARY ===\n\
             Total queries: {}\n\
             Guardrails triggered by type: {counts}\n\
             Injection attempts blocked: {}\n\
             Faithfulness scores: [{scores}]\n\
             Average faithfulness (Yes/No): {average}\n",
            self.total, self.injection_blocks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::evaluation::EvalScore;

    fn rec(guardrails: Vec<Guardrail>, verdict: Faithfulness, injection: bool) -> ResultRecord {
        ResultRecord {
            query: "q".into(),
            guardrails,
            error_code: injection.then_some(ErrorCode::PolicyBlock),
            retrieval: None,
            answer: "a".into(),
            eval: EvalScore {
                verdict,
                justification: None,
            },
            injection_blocked: injection,
        }
    }

    #[test]
    fn counts_guardrails_injections_and_verdicts() {
        let mut t = RunTally::default();
        t.add(&rec(vec![], Faithfulness::Yes, false));
        t.add(&rec(vec![Guardrail::PromptInjection], Faithfulness::NotAvailable, true));
        t.add(&rec(vec![Guardrail::PromptInjection], Faithfulness::NotAvailable, true));
        t.add(&rec(vec![Guardrail::ResponseLength], Faithfulness::No, false));

        assert_eq!(t.total, 4);
        assert_eq!(t.guardrail_counts[&Guardrail::PromptInjection], 2);
        assert_eq!(t.injection_blocks, 2);
        assert_eq!(t.faithfulness, vec![Faithfulness::Yes, Faithfulness::No]);
        assert_eq!(t.yes_ratio(), Some(50.0));

        let s = t.render_summary();
        assert!(s.contains("Total queries: 4\n"));
        assert!(s.contains("prompt_injection: 2"));
        assert!(s.contains("Injection attempts blocked: 2\n"));
        assert!(s.contains("Faithfulness scores: [Yes, No]\n"));
        assert!(s.contains("Average faithfulness (Yes/No): 50.0% Yes\n"));
    }

    #[test]
    fn empty_run_has_no_average() {
        let s = RunTally::default().render_summary();
        assert!(s.contains("Guardrails triggered by type: NONE"));
        assert!(s.contains("Average faithfulness (Yes/No): N/A"));
    }
}
