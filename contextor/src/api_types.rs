//! Public API types re-used by the binary (basic QA output).

/// Options that control retrieval and prompt building for a single question.
///
/// Setting a field to `0` means: "use the crate default".
///
/// # Example
/// ```
/// use contextor::AskOptions;
/// let opts = AskOptions { top_k: 3, max_ctx_chars: 0 };
/// assert_eq!(opts.top_k, 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct AskOptions {
    /// Chunks fetched from the vector store. `0` falls back to 3.
    pub top_k: usize,
    /// Character budget of the context section. `0` falls back to 8000.
    pub max_ctx_chars: usize,
}

/// A compact record of a context chunk that was fed to the LLM.
#[derive(Clone, Debug, PartialEq)]
pub struct UsedChunk {
    pub score: f32,
    pub source: Option<String>,
    pub page: Option<u32>,
    pub text: String,
}

/// Final answer together with the exact context passed to the model.
#[derive(Clone, Debug)]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
    pub context: Vec<UsedChunk>,
}

/// Snippet length shown under each source.
const SNIPPET_CHARS: usize = 100;

impl QaAnswer {
    /// Human-readable answer with deduplicated `source (Page n)` citations.
    ///
    /// # Example
    /// ```
    /// use contextor::{QaAnswer, UsedChunk};
    /// let qa = QaAnswer {
    ///     question: "Q?".into(),
    ///     answer: "A.".into(),
    ///     context: vec![UsedChunk { score: 0.9, source: Some("h.pdf".into()), page: Some(2), text: "abc".into() }],
    /// };
    /// assert!(qa.render().contains("- h.pdf (Page 2)"));
    /// ```
    pub fn render(&self) -> String {
        let mut out = format!(
            "Question: {}\nAnswer: {}\n\nSources:",
            self.question, self.answer
        );

        let mut seen: Vec<(Option<&str>, Option<u32>)> = Vec::new();
        for c in &self.context {
            let key = (c.source.as_deref(), c.page);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            let source = c.source.as_deref().unwrap_or("unknown");
            let page = c.page.map_or_else(|| "?".to_string(), |p| p.to_string());
            let snippet: String = c.text.chars().take(SNIPPET_CHARS).collect();
            out.push_str(&format!("\n- {source} (Page {page})\n  Snippet: \n{snippet}..."));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(page: u32, text: &str) -> UsedChunk {
        UsedChunk {
            score: 0.5,
            source: Some("handbook.pdf".into()),
            page: Some(page),
            text: text.into(),
        }
    }

    #[test]
    fn render_deduplicates_sources_and_clips_snippets() {
        let qa = QaAnswer {
            question: "What is Crosswalk guards?".into(),
            answer: "Crossing guards help children cross.".into(),
            context: vec![chunk(4, &"g".repeat(150)), chunk(4, "dup"), chunk(9, "other")],
        };
        let out = qa.render();

        assert!(out.starts_with(
            "Question: What is Crosswalk guards?\nAnswer: Crossing guards help children cross.\n\nSources:"
        ));
        assert_eq!(out.matches("- handbook.pdf (Page 4)").count(), 1);
        assert!(out.contains("- handbook.pdf (Page 9)"));
        assert!(out.contains(&format!("{}...", "g".repeat(100))));
        assert!(!out.contains("dup"));
    }
}
