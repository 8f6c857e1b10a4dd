//! Prompt builder for the basic (unguarded) QA path.

use rag_store::RagHit;

/// System instructions for handbook answers.
pub const DEFAULT_SYSTEM: &str = r#"
Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
"#;

/// Builds the "stuff" prompt: cited context blocks, then the question.
///
/// Blocks are added in ranking order while they fit in `max_chars`
/// characters; a first block that alone exceeds the budget is clipped.
///
/// # Example
/// ```
/// # use rag_store::RagHit;
/// # use contextor::prompt::build_user_prompt;
/// let hits: Vec<RagHit> = vec![];
/// let prompt = build_user_prompt("When can I turn right on red?", &hits, 2000);
/// assert!(prompt.ends_with("Helpful Answer:"));
/// ```
pub fn build_user_prompt(question: &str, hits: &[RagHit], max_chars: usize) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut used = 0usize;

    for h in hits {
        let block = format!("[{}]\n{}", h.citation(), h.text.trim());
        let len = block.chars().count();
        if used + len > max_chars {
            if blocks.is_empty() {
                blocks.push(clip_chars(&block, max_chars).to_string());
            }
            break;
        }
        used += len;
        blocks.push(block);
    }

    let mut out = String::new();
    if !blocks.is_empty() {
        out.push_str(&blocks.join("\n\n"));
        out.push_str("\n\n");
    }
    out.push_str("Question: ");
    out.push_str(question.trim());
    out.push_str("\nHelpful Answer:");
    out
}

/// First `max` chars of `s`.
pub(crate) fn clip_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
