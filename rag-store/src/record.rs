//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// One PDF page of text with provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub text: String,
    pub source: String,
    /// One-based page number within `source`.
    pub page: u32,
}

/// A chunk of a document, the unit that gets embedded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: u32,
}

/// Chunk plus its vector, as persisted in the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RagRecord {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A single retrieval hit.
///
/// `score` is the similarity `1 / (1 + distance)`, higher is better.
#[derive(Clone, Debug, PartialEq)]
pub struct RagHit {
    pub score: f32,
    pub distance: f32,
    pub text: String,
    pub source: Option<String>,
    pub page: Option<u32>,
}

impl RagHit {
    /// `"file.pdf (Page n)"` label used in citations.
    pub fn citation(&self) -> String {
        let source = self.source.as_deref().unwrap_or("unknown");
        match self.page {
            Some(p) => format!("{source} (Page {p})"),
            None => source.to_string(),
        }
    }
}

/// Query parameters for retrieval.
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: usize,
}

/// Stable id for a chunk: blake3 over source, page, ordinal and text.
pub fn chunk_id(source: &str, page: u32, ordinal: usize, text: &str) -> String {
    let mut h = blake3::Hasher::new();
    h.update(source.as_bytes());
    h.update(&page.to_le_bytes());
    h.update(&(ordinal as u64).to_le_bytes());
    h.update(text.as_bytes());
    h.finalize().to_hex()[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_stable_and_position_sensitive() {
        let a = chunk_id("a.pdf", 1, 0, "stop");
        assert_eq!(a, chunk_id("a.pdf", 1, 0, "stop"));
        assert_ne!(a, chunk_id("a.pdf", 1, 1, "stop"));
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn citation_includes_page_when_known() {
        let hit = RagHit {
            score: 0.5,
            distance: 1.0,
            text: String::new(),
            source: Some("data/handbook.pdf".into()),
            page: Some(12),
        };
        assert_eq!(hit.citation(), "data/handbook.pdf (Page 12)");
    }
}
