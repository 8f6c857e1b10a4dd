//! Local vector index persisted as JSON, exact L2 search.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::RagError;
use crate::record::{RagHit, RagRecord};

/// Maps an L2 distance to a similarity in `(0, 1]`.
///
/// Negative distances (not produced by L2, but possible from other backends)
/// map to `1.0`.
pub fn distance_to_similarity(distance: f32) -> f32 {
    if distance < 0.0 {
        1.0
    } else {
        1.0 / (1.0 + distance)
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// In-memory collection of embedded chunks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LocalIndex {
    /// Embedding model the vectors came from.
    pub model: String,
    /// Vector dimensionality; `0` until the first record is added.
    pub dim: usize,
    records: Vec<RagRecord>,
}

impl LocalIndex {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            dim: 0,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a record; the first record fixes the dimensionality.
    pub fn push(&mut self, record: RagRecord) -> Result<(), RagError> {
        let got = record.embedding.len();
        if self.dim == 0 {
            self.dim = got;
        } else if got != self.dim {
            return Err(RagError::VectorSizeMismatch {
                got,
                want: self.dim,
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Top-`k` records by ascending L2 distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RagHit>, RagError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(RagError::VectorSizeMismatch {
                got: query.len(),
                want: self.dim,
            });
        }

        let mut scored: Vec<(f32, &RagRecord)> = self
            .records
            .iter()
            .map(|r| (l2_distance(query, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let hits = scored
            .into_iter()
            .take(k)
            .map(|(distance, r)| RagHit {
                score: distance_to_similarity(distance),
                distance,
                text: r.chunk.text.clone(),
                source: Some(r.chunk.source.clone()),
                page: Some(r.chunk.page),
            })
            .collect::<Vec<_>>();

        debug!(k, hits = hits.len(), "index search");
        Ok(hits)
    }

    /// Reads an index written by [`LocalIndex::save`].
    pub fn load(path: &Path) -> Result<Self, RagError> {
        if !path.is_file() {
            return Err(RagError::IndexMissing(path.display().to_string()));
        }
        let raw = fs::read(path)?;
        let index: Self = serde_json::from_slice(&raw)?;
        info!(path = %path.display(), records = index.len(), dim = index.dim, "loaded vector index");
        Ok(index)
    }

    /// Writes the index, replacing any previous file atomically.
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), records = self.len(), "saved vector index");
        Ok(())
    }
}
