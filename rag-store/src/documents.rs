//! PDF discovery and per-page text extraction.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::RagError;
use crate::record::Document;

/// Lists `*.pdf` files directly under `dir`, sorted by path.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, RagError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "data directory does not exist");
        return Ok(Vec::new());
    }

    let mut out: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|x| x.to_str())
                    .is_some_and(|x| x.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    out.sort();
    Ok(out)
}

/// Loads every PDF under `dir` as one [`Document`] per page.
///
/// Unreadable files and pages without text are logged and skipped.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>, RagError> {
    let mut docs = Vec::new();
    for path in discover_pdfs(dir)? {
        match load_pdf(&path) {
            Ok(mut pages) => {
                info!(file = %path.display(), pages = pages.len(), "loaded pdf");
                docs.append(&mut pages);
            }
            Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable pdf"),
        }
    }
    Ok(docs)
}

/// Extracts the text of each page of a single PDF.
pub fn load_pdf(path: &Path) -> Result<Vec<Document>, RagError> {
    let source = path.display().to_string();
    let pdf = lopdf::Document::load(path).map_err(|e| RagError::Pdf {
        path: source.clone(),
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    for page in pdf.get_pages().into_keys() {
        match pdf.extract_text(&[page]) {
            Ok(text) if !text.trim().is_empty() => out.push(Document {
                text,
                source: source.clone(),
                page,
            }),
            Ok(_) => debug!(file = %source, page, "empty page"),
            Err(e) => warn!(file = %source, page, error = %e, "page text extraction failed"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dir_yields_no_documents() {
        let docs = load_documents(Path::new("definitely/not/here")).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn discovery_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.PDF"), b"x").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = discover_pdfs(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn broken_pdf_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();
        assert!(load_documents(dir.path()).unwrap().is_empty());
    }
}
