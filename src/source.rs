//! Turning document files into numbered pages of raw text.

use std::panic;
use std::path::Path;

use tracing::debug;

use crate::error::DocumentUnavailable;

/// Page separator in plain-text documents.
pub const FORM_FEED: char = '\x0c';

/// Reads a document into `(page_number, raw_text)` pairs, pages numbered
/// from 1 in document order.
pub trait PageSource: Send + Sync {
    fn pages(&self, path: &Path) -> Result<Vec<(u32, String)>, DocumentUnavailable>;
}

/// Reads PDFs with `pdf-extract` and `.txt`/`.md` files split on form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl PageSource for FileSource {
    fn pages(&self, path: &Path) -> Result<Vec<(u32, String)>, DocumentUnavailable> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let bytes = std::fs::read(path).map_err(|e| unavailable(path, e.to_string()))?;
        let pages = match ext.as_str() {
            "pdf" => pdf_pages(&bytes).map_err(|reason| unavailable(path, reason))?,
            "txt" | "md" => text_pages(&String::from_utf8_lossy(&bytes)),
            other => return Err(unavailable(path, format!("unsupported file type `{}`", other))),
        };

        debug!(path = %path.display(), pages = pages.len(), "read document");
        Ok(number(pages))
    }
}

fn pdf_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    // pdf-extract panics on some malformed inputs
    panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| "PDF parser panicked".to_string())?
        .map_err(|e| e.to_string())
}

/// Split on form feeds; a trailing separator does not start a new page.
pub fn text_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn number(pages: Vec<String>) -> Vec<(u32, String)> {
    pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| (i as u32 + 1, text))
        .collect()
}

fn unavailable(path: &Path, reason: impl Into<String>) -> DocumentUnavailable {
    DocumentUnavailable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
