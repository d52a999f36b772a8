//! Document text extraction.

use std::path::Path;

use tracing::debug;

use crate::error::{RecommenderError, Result};

/// An uploaded contract: an identifier plus its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier, normally the filename stem.
    pub id: String,

    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    /// Identifier for a file on disk: its name with the last extension
    /// removed (`nda.v2.pdf` becomes `nda.v2`).
    pub fn id_from_path(path: &Path) -> Option<String> {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }
}

/// Turns a document into plain text.
pub trait TextExtractor: Send + Sync {
    /// Full text of `document`, pages joined by newlines.
    fn extract(&self, document: &Document) -> Result<String>;
}

/// PDF extractor backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, document: &Document) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(&document.bytes).map_err(|e| {
            RecommenderError::Extraction {
                document_id: document.id.clone(),
                reason: e.to_string(),
            }
        })?;
        debug!(
            document = %document.id,
            chars = text.chars().count(),
            "extracted text"
        );
        Ok(text)
    }
}

/// Treats the bytes as UTF-8 text. Useful for plain-text contracts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, document: &Document) -> Result<String> {
        String::from_utf8(document.bytes.clone()).map_err(|e| RecommenderError::Extraction {
            document_id: document.id.clone(),
            reason: e.to_string(),
        })
    }
}
