//! Document text extraction.
//!
//! Turns the raw bytes of an uploaded file into plain text. The extractor
//! dispatches on the declared MIME type (or the filename extension) to one of
//! three routines:
//!
//! - PDF via `lopdf`, page by page (`pdf` feature)
//! - DOCX via `docx-rs`, paragraph by paragraph (`docx` feature)
//! - plain text, decoded as lossy UTF-8 (always available)
//!
//! Extraction never panics past this module: parser errors and parser panics
//! both come back as [`ExtractionError::ExtractionFailed`].
//!
//! # Example
//!
//! ```rust
//! use doc_insights::extract::{Capabilities, Extractor, UploadedFile};
//!
//! let extractor = Extractor::new(Capabilities::detect());
//! let file = UploadedFile::new("notes.txt", Some("text/plain".into()), b"  hello  ".to_vec());
//! let extracted = extractor.extract(&file).unwrap();
//! assert_eq!(extracted.text, "hello");
//! ```

#[cfg(feature = "docx")]
mod docx;
mod kind;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

pub use kind::DocumentKind;

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;

/// Characters shown in an extraction preview.
pub const PREVIEW_CHARS: usize = 1000;

/// A file as received from the user. Immutable once constructed.
#[derive(Clone)]
pub struct UploadedFile {
    /// Original filename.
    pub filename: String,
    /// MIME type declared by the client, if any.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Create a new uploaded file.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Successfully extracted document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Extracted text, trimmed.
    pub text: String,
    /// Format the text was extracted from.
    pub kind: DocumentKind,
}

impl ExtractedText {
    /// Number of characters in the extracted text.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Return the first `limit` characters of `text`, marking a cut with `...`.
#[must_use]
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Errors that can occur during extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// Support for the format was not compiled into this build.
    #[error("{feature} support not available. Rebuild with the `{cargo_feature}` feature enabled.")]
    CapabilityUnavailable {
        /// Human-readable format name.
        feature: &'static str,
        /// Cargo feature that provides it.
        cargo_feature: &'static str,
    },

    /// The file is not one of the supported formats.
    #[error("Unsupported file format ({0}). Please upload PDF, DOCX, or TXT files.")]
    UnsupportedFormat(String),

    /// The parser rejected the file.
    #[error("Error extracting {format}: {message}")]
    ExtractionFailed {
        /// Format being parsed.
        format: &'static str,
        /// Underlying parser message.
        message: String,
    },
}

impl ExtractionError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CapabilityUnavailable { .. } => "capability_unavailable",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::ExtractionFailed { .. } => "extraction_failed",
        }
    }
}

/// Optional parser support present in this build.
///
/// Probed once at startup with [`Capabilities::detect`] and handed to the
/// [`Extractor`]; the extractor never checks features on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// PDF parsing is available.
    pub pdf: bool,
    /// DOCX parsing is available.
    pub docx: bool,
}

impl Capabilities {
    /// Probe the compiled-in parser features.
    #[must_use]
    pub fn detect() -> Self {
        let capabilities = Self {
            pdf: cfg!(feature = "pdf"),
            docx: cfg!(feature = "docx"),
        };
        tracing::info!(
            pdf = capabilities.pdf,
            docx = capabilities.docx,
            "Document parser capabilities detected"
        );
        capabilities
    }

    /// Whether the given format can be extracted.
    #[must_use]
    pub fn supports(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Pdf => self.pdf,
            DocumentKind::Docx => self.docx,
            DocumentKind::PlainText => true,
        }
    }
}

/// Dispatches uploaded files to the matching text-extraction routine.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    capabilities: Capabilities,
}

impl Extractor {
    /// Create an extractor limited to the given capabilities.
    #[must_use]
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// Capabilities this extractor was built with.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Extract text from an uploaded file.
    pub fn extract(&self, file: &UploadedFile) -> Result<ExtractedText, ExtractionError> {
        let Some(kind) = DocumentKind::detect(file.content_type.as_deref(), &file.filename) else {
            let described = file
                .content_type
                .clone()
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| file.filename.clone());
            tracing::warn!(
                filename = %file.filename,
                content_type = ?file.content_type,
                "Rejected upload with unsupported format"
            );
            return Err(ExtractionError::UnsupportedFormat(described));
        };

        self.extract_kind(kind, &file.bytes)
    }

    /// Extract text from bytes already known to be of `kind`.
    pub fn extract_kind(
        &self,
        kind: DocumentKind,
        bytes: &[u8],
    ) -> Result<ExtractedText, ExtractionError> {
        tracing::debug!(kind = %kind, size = bytes.len(), "Extracting document text");

        let text = match kind {
            DocumentKind::Pdf if !self.capabilities.pdf => return Err(unavailable("PDF", "pdf")),
            DocumentKind::Docx if !self.capabilities.docx => {
                return Err(unavailable("DOCX", "docx"));
            }
            DocumentKind::Pdf => extract_pdf(bytes)?,
            DocumentKind::Docx => extract_docx(bytes)?,
            DocumentKind::PlainText => text::extract_text(bytes),
        };

        let extracted = ExtractedText { text, kind };
        tracing::info!(kind = %kind, chars = extracted.char_count(), "Document text extracted");

        Ok(extracted)
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    guarded(DocumentKind::Pdf, || pdf::extract_text(bytes))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(unavailable("PDF", "pdf"))
}

#[cfg(feature = "docx")]
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    guarded(DocumentKind::Docx, || docx::extract_text(bytes))
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(unavailable("DOCX", "docx"))
}

fn unavailable(feature: &'static str, cargo_feature: &'static str) -> ExtractionError {
    tracing::warn!(feature, cargo_feature, "Parser for format is not compiled in");
    ExtractionError::CapabilityUnavailable {
        feature,
        cargo_feature,
    }
}

/// Run a parser, converting both its error and any panic into
/// [`ExtractionError::ExtractionFailed`].
///
/// Third-party parsers can panic on malformed fonts or archives.
#[cfg_attr(not(any(feature = "pdf", feature = "docx")), allow(dead_code))]
fn guarded<F, E>(kind: DocumentKind, parse: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, E>,
    E: std::fmt::Display,
{
    match catch_unwind(AssertUnwindSafe(parse)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            tracing::warn!(kind = %kind, error = %e, "Parser rejected document");
            Err(ExtractionError::ExtractionFailed {
                format: kind.label(),
                message: e.to_string(),
            })
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "parser panicked on malformed input".to_string());
            tracing::error!(kind = %kind, error = %message, "Parser panicked");
            Err(ExtractionError::ExtractionFailed {
                format: kind.label(),
                message,
            })
        }
    }
}
