//! Supported document formats and type detection.

use std::path::Path;

use serde::Serialize;

/// MIME type of `.docx` files.
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A document format the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word processing document.
    Docx,
    /// UTF-8 plain text.
    #[serde(rename = "txt")]
    PlainText,
}

impl DocumentKind {
    /// All supported kinds, in detection order.
    pub const ALL: [Self; 3] = [Self::Pdf, Self::Docx, Self::PlainText];

    /// Canonical MIME type.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_MIME,
            Self::PlainText => "text/plain",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::PlainText => "txt",
        }
    }

    /// Short name used in messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::PlainText => "TXT",
        }
    }

    /// Resolve the format from a declared MIME type and/or a filename.
    ///
    /// Kinds are tried in [`DocumentKind::ALL`] order; a kind matches when
    /// the declared type is its MIME type or the filename ends in its
    /// extension (any case). MIME parameters such as `; charset=utf-8` are
    /// ignored. Other text-like extensions (`.log`, `.ini`, ...) do not match.
    #[must_use]
    pub fn detect(content_type: Option<&str>, filename: &str) -> Option<Self> {
        let declared = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str());

        Self::ALL.into_iter().find(|kind| {
            declared.as_deref() == Some(kind.mime_type())
                || extension.is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension()))
        })
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
