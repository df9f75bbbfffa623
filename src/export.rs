//! Downloadable insight reports.
//!
//! Reports are rendered on demand from the session's filename, document text
//! and last insight. Nothing is written to disk.

use chrono::{DateTime, Local};
use serde::Deserialize;

/// Characters of document text included in a report excerpt.
pub const EXCERPT_CHARS: usize = 2000;

/// Timestamp layout used in report headers.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FOOTER: &str = "*Generated by Document Insights Generator*";

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain-text report.
    #[default]
    Txt,
    /// Markdown report.
    Md,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Md => "md",
        }
    }

    /// `Content-Type` for the download.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Txt => "text/plain; charset=utf-8",
            Self::Md => "text/markdown; charset=utf-8",
        }
    }

    /// Download name for a report on `filename`.
    #[must_use]
    pub fn file_name(self, filename: &str) -> String {
        format!("{filename}_insights.{}", self.extension())
    }
}

/// Inputs of a report.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    /// Original upload name.
    pub filename: &'a str,
    /// Question that produced the insight.
    pub question: &'a str,
    /// Generated insight.
    pub insight: &'a str,
    /// Full extracted document text.
    pub document_text: &'a str,
    /// Render time shown in the header.
    pub generated_at: DateTime<Local>,
}

/// A rendered report ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Suggested download name.
    pub file_name: String,
    /// MIME type.
    pub content_type: &'static str,
    /// Report body.
    pub body: String,
}

/// Render `input` in `format`.
#[must_use]
pub fn render(format: ExportFormat, input: &ReportInput<'_>) -> Report {
    let body = match format {
        ExportFormat::Txt => render_text(input),
        ExportFormat::Md => render_markdown(input),
    };
    Report {
        file_name: format.file_name(input.filename),
        content_type: format.content_type(),
        body,
    }
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn render_text(input: &ReportInput<'_>) -> String {
    let rule = "=".repeat(80);
    format!(
        "Document: {filename}
Question: {question}
Generated: {generated}

{rule}

INSIGHTS:

{insight}

{rule}

Document Text (excerpt):
{excerpt}...
",
        filename = input.filename,
        question = input.question,
        generated = input.generated_at.format(TIMESTAMP_FORMAT),
        insight = input.insight,
        excerpt = excerpt(input.document_text),
    )
}

fn render_markdown(input: &ReportInput<'_>) -> String {
    // Two trailing spaces force markdown line breaks in the header block.
    format!(
        "# Document Insights

**Document:** {filename}  \n**Question:** {question}  \n**Generated:** {generated}

---

## Insights

{insight}

---

## Document Excerpt

{excerpt}...

---

{FOOTER}
",
        filename = input.filename,
        question = input.question,
        generated = input.generated_at.format(TIMESTAMP_FORMAT),
        insight = input.insight,
        excerpt = excerpt(input.document_text),
    )
}
