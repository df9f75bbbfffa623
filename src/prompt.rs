//! Prompt assembly.
//!
//! Embeds the document text and the user's question into a fixed instruction
//! template. Document text is cut to [`MAX_DOCUMENT_CHARS`] characters so the
//! prompt stays within a bounded token budget; the cut is purely by character
//! count and makes no attempt to end on a sentence.
//!
//! Neither input is escaped. A document or question that contains
//! instructions of its own will reach the model as-is.

/// Maximum number of document characters embedded in a prompt.
pub const MAX_DOCUMENT_CHARS: usize = 12_000;

/// Appended after the document text when it was cut.
pub const TRUNCATION_MARKER: &str = "\n\n[Document truncated for processing...]";

/// System message attached to every completion request.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides clear, detailed document analysis.";

/// Cut `text` to at most [`MAX_DOCUMENT_CHARS`] characters.
///
/// Returns the (possibly shortened) text with [`TRUNCATION_MARKER`] appended
/// when a cut happened, and whether it did.
#[must_use]
pub fn truncate_document(text: &str) -> (String, bool) {
    match text.char_indices().nth(MAX_DOCUMENT_CHARS) {
        Some((end, _)) => (format!("{}{TRUNCATION_MARKER}", &text[..end]), true),
        None => (text.to_string(), false),
    }
}

/// Build the user prompt for a question about a document.
#[must_use]
pub fn build_prompt(document_text: &str, question: &str) -> String {
    let (document_text, truncated) = truncate_document(document_text);
    if truncated {
        tracing::debug!(
            limit = MAX_DOCUMENT_CHARS,
            "Document text truncated for prompt"
        );
    }

    format!(
        "You are a helpful AI assistant that analyzes documents and provides clear, detailed insights.

Read the following document carefully and answer this question: {question}

Document:
{document_text}

Please provide a comprehensive answer based only on the information in the document. If the document doesn't contain enough information to answer the question, say so clearly."
    )
}
