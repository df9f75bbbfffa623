//! PDF text extraction via `lopdf`.

use lopdf::Document;

/// Extract the text of every page, in page order, one page per line group.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();

    let mut out = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        let text = doc.extract_text(&[*page_number])?;
        // lopdf ends every text line with a newline; drop it so pages join
        // with exactly one. Leading indentation is kept.
        out.push(text.trim_end().to_string());
    }

    tracing::debug!(pages = out.len(), "PDF pages extracted");

    Ok(out.join("\n").trim().to_string())
}
