//! DOCX text extraction via `docx-rs`.

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};

/// Extract the text of every body paragraph, in document order.
///
/// Tables are skipped; only top-level paragraphs contribute.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, docx_rs::ReaderError> {
    let docx = docx_rs::read_docx(bytes)?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    tracing::debug!(paragraphs = paragraphs.len(), "DOCX paragraphs extracted");

    Ok(paragraphs.join("\n").trim().to_string())
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        match child {
            ParagraphChild::Run(run) => push_run(run, &mut text),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(run, &mut text);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
