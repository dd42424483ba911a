//! Page-ordered PDF text extraction
//!
//! Documents without an embedded text layer (pure scans) yield empty text;
//! the pipeline reports that as a failure at the stage check, not here.

use lopdf::Document;

/// Extract plain text from a PDF byte payload, page by page.
///
/// Pages are concatenated in page order, each followed by a line
/// separator; pages whose text is empty or whitespace-only are skipped
/// without emitting a blank line. Any failure (malformed document, broken
/// page) yields an empty string; no partial result escapes.
pub fn extract_text(data: &[u8]) -> String {
    match try_extract(data) {
        Ok(text) => text,
        Err(message) => {
            tracing::warn!("PDF text extraction failed: {}", message);
            String::new()
        }
    }
}

fn try_extract(data: &[u8]) -> Result<String, String> {
    let doc = Document::load_mem(data).map_err(|e| format!("failed to load PDF: {}", e))?;

    let pages = doc.get_pages();
    let total_pages = pages.len();
    let mut text = String::new();
    let mut pages_with_text = 0usize;

    for &page_number in pages.keys() {
        let page_text = doc
            .extract_text(&[page_number])
            .map_err(|e| format!("failed to extract page {}: {}", page_number, e))?;

        if page_text.trim().is_empty() {
            continue;
        }

        text.push_str(&page_text);
        text.push('\n');
        pages_with_text += 1;
    }

    tracing::debug!(
        "Extracted text from {} of {} page(s)",
        pages_with_text,
        total_pages
    );

    Ok(text)
}
