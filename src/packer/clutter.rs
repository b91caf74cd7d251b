// src/packer/clutter.rs
// =============================================================================
// Optional noise reduction for the main page (--clutter-free).
//
// Navigation, page chrome, embedded frames, forms, ads, cookie banners and
// HTML comments are dropped from the main resource. Sub-resources are kept
// as they are; an image that is no longer referenced is just dead weight.
// =============================================================================

use crate::archive::ArchiveDocument;
use crate::error::PackError;
use lol_html::{doc_comments, element, HtmlRewriter, Settings};

// Everything matching one of these is removed together with its content
const NOISE_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    "aside",
    "iframe",
    "noscript",
    "form",
    "[class*=\"advert\"]",
    "[id*=\"advert\"]",
    "[class*=\"sponsor\"]",
    "[class*=\"cookie\"]",
    "[id*=\"cookie\"]",
    "[class*=\"popup\"]",
    "[class*=\"newsletter\"]",
];

pub fn make_clutter_free(mut document: ArchiveDocument) -> Result<ArchiveDocument, PackError> {
    if !document.main.is_html() {
        return Ok(document);
    }

    let handlers: Vec<_> = NOISE_SELECTORS
        .iter()
        .map(|selector| {
            element!(selector, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    let mut output = Vec::with_capacity(document.main.data.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            document_content_handlers: vec![doc_comments!(|comment| {
                comment.remove();
                Ok(())
            })],
            ..Settings::new()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(&document.main.data)
        .map_err(|e| PackError::Transform(e.to_string()))?;
    rewriter.end().map_err(|e| PackError::Transform(e.to_string()))?;

    document.main.data = output;
    Ok(document)
}
