// src/crawl/extract.rs
// =============================================================================
// Finds the resources an HTML page pulls in.
//
// We look at three kinds of elements, in document order:
// - <img>: src, plus the lazy-load attributes data-src and data-src-retina
// - <script src="...">
// - <link href="..."> whose rel contains the "stylesheet" token
//
// The values come back exactly as written in the page. Resolving them against
// the page URL is the normalizer's job.
//
// Malformed HTML is fine: html5ever (under scraper) recovers the way browsers
// do, so we simply get whatever elements it could make sense of.
// =============================================================================

use scraper::{ElementRef, Html, Selector};

// Attributes on <img> that may hold an image URL, most important first
pub const IMG_SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-src-retina"];

/// Returns every candidate reference in `html`, in document order
///
/// The parsed DOM is not Send, so it is dropped before returning and the
/// caller gets a plain Vec it may hold across an .await.
pub fn extract_references(html: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);

    // Constant selector, known to be valid
    let selector = Selector::parse("img, script[src], link[href]").unwrap();

    let mut references = Vec::new();
    for element in document.select(&selector) {
        collect_from_element(element, &mut references);
    }

    references
}

fn collect_from_element(element: ElementRef<'_>, out: &mut Vec<String>) {
    let value = element.value();
    match value.name() {
        "img" => {
            for attr in IMG_SOURCE_ATTRS {
                if let Some(src) = value.attr(attr) {
                    out.push(src.to_string());
                }
            }
        }
        "script" => {
            if let Some(src) = value.attr("src") {
                out.push(src.to_string());
            }
        }
        "link" => {
            if is_stylesheet(value.attr("rel")) {
                if let Some(href) = value.attr("href") {
                    out.push(href.to_string());
                }
            }
        }
        _ => {}
    }
}

// rel is a space separated token list, e.g. rel="preload stylesheet"
pub fn is_stylesheet(rel: Option<&str>) -> bool {
    rel.map(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<String> {
        extract_references(html.as_bytes())
    }

    #[test]
    fn test_three_reference_kinds_in_document_order() {
        let html = r#"
            <html><head></head><body>
            <img src="https://x/y.png">
            <script src="/z.js"></script>
            <link rel="stylesheet" href="s.css">
            </body></html>
        "#;
        assert_eq!(extract(html), vec!["https://x/y.png", "/z.js", "s.css"]);
    }

    #[test]
    fn test_lazy_load_image_attributes() {
        let html = r#"<img src="small.png" data-src="large.png" data-src-retina="large@2x.png">"#;
        assert_eq!(extract(html), vec!["small.png", "large.png", "large@2x.png"]);
    }

    #[test]
    fn test_only_stylesheet_links() {
        let html = r#"
            <link rel="icon" href="favicon.ico">
            <link rel="canonical" href="https://example.com/">
            <link rel="Stylesheet" href="a.css">
            <link rel="preload stylesheet" href="b.css">
            <link href="no-rel.css">
        "#;
        assert_eq!(extract(html), vec!["a.css", "b.css"]);
    }

    #[test]
    fn test_inline_script_and_plain_links_ignored() {
        let html = r#"
            <script>console.log("inline")</script>
            <a href="/other-page">Other</a>
            <img alt="no source">
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_malformed_html_still_yields_references() {
        let html = r#"<div><img src="a.png"<p>unclosed <script src="b.js"></div></body>"#;
        let refs = extract(html);
        assert!(refs.contains(&"b.js".to_string()) || refs.contains(&"a.png".to_string()));
    }

    #[test]
    fn test_binary_garbage_yields_nothing() {
        let refs = extract_references(&[0xff, 0xfe, 0x00, 0x12, 0x80]);
        assert!(refs.is_empty());
    }
}
