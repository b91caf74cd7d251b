// src/archive.rs
// =============================================================================
// The data that comes out of a crawl.
//
// A ResourceItem is one fetched asset. An ArchiveDocument is the finished
// result: one main resource (the page) plus every sub-resource it pulled in.
// Both encoders (webarchive and html) only ever see an ArchiveDocument, so
// nothing format-specific leaks into the crawler.
// =============================================================================

use serde::Serialize;

/// One fetched asset
///
/// Built by a fetch worker after a successful download and never changed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    /// Normalized URL the item was fetched from (unique within a document)
    pub url: String,
    /// MIME essence, e.g. "text/html" (no parameters)
    pub mime_type: String,
    /// Decoded response body
    pub data: Vec<u8>,
    /// Raw response metadata, kept opaque
    pub response: Option<Vec<u8>>,
    /// Charset from the Content-Type header, e.g. "utf-8"
    pub text_encoding_name: Option<String>,
}

impl ResourceItem {
    pub fn is_html(&self) -> bool {
        is_html_mime(&self.mime_type)
    }
}

pub fn is_html_mime(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// The aggregate a crawl produces: exactly one main resource and the rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDocument {
    pub main: ResourceItem,
    pub subresources: Vec<ResourceItem>,
}

impl ArchiveDocument {
    // Partitions items that are already in completion order: the first one
    // becomes the main resource. Returns None for an empty crawl.
    pub fn from_completed(items: Vec<ResourceItem>) -> Option<Self> {
        let mut items = items.into_iter();
        let main = items.next()?;
        Some(Self {
            main,
            subresources: items.collect(),
        })
    }

    pub fn total_bytes(&self) -> usize {
        self.main.data.len() + self.subresources.iter().map(|r| r.data.len()).sum::<usize>()
    }

    #[cfg(test)]
    pub fn find(&self, url: &str) -> Option<&ResourceItem> {
        std::iter::once(&self.main)
            .chain(self.subresources.iter())
            .find(|r| r.url == url)
    }

    pub fn report(&self, output: &str) -> PackReport {
        PackReport {
            output: output.to_string(),
            main_url: self.main.url.clone(),
            main_mime_type: self.main.mime_type.clone(),
            subresources: self.subresources.len(),
            total_bytes: self.total_bytes(),
        }
    }
}

/// Summary printed after a successful pack
#[derive(Debug, Clone, Serialize)]
pub struct PackReport {
    pub output: String,
    pub main_url: String,
    pub main_mime_type: String,
    pub subresources: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
pub(crate) fn item(url: &str, mime: &str, data: &[u8]) -> ResourceItem {
    ResourceItem {
        url: url.to_string(),
        mime_type: mime.to_string(),
        data: data.to_vec(),
        response: None,
        text_encoding_name: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_completed_becomes_main() {
        let doc = ArchiveDocument::from_completed(vec![
            item("https://example.com/", "text/html", b"<html></html>"),
            item("https://example.com/a.png", "image/png", b"png"),
            item("https://example.com/b.js", "text/javascript", b"js"),
        ])
        .unwrap();

        assert_eq!(doc.main.url, "https://example.com/");
        let subs: Vec<_> = doc.subresources.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(subs, vec!["https://example.com/a.png", "https://example.com/b.js"]);
        assert_eq!(doc.total_bytes(), 13 + 3 + 2);
    }

    #[test]
    fn test_empty_crawl_has_no_document() {
        assert!(ArchiveDocument::from_completed(Vec::new()).is_none());
    }

    #[test]
    fn test_html_mime_detection() {
        assert!(is_html_mime("text/html"));
        assert!(is_html_mime("TEXT/HTML"));
        assert!(is_html_mime("application/xhtml+xml"));
        assert!(!is_html_mime("text/css"));
    }
}
