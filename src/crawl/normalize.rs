// src/crawl/normalize.rs
// =============================================================================
// Turns a reference found in a page into a URL we can fetch.
//
// Rules:
// - Empty references and bare "#anchor" references are rejected
// - Absolute references are parsed as-is, relative ones are joined onto the
//   page URL the same way a browser resolves them
// - The fragment is always stripped (it never reaches the server)
// - Only http and https survive; data:, javascript:, mailto:, blob: etc. are
//   rejected
//
// Rejection is silent: the caller just doesn't enqueue anything.
// =============================================================================

use url::Url;

/// Resolves `reference` against `base`, returning None when it cannot be fetched
pub fn resolve(reference: &str, base: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    // Absolute URLs parse on their own; anything else is relative to the page
    let mut url = match Url::parse(reference) {
        Ok(url) => url,
        Err(_) => base.join(reference).ok()?,
    };

    url.set_fragment(None);

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}
