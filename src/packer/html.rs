// src/packer/html.rs
// =============================================================================
// Single-file HTML encoding.
//
// The main page is streamed through lol_html and every image, script and
// stylesheet reference that points at a fetched sub-resource is replaced by a
// data: URI holding that resource, so the file opens offline on its own.
//
// References are resolved exactly like the crawler resolved them, which is
// what makes them match the URLs stored in the document. References we never
// fetched are left untouched. url(...) references inside stylesheets are not
// rewritten.
// =============================================================================

use crate::archive::{ArchiveDocument, ResourceItem};
use crate::crawl::{is_stylesheet, resolve, IMG_SOURCE_ATTRS};
use crate::error::PackError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lol_html::{element, HtmlRewriter, Settings};
use std::collections::HashMap;
use url::Url;

pub fn encode(document: &ArchiveDocument) -> Result<Vec<u8>, PackError> {
    let main = &document.main;
    if !main.is_html() {
        return Err(PackError::Encoding(format!(
            "cannot flatten {}: main resource is {}, not HTML",
            main.url, main.mime_type
        )));
    }
    let base = Url::parse(&main.url)
        .map_err(|e| PackError::Encoding(format!("bad main resource URL {}: {}", main.url, e)))?;

    let inline: HashMap<&str, String> = document
        .subresources
        .iter()
        .map(|item| (item.url.as_str(), data_uri(item)))
        .collect();

    let mut output = Vec::with_capacity(main.data.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("img", |el| {
                    for attr in IMG_SOURCE_ATTRS {
                        let found = el.get_attribute(attr).and_then(|v| lookup(&inline, &base, &v));
                        if let Some(uri) = found {
                            el.set_attribute(attr, uri)?;
                        }
                    }
                    Ok(())
                }),
                element!("script[src]", |el| {
                    let found = el.get_attribute("src").and_then(|v| lookup(&inline, &base, &v));
                    if let Some(uri) = found {
                        el.set_attribute("src", uri)?;
                    }
                    Ok(())
                }),
                element!("link[href]", |el| {
                    if !is_stylesheet(el.get_attribute("rel").as_deref()) {
                        return Ok(());
                    }
                    let found = el.get_attribute("href").and_then(|v| lookup(&inline, &base, &v));
                    if let Some(uri) = found {
                        el.set_attribute("href", uri)?;
                    }
                    Ok(())
                }),
            ],
            ..Settings::new()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(&main.data)
        .map_err(|e| PackError::Encoding(format!("rewriting {}: {}", main.url, e)))?;
    rewriter
        .end()
        .map_err(|e| PackError::Encoding(format!("rewriting {}: {}", main.url, e)))?;

    Ok(output)
}

fn lookup<'a>(inline: &'a HashMap<&str, String>, base: &Url, reference: &str) -> Option<&'a str> {
    let url = resolve(reference, base)?;
    inline.get(url.as_str()).map(String::as_str)
}

fn data_uri(item: &ResourceItem) -> String {
    let mut uri = format!("data:{}", item.mime_type);
    if let Some(charset) = &item.text_encoding_name {
        uri.push_str(";charset=");
        uri.push_str(charset);
    }
    uri.push_str(";base64,");
    uri.push_str(&STANDARD.encode(&item.data));
    uri
}
