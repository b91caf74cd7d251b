// src/packer/webarchive.rs
// =============================================================================
// Safari .webarchive encoding.
//
// A webarchive is a binary property list:
//
//   {
//     WebMainResource: { WebResourceURL, WebResourceMIMEType, WebResourceData,
//                        WebResourceResponse?, WebResourceTextEncodingName? },
//     WebSubresources: [ same shape, ... ]
//   }
//
// Optional keys are left out when we have nothing for them, and an empty
// WebSubresources array is omitted the same way Safari does.
// =============================================================================

use crate::archive::{ArchiveDocument, ResourceItem};
use crate::error::PackError;
use plist::{Dictionary, Value};

const MAIN_RESOURCE: &str = "WebMainResource";
const SUBRESOURCES: &str = "WebSubresources";
const URL: &str = "WebResourceURL";
const MIME_TYPE: &str = "WebResourceMIMEType";
const DATA: &str = "WebResourceData";
const RESPONSE: &str = "WebResourceResponse";
const TEXT_ENCODING: &str = "WebResourceTextEncodingName";

pub fn encode(document: &ArchiveDocument) -> Result<Vec<u8>, PackError> {
    let mut root = Dictionary::new();
    root.insert(MAIN_RESOURCE.to_string(), item_to_value(&document.main));
    if !document.subresources.is_empty() {
        let subresources = document.subresources.iter().map(item_to_value).collect();
        root.insert(SUBRESOURCES.to_string(), Value::Array(subresources));
    }

    let mut out = Vec::new();
    Value::Dictionary(root)
        .to_writer_binary(&mut out)
        .map_err(|e| PackError::Encoding(format!("property list: {}", e)))?;
    Ok(out)
}

fn item_to_value(item: &ResourceItem) -> Value {
    let mut dict = Dictionary::new();
    dict.insert(URL.to_string(), Value::String(item.url.clone()));
    dict.insert(MIME_TYPE.to_string(), Value::String(item.mime_type.clone()));
    dict.insert(DATA.to_string(), Value::Data(item.data.clone()));
    if let Some(response) = &item.response {
        dict.insert(RESPONSE.to_string(), Value::Data(response.clone()));
    }
    if let Some(encoding) = &item.text_encoding_name {
        dict.insert(TEXT_ENCODING.to_string(), Value::String(encoding.clone()));
    }
    Value::Dictionary(dict)
}

/// Reads a webarchive back into a document
#[cfg(test)]
pub fn decode(bytes: &[u8]) -> Result<ArchiveDocument, PackError> {
    let root = Value::from_reader(std::io::Cursor::new(bytes))
        .map_err(|e| PackError::Encoding(format!("property list: {}", e)))?;
    let root = root
        .as_dictionary()
        .ok_or_else(|| malformed("root is not a dictionary"))?;

    let main = root
        .get(MAIN_RESOURCE)
        .ok_or_else(|| malformed("missing WebMainResource"))
        .and_then(value_to_item)?;

    let subresources = match root.get(SUBRESOURCES) {
        Some(value) => value
            .as_array()
            .ok_or_else(|| malformed("WebSubresources is not an array"))?
            .iter()
            .map(value_to_item)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(ArchiveDocument { main, subresources })
}

#[cfg(test)]
fn value_to_item(value: &Value) -> Result<ResourceItem, PackError> {
    let dict = value
        .as_dictionary()
        .ok_or_else(|| malformed("resource is not a dictionary"))?;

    let string = |key: &str| dict.get(key).and_then(Value::as_string).map(str::to_string);
    let data = |key: &str| dict.get(key).and_then(Value::as_data).map(<[u8]>::to_vec);

    Ok(ResourceItem {
        url: string(URL).ok_or_else(|| malformed("resource without URL"))?,
        mime_type: string(MIME_TYPE).ok_or_else(|| malformed("resource without MIME type"))?,
        data: data(DATA).unwrap_or_default(),
        response: data(RESPONSE),
        text_encoding_name: string(TEXT_ENCODING),
    })
}

#[cfg(test)]
fn malformed(reason: &str) -> PackError {
    PackError::Encoding(format!("malformed webarchive: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::item;

    fn document() -> ArchiveDocument {
        let mut main = item("https://example.com/", "text/html", b"<html><img src=a.png></html>");
        main.text_encoding_name = Some("UTF-8".to_string());
        let mut png = item("https://example.com/a.png", "image/png", &[0x89, 0x50, 0x4e, 0x47, 0, 1, 2]);
        png.response = Some(vec![1, 2, 3]);
        ArchiveDocument {
            main,
            subresources: vec![png, item("https://example.com/s.css", "text/css", b"")],
        }
    }

    #[test]
    fn test_round_trip_keeps_every_field() {
        let doc = document();
        let bytes = encode(&doc).unwrap();
        assert!(bytes.starts_with(b"bplist00"));
        assert_eq!(decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_safari_key_layout() {
        let bytes = encode(&document()).unwrap();
        let root = Value::from_reader(std::io::Cursor::new(bytes)).unwrap();
        let root = root.as_dictionary().unwrap();

        let main = root.get("WebMainResource").unwrap().as_dictionary().unwrap();
        assert_eq!(main.get("WebResourceURL").unwrap().as_string(), Some("https://example.com/"));
        assert_eq!(main.get("WebResourceMIMEType").unwrap().as_string(), Some("text/html"));
        assert_eq!(main.get("WebResourceTextEncodingName").unwrap().as_string(), Some("UTF-8"));
        assert!(main.get("WebResourceResponse").is_none());

        let subs = root.get("WebSubresources").unwrap().as_array().unwrap();
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn test_no_subresources_key_when_empty() {
        let doc = ArchiveDocument {
            main: item("https://example.com/", "text/html", b"<p>hi</p>"),
            subresources: Vec::new(),
        };
        let bytes = encode(&doc).unwrap();
        let root = Value::from_reader(std::io::Cursor::new(&bytes[..])).unwrap();
        assert!(root.as_dictionary().unwrap().get("WebSubresources").is_none());
        assert_eq!(decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not a plist"), Err(PackError::Encoding(_))));
    }
}
