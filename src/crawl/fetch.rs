// src/crawl/fetch.rs
// =============================================================================
// Downloads one URL and turns the response into a ResourceItem.
//
// Steps:
// 1. (optional) refuse a URL whose host is a private IP literal
// 2. GET with the configured headers and timeout
// 3. Anything but a 2xx status is a Network error
// 4. Decode the body according to Content-Encoding (identity, gzip, deflate)
// 5. Split Content-Type into MIME type and charset
//
// reqwest is built without its gzip/deflate features, so the body arrives
// exactly as the server sent it and decoding happens here.
//
// Private-network blocking lives inside the HTTP client, not in front of it:
// - a custom DNS resolver refuses names that resolve to private addresses, so
//   the address we check is the address we connect to
// - a redirect policy re-checks every hop, so a public page cannot bounce the
//   request to 169.254.169.254 or localhost
// IP-literal hosts never reach the resolver, which is why they are checked
// both up front and in the redirect policy.
// =============================================================================

use crate::archive::ResourceItem;
use crate::config::CrawlConfig;
use crate::error::PackError;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{redirect, Client, ClientBuilder};
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use url::{Host, Url};

const FALLBACK_MIME: &str = "application/octet-stream";
const MAX_REDIRECTS: usize = 10;

/// HTTP transport shared by all workers of one crawl
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    config: Arc<CrawlConfig>,
}

impl Fetcher {
    pub fn new(config: Arc<CrawlConfig>) -> Result<Self, PackError> {
        let builder = client_builder(&config);
        Self::from_builder(config, builder)
    }

    fn from_builder(config: Arc<CrawlConfig>, builder: ClientBuilder) -> Result<Self, PackError> {
        let client = builder
            .build()
            .map_err(|e| PackError::InvalidInput(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub async fn fetch(&self, url: &str) -> Result<ResourceItem, PackError> {
        if self.config.block_private_network {
            if let Some(ip) = Url::parse(url).ok().as_ref().and_then(private_literal) {
                return Err(PackError::network(
                    url,
                    format!("private network destination {} is blocked", ip),
                ));
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PackError::network(url, describe_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PackError::network(url, format!("HTTP {}", status)));
        }

        let content_type = header_string(&response, CONTENT_TYPE);
        let content_encoding = header_string(&response, CONTENT_ENCODING);

        let raw = response
            .bytes()
            .await
            .map_err(|e| PackError::network(url, describe_error(&e)))?;
        let data = decode_body(url, content_encoding.as_deref(), &raw)?;

        let (mime_type, text_encoding_name) = split_content_type(content_type.as_deref());

        Ok(ResourceItem {
            url: url.to_string(),
            mime_type,
            data,
            response: None,
            text_encoding_name,
        })
    }
}

fn client_builder(config: &CrawlConfig) -> ClientBuilder {
    let builder = Client::builder()
        .timeout(config.timeout)
        .default_headers(config.headers.clone());

    if config.block_private_network {
        builder
            .dns_resolver(Arc::new(PublicOnlyResolver))
            .redirect(public_only_redirects())
    } else {
        builder.redirect(redirect::Policy::limited(MAX_REDIRECTS))
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

// Gives reqwest errors a short, readable reason
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        format!("redirect refused: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

/// Decodes `raw` for a Content-Encoding header value
///
/// Several codings may be listed ("gzip, identity"); they were applied in
/// order, so they are undone in reverse.
pub fn decode_body(url: &str, encoding: Option<&str>, raw: &[u8]) -> Result<Vec<u8>, PackError> {
    let Some(encoding) = encoding else {
        return Ok(raw.to_vec());
    };
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut data = raw.to_vec();
    for coding in encoding.rsplit(',') {
        let coding = coding.trim().to_ascii_lowercase();
        data = match coding.as_str() {
            "" | "identity" => data,
            "gzip" | "x-gzip" => read_all(GzDecoder::new(data.as_slice()))
                .map_err(|e| PackError::decode(url, &coding, e))?,
            "deflate" => inflate(&data).map_err(|e| PackError::decode(url, &coding, e))?,
            _ => {
                return Err(PackError::decode(url, &coding, "unsupported content encoding"));
            }
        };
    }

    Ok(data)
}

// HTTP "deflate" is supposed to be zlib-wrapped, but plenty of servers send
// raw DEFLATE. The zlib header is two bytes whose big-endian value is a
// multiple of 31 with compression method 8.
fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let zlib_wrapped = data.len() >= 2
        && data[0] & 0x0f == 8
        && (u16::from(data[0]) << 8 | u16::from(data[1])) % 31 == 0;

    if zlib_wrapped {
        if let Ok(out) = read_all(ZlibDecoder::new(data)) {
            return Ok(out);
        }
    }
    read_all(DeflateDecoder::new(data))
}

fn read_all(mut reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

/// Splits "text/html; charset=UTF-8" into ("text/html", Some("UTF-8"))
pub fn split_content_type(content_type: Option<&str>) -> (String, Option<String>) {
    let Some(content_type) = content_type else {
        return (FALLBACK_MIME.to_string(), None);
    };

    let mut parts = content_type.split(';');
    let mime = parts
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let charset = parts.find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    });

    (mime, charset)
}

// Resolves names like the system resolver does, but fails the lookup when any
// address is private
#[derive(Debug)]
struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name))
    }
}

async fn resolve_public(name: Name) -> Result<Addrs, Box<dyn std::error::Error + Send + Sync>> {
    let host = name.as_str();
    // Port 0: the client fills in the port from the URL
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0)).await?.collect();
    if let Some(addr) = addrs.iter().find(|addr| is_private_address(addr.ip())) {
        let reason = format!("private network destination {} ({}) is blocked", addr.ip(), host);
        return Err(reason.into());
    }
    Ok(Box::new(addrs.into_iter()))
}

fn public_only_redirects() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match private_literal(attempt.url()) {
            Some(ip) => attempt.error(format!("redirect to private network destination {} is blocked", ip)),
            None => attempt.follow(),
        }
    })
}

// The host as a private IP, when it is written as an IP address
fn private_literal(url: &Url) -> Option<IpAddr> {
    let ip = match url.host()? {
        Host::Ipv4(ip) => IpAddr::V4(ip),
        Host::Ipv6(ip) => IpAddr::V6(ip),
        Host::Domain(_) => return None,
    };
    is_private_address(ip).then_some(ip)
}

pub fn is_private_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // 100.64.0.0/10, carrier-grade NAT
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_address(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local
                || (first & 0xffc0) == 0xfe80 // link local
        }
    }
}
