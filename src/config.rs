// src/config.rs
// =============================================================================
// Immutable configuration for one pack run.
//
// The CLI layer builds a PackOptions once, validates it, and from then on it
// is only read. The crawl part (CrawlConfig) is wrapped in an Arc and handed
// to every fetch worker, so there is no process-wide mutable state.
//
// Validation happens here, before any network work: a bad seed URL, an empty
// output path or a malformed header is reported as InvalidInput.
// =============================================================================

use crate::error::PackError;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15";

// Sent with every request unless a custom header replaces them
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-us"));
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers
}

/// Everything the crawler needs to know
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Page to archive; always absolute http(s)
    pub seed: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Final request headers (defaults, Referer, then custom overrides)
    pub headers: HeaderMap,
    /// Number of concurrent fetch workers
    pub workers: usize,
    /// Maximum number of URLs waiting in the frontier
    pub queue_capacity: usize,
    /// Refuse loopback, private and link-local destinations
    pub block_private_network: bool,
}

impl CrawlConfig {
    pub fn new(seed: &str) -> Result<Self, PackError> {
        let seed = parse_seed(seed)?;

        let mut headers = default_headers();
        let referer = HeaderValue::from_str(seed.as_str())
            .map_err(|e| PackError::InvalidInput(format!("seed URL is not a valid header value: {}", e)))?;
        headers.insert(header::REFERER, referer);

        Ok(Self {
            seed,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            headers,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            block_private_network: false,
        })
    }

    /// Sets the request timeout; 0 keeps the default
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_block_private_network(mut self, block: bool) -> Self {
        self.block_private_network = block;
        self
    }

    /// Adds or replaces a request header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, PackError> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| PackError::InvalidInput(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| PackError::InvalidInput(format!("invalid value for header '{}'", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

/// A full pack run: crawl settings plus what to do with the result
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub crawl: CrawlConfig,
    pub output: PathBuf,
    pub clutter_free: bool,
}

impl PackOptions {
    pub fn new(crawl: CrawlConfig, output: impl Into<PathBuf>) -> Result<Self, PackError> {
        let output = output.into();
        if output.as_os_str().is_empty() {
            return Err(PackError::InvalidInput("--output is empty".to_string()));
        }
        if output.is_dir() {
            return Err(PackError::InvalidInput(format!(
                "output {} is a directory",
                output.display()
            )));
        }
        Ok(Self {
            crawl,
            output,
            clutter_free: false,
        })
    }

    pub fn with_clutter_free(mut self, clutter_free: bool) -> Self {
        self.clutter_free = clutter_free;
        self
    }
}

/// Splits a "Name: value" command-line header
pub fn parse_header_arg(raw: &str) -> Result<(String, String), PackError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(PackError::InvalidInput(format!(
            "header '{}' is not in 'Name: value' form",
            raw
        ))),
    }
}

fn parse_seed(raw: &str) -> Result<Url, PackError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PackError::InvalidInput("--url is empty".to_string()));
    }

    let mut url = Url::parse(raw)
        .map_err(|e| PackError::InvalidInput(format!("invalid URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(PackError::InvalidInput(format!(
            "unsupported URL scheme '{}' (only http and https can be packed)",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(PackError::InvalidInput(format!("URL has no host: {}", raw)));
    }

    url.set_fragment(None);
    Ok(url)
}
