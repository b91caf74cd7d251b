// src/error.rs
// =============================================================================
// Error kinds for the whole packing pipeline.
//
// Which errors escalate:
// - InvalidInput: raised before any crawl work starts (bad seed URL, output)
// - Network / Decode: raised by a fetch worker, captured once (first wins)
//   and reported after every worker has stopped
// - Transform: the optional clutter-free pass failed
// - Encoding: the archive could not be serialized or written
// - Cancelled: the crawl was stopped through its cancellation token
// - Worker: a worker task panicked (a bug, but it must not hang the crawl)
//
// Extraction problems (malformed HTML, unusable references) never show up
// here: they just produce fewer references.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    /// The seed URL, output path or another option is unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure or a non-2xx response
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The response body could not be decoded for its Content-Encoding
    #[error("cannot decode '{encoding}' body from {url}: {reason}")]
    Decode {
        url: String,
        encoding: String,
        reason: String,
    },

    /// The clutter-free transform rejected the document
    #[error("clutter-free pass failed: {0}")]
    Transform(String),

    /// The archive could not be encoded or written to disk
    #[error("encoding archive failed: {0}")]
    Encoding(String),

    #[error("crawl cancelled")]
    Cancelled,

    /// A worker task died or the crawl ended in an impossible state
    #[error("crawl worker failed: {0}")]
    Worker(String),
}

impl PackError {
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        PackError::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(url: impl Into<String>, encoding: impl Into<String>, reason: impl ToString) -> Self {
        PackError::Decode {
            url: url.into(),
            encoding: encoding.into(),
            reason: reason.to_string(),
        }
    }

    /// Process exit code for this failure
    ///
    /// 1 = crawl or encode failed, 2 = bad input, 130 = cancelled (Ctrl-C)
    pub fn exit_code(&self) -> i32 {
        match self {
            PackError::InvalidInput(_) => 2,
            PackError::Cancelled => 130,
            _ => 1,
        }
    }
}
