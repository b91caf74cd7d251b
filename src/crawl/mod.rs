// src/crawl/mod.rs
// =============================================================================
// This module discovers and downloads everything a page needs.
//
// Submodules, leaf first:
// - normalize: turns a reference into an absolute, fetchable URL (or rejects it)
// - frontier: bounded queue of URLs waiting to be fetched
// - ledger: set of URLs already claimed, so each one is fetched at most once
// - extract: finds image, script and stylesheet references in HTML
// - fetch: HTTP transport and content decoding
// - pool: the concurrent workers plus the assembler that builds the document
//
// Only the pool is used from outside; the rest is wiring it depends on.
// =============================================================================

mod extract;
mod fetch;
mod frontier;
mod ledger;
mod normalize;
mod pool;

// Re-export the entry point of the crawl
pub use pool::crawl;

// The HTML encoder matches references the same way the crawler found them
pub use extract::{is_stylesheet, IMG_SOURCE_ATTRS};
pub use normalize::resolve;

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a bounded frontier?
//    - Extraction can find URLs much faster than they can be downloaded
//    - The capacity limit makes producers wait instead of growing memory
//
// 2. Why a separate ledger instead of checking the frontier?
//    - The same URL can be queued several times (two <img> tags, a fragment)
//    - Deduplication happens when a worker takes the URL, in one atomic step
//
// 3. Why does the frontier close itself?
//    - Workers can't know on their own whether another worker is about to
//      discover more URLs
//    - Counting queued + in-flight work gives an exact "nothing left" moment
//
// 4. Why are references enqueued from a separate task?
//    - A worker waiting for room in a full frontier can't also be the one
//      that drains it
//    - The producer waits instead, and every worker keeps dequeueing
// -----------------------------------------------------------------------------
