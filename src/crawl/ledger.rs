// src/crawl/ledger.rs
// =============================================================================
// The dedup ledger: which URLs have already been claimed for fetching.
//
// claim() is a single test-and-set under one lock, so exactly one caller ever
// sees `true` for a given URL no matter how many workers race on it. That is
// the whole "fetch each URL at most once" guarantee.
// =============================================================================

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: Mutex<HashSet<String>>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the first claim of `url`
    pub fn claim(&self, url: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // HashSet::insert already answers "was it new?"
        seen.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
