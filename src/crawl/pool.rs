// src/crawl/pool.rs
// =============================================================================
// The fetch worker pool and the assembler that runs once it is done.
//
// How a crawl runs:
// 1. The seed URL goes into the frontier at depth 0
// 2. W workers loop: dequeue -> claim in the ledger -> fetch + decode ->
//    store the item
// 3. If the seed is HTML, its references are handed to a producer task that
//    normalizes them and enqueues the survivors at depth 1. The worker goes
//    straight back to dequeueing, so a full frontier always has a consumer.
//    Depth 1 items are only fetched, never parsed.
// 4. When the frontier has no queued or in-flight work left it closes itself,
//    every worker sees end-of-stream and exits
// 5. After all workers and producers have exited (the barrier), the assembler
//    turns the stored items into an ArchiveDocument, or reports the first error
//
// Failure handling:
// - The first Network/Decode error from any worker is kept, later ones are
//   dropped. The worker that hit it stops, and the crawl is aborted so the
//   others stop issuing fetches too.
// - Cancelling the caller's token stops everything; in-flight requests are
//   dropped and the crawl reports Cancelled.
//
// Rust concepts:
// - Arc<Shared>: one shared state, cloned into every spawned task
// - tokio::select!: race a fetch against cancellation
// - Drop guard: a dequeued URL is always marked complete, even on early exit,
//   and the guard moves into the producer when there is more work to queue
// =============================================================================

use crate::archive::{ArchiveDocument, ResourceItem};
use crate::config::CrawlConfig;
use crate::crawl::extract::extract_references;
use crate::crawl::fetch::Fetcher;
use crate::crawl::frontier::Frontier;
use crate::crawl::ledger::DedupLedger;
use crate::crawl::normalize;
use crate::error::PackError;
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

// Only the seed page is parsed; what it references is fetched as-is
const SEED_DEPTH: usize = 0;

// One frontier entry
#[derive(Debug, Clone)]
struct CrawlItem {
    url: String,
    depth: usize, // 0 = the seed page, 1 = something it references
}

// State every worker of one crawl shares
struct Shared {
    frontier: Frontier<CrawlItem>,
    ledger: DedupLedger,
    fetcher: Fetcher,
    // Completed items, in completion order
    results: Mutex<Vec<ResourceItem>>,
    // First escalating error; later ones are discarded
    first_error: Mutex<Option<PackError>>,
    // Reference producers, joined after the workers
    producers: Mutex<Vec<(usize, JoinHandle<()>)>>,
    // Cancelled by the caller or by the first worker error
    abort: CancellationToken,
}

impl Shared {
    fn fail(&self, worker: usize, error: PackError) {
        {
            let mut slot = lock(&self.first_error);
            if slot.is_none() {
                warn!("worker {} failed: {}", worker, error);
                *slot = Some(error);
            } else {
                debug!("worker {} error discarded (one already recorded): {}", worker, error);
            }
        }
        // Nothing useful can come out of this crawl any more
        self.frontier.close();
        self.abort.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Marks a dequeued URL as done when whoever holds it is finished, however
// it gets dropped
struct Completion(Arc<Shared>);

impl Drop for Completion {
    fn drop(&mut self) {
        if self.0.frontier.complete() {
            debug!("no work left, frontier closed");
        }
    }
}

/// Crawls `config.seed` and everything it directly references
pub async fn crawl(config: Arc<CrawlConfig>, cancel: CancellationToken) -> Result<ArchiveDocument, PackError> {
    let fetcher = Fetcher::new(config.clone())?;
    let abort = cancel.child_token();
    let shared = Arc::new(Shared {
        frontier: Frontier::new(config.queue_capacity, abort.clone()),
        ledger: DedupLedger::new(),
        fetcher,
        results: Mutex::new(Vec::new()),
        first_error: Mutex::new(None),
        producers: Mutex::new(Vec::new()),
        abort,
    });

    info!("crawling {} with {} workers", config.seed, config.workers);
    let seed = CrawlItem {
        url: config.seed.to_string(),
        depth: SEED_DEPTH,
    };
    shared.frontier.enqueue(seed).await;

    let handles: Vec<_> = (0..config.workers)
        .map(|id| {
            let shared = shared.clone();
            tokio::spawn(async move { run_worker(id, shared).await })
        })
        .collect();

    // Barrier: every worker has exited...
    for (id, joined) in join_all(handles).await.into_iter().enumerate() {
        if let Err(e) = joined {
            shared.fail(id, PackError::Worker(e.to_string()));
        }
    }

    // ...and so has every producer they started
    let producers = std::mem::take(&mut *lock(&shared.producers));
    let (ids, handles): (Vec<_>, Vec<_>) = producers.into_iter().unzip();
    for (id, joined) in ids.into_iter().zip(join_all(handles).await) {
        if let Err(e) = joined {
            shared.fail(id, PackError::Worker(e.to_string()));
        }
    }

    assemble(&shared, &cancel)
}

async fn run_worker(id: usize, shared: Arc<Shared>) {
    trace!("worker {} started", id);

    while let Some(entry) = shared.frontier.dequeue().await {
        let done = Completion(shared.clone());

        if !shared.ledger.claim(&entry.url) {
            trace!("worker {} skipping {} (already claimed)", id, entry.url);
            continue;
        }

        match process_url(id, &shared, &entry).await {
            Ok(references) if !references.is_empty() => {
                spawn_producer(id, done, entry.url, references);
            }
            Ok(_) => {}
            Err(error) => {
                shared.fail(id, error);
                break;
            }
        }
    }

    trace!("worker {} exiting (frontier closed: {})", id, shared.frontier.is_closed());
}

// Fetches one entry and returns the raw references it contributes
async fn process_url(id: usize, shared: &Shared, entry: &CrawlItem) -> Result<Vec<String>, PackError> {
    let url = entry.url.as_str();
    let item = tokio::select! {
        biased;
        _ = shared.abort.cancelled() => {
            debug!("worker {} abandoned {}", id, url);
            return Ok(Vec::new());
        }
        fetched = shared.fetcher.fetch(url) => fetched?,
    };

    debug!(
        "worker {} fetched {} ({}, {} bytes, depth {})",
        id,
        url,
        item.mime_type,
        item.data.len(),
        entry.depth
    );

    let references = if entry.depth == SEED_DEPTH && item.is_html() {
        extract_references(&item.data)
    } else {
        Vec::new()
    };

    lock(&shared.results).push(item);
    Ok(references)
}

// Queues the seed's references from a separate task. `done` keeps the seed
// outstanding until the last reference is in, so the frontier cannot close
// early, while the worker is free to drain the queue in the meantime.
fn spawn_producer(id: usize, done: Completion, page: String, references: Vec<String>) {
    let shared = done.0.clone();
    let handle = tokio::spawn(async move {
        let Ok(base) = Url::parse(&page) else {
            return;
        };

        let mut queued = 0;
        for reference in references {
            let Some(next) = normalize::resolve(&reference, &base) else {
                trace!("ignoring reference '{}' on {}", reference, page);
                continue;
            };
            let entry = CrawlItem {
                url: next.into(),
                depth: SEED_DEPTH + 1,
            };
            if !done.0.frontier.enqueue(entry).await {
                // Closed or cancelled: nobody will fetch it anyway
                break;
            }
            queued += 1;
        }

        debug!(
            "worker {} queued {} reference(s) from {} ({} outstanding)",
            id,
            queued,
            page,
            done.0.frontier.outstanding()
        );
    });
    lock(&shared.producers).push((id, handle));
}

// Runs after the barrier: decide pass/fail and build the document
fn assemble(shared: &Shared, cancel: &CancellationToken) -> Result<ArchiveDocument, PackError> {
    if cancel.is_cancelled() {
        info!("crawl cancelled, discarding partial results");
        return Err(PackError::Cancelled);
    }

    if let Some(error) = lock(&shared.first_error).take() {
        return Err(error);
    }

    let items = std::mem::take(&mut *lock(&shared.results));
    info!(
        "crawl finished: {} resource(s) fetched, {} unique URL(s) claimed",
        items.len(),
        shared.ledger.len()
    );

    ArchiveDocument::from_completed(items)
        .ok_or_else(|| PackError::Worker("crawl finished without fetching any resource".to_string()))
}
