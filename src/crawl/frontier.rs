// src/crawl/frontier.rs
// =============================================================================
// The frontier: a bounded FIFO of work waiting to be fetched.
//
// Many tasks push and pop at the same time:
// - enqueue() waits while the queue is full (backpressure)
// - dequeue() waits while the queue is empty
// - close() stops new work; buffered entries are still handed out, then every
//   dequeue() returns None (end of stream)
// - cancelling the crawl's token wakes every waiter immediately
//
// When does the crawl end?
// The frontier counts outstanding work: each accepted entry adds one, and
// whoever took it out calls complete() once it has finished with it
// (including enqueueing whatever it discovered). When that count reaches zero
// nobody can produce more work, so the frontier closes itself.
//
// Rust concepts:
// - Generic over the entry type: the pool queues CrawlItems, tests use Strings
// - std::sync::Mutex for the short critical sections (never held across .await)
// - tokio::sync::Notify to park tasks until "items" or "space" changes
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
    // Accepted but not yet completed (queued + in flight)
    outstanding: usize,
}

#[derive(Debug)]
pub struct Frontier<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    items: Notify,
    space: Notify,
    cancel: CancellationToken,
}

impl<T> Frontier<T> {
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                closed: false,
                outstanding: 0,
            }),
            capacity: capacity.max(1),
            items: Notify::new(),
            space: Notify::new(),
            cancel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // A panicking worker must not take the whole crawl down with it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds an entry, waiting for room if the queue is full
    ///
    /// Returns false (and drops the entry) if the frontier is closed or the
    /// crawl was cancelled.
    pub async fn enqueue(&self, item: T) -> bool {
        loop {
            // Register interest before looking at the state so a wakeup
            // between the check and the await is not lost
            let space = self.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed || self.cancel.is_cancelled() {
                    return false;
                }
                if state.queue.len() < self.capacity {
                    state.queue.push_back(item);
                    state.outstanding += 1;
                    drop(state);
                    self.items.notify_one();
                    return true;
                }
            }

            tokio::select! {
                _ = &mut space => {}
                _ = self.cancel.cancelled() => return false,
            }
        }
    }

    /// Takes the next entry, waiting if none is buffered
    ///
    /// Returns None once the frontier is closed and drained, or as soon as the
    /// crawl is cancelled.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            let ready = self.items.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            {
                let mut state = self.lock();
                if self.cancel.is_cancelled() {
                    return None;
                }
                if let Some(item) = state.queue.pop_front() {
                    let more = !state.queue.is_empty();
                    drop(state);
                    self.space.notify_one();
                    if more {
                        // Pass the baton so another idle worker picks up the rest
                        self.items.notify_one();
                    }
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }

            tokio::select! {
                _ = &mut ready => {}
                _ = self.cancel.cancelled() => return None,
            }
        }
    }

    /// Marks one dequeued entry as fully processed
    ///
    /// Closes the frontier when no queued or in-flight work is left. Returns
    /// true if this call is the one that closed it.
    pub fn complete(&self) -> bool {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.outstanding == 0 && !state.closed {
            state.closed = true;
            drop(state);
            self.wake_all();
            return true;
        }
        false
    }

    /// Stops accepting entries; idempotent
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.wake_all();
    }

    fn wake_all(&self) {
        self.items.notify_waiters();
        self.space.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn urls(capacity: usize, cancel: CancellationToken) -> Frontier<String> {
        Frontier::new(capacity, cancel)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = urls(4, CancellationToken::new());
        assert!(frontier.enqueue("a".into()).await);
        assert!(frontier.enqueue("b".into()).await);
        assert_eq!(frontier.dequeue().await.as_deref(), Some("a"));
        assert_eq!(frontier.dequeue().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_close_then_drain() {
        let frontier = urls(4, CancellationToken::new());
        frontier.enqueue("a".into()).await;
        frontier.enqueue("b".into()).await;
        frontier.close();
        frontier.close();

        // Closed: new work is rejected, buffered work is still handed out
        assert!(!frontier.enqueue("c".into()).await);
        assert_eq!(frontier.dequeue().await.as_deref(), Some("a"));
        assert_eq!(frontier.dequeue().await.as_deref(), Some("b"));
        assert_eq!(frontier.dequeue().await, None);
    }

    #[tokio::test]
    async fn test_enqueue_blocks_when_full() {
        let frontier = Arc::new(urls(1, CancellationToken::new()));
        frontier.enqueue("a".into()).await;

        let producer = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.enqueue("b".into()).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());
        assert_eq!(frontier.len(), 1);

        assert_eq!(frontier.dequeue().await.as_deref(), Some("a"));
        let accepted = timeout(Duration::from_secs(2), producer).await.unwrap().unwrap();
        assert!(accepted);
        assert_eq!(frontier.dequeue().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_consumer() {
        let frontier = Arc::new(urls(2, CancellationToken::new()));
        let consumer = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.close();
        let got = timeout(Duration::from_secs(2), consumer).await.unwrap().unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_cancel_wakes_blocked_producer_and_consumer() {
        let cancel = CancellationToken::new();
        let full = Arc::new(urls(1, cancel.clone()));
        full.enqueue("a".into()).await;
        let empty = Arc::new(urls(1, cancel.clone()));

        let producer = {
            let full = full.clone();
            tokio::spawn(async move { full.enqueue("b".into()).await })
        };
        let consumer = {
            let empty = empty.clone();
            tokio::spawn(async move { empty.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        assert!(!timeout(Duration::from_secs(2), producer).await.unwrap().unwrap());
        assert_eq!(timeout(Duration::from_secs(2), consumer).await.unwrap().unwrap(), None);
        // Buffered items are abandoned once cancelled
        assert_eq!(full.dequeue().await, None);
    }

    #[tokio::test]
    async fn test_closes_when_outstanding_work_reaches_zero() {
        let frontier = urls(8, CancellationToken::new());
        frontier.enqueue("seed".into()).await;

        let seed = frontier.dequeue().await.unwrap();
        assert_eq!(seed, "seed");
        // Work discovered while processing the seed keeps the frontier open
        frontier.enqueue("child-1".into()).await;
        frontier.enqueue("child-2".into()).await;
        assert!(!frontier.complete());
        assert_eq!(frontier.outstanding(), 2);

        frontier.dequeue().await.unwrap();
        assert!(!frontier.complete());
        frontier.dequeue().await.unwrap();
        assert!(frontier.complete());

        assert!(frontier.is_closed());
        assert_eq!(frontier.dequeue().await, None);
    }

    #[tokio::test]
    async fn test_producer_and_consumer_share_a_single_slot() {
        // One slot, one consumer: the producer can only finish because the
        // consumer keeps draining while it is still pushing
        let frontier = Arc::new(urls(1, CancellationToken::new()));
        let producer = {
            let frontier = frontier.clone();
            tokio::spawn(async move {
                for i in 0..5 {
                    assert!(frontier.enqueue(format!("u{}", i)).await);
                }
            })
        };

        let mut seen = Vec::new();
        for _ in 0..5 {
            let next = timeout(Duration::from_secs(2), frontier.dequeue()).await.unwrap();
            seen.push(next.unwrap());
        }
        timeout(Duration::from_secs(2), producer).await.unwrap().unwrap();
        assert_eq!(seen, vec!["u0", "u1", "u2", "u3", "u4"]);
    }
}
