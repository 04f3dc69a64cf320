use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::CrawlerConfig;
use crate::scrapable::FetchRequest;

#[derive(Debug, Default)]
struct Frontier {
    seen: HashSet<String>,
    scheduled: usize,
}

/// Request sender shared by the seeding task and the workers.
///
/// Every request that goes through is counted as an incoming page, the crawl
/// is over once the same amount of pages went out of the workers.
#[derive(Debug)]
pub(crate) struct CountedTx<S> {
    tx: mpsc::UnboundedSender<FetchRequest<S>>,
    counter: Arc<AtomicUsize>,
    frontier: Arc<Mutex<Frontier>>,
    dedup: bool,
    max_requests: Option<usize>,
}

impl<S> Clone for CountedTx<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            counter: self.counter.clone(),
            frontier: self.frontier.clone(),
            dedup: self.dedup,
            max_requests: self.max_requests,
        }
    }
}

impl<S: fmt::Debug> CountedTx<S> {
    pub fn new(
        tx: mpsc::UnboundedSender<FetchRequest<S>>,
        counter: Arc<AtomicUsize>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            tx,
            counter,
            frontier: Arc::new(Mutex::new(Frontier::default())),
            dedup: config.dedup,
            max_requests: config.max_requests,
        }
    }

    /// Returns whether the request was actually scheduled
    pub fn send(&self, request: FetchRequest<S>) -> bool {
        {
            let mut frontier = self
                .frontier
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            if matches!(self.max_requests, Some(max) if frontier.scheduled >= max) {
                log::debug!("Request limit reached, dropping {request:?}");
                return false;
            }
            if self.dedup && !frontier.seen.insert(request.url.clone()) {
                log::debug!("Already scheduled, dropping {request:?}");
                return false;
            }
            frontier.scheduled += 1;
        }

        self.counter.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(request) {
            Ok(()) => true,
            Err(e) => {
                self.counter.fetch_sub(1, Ordering::SeqCst);
                log::error!("Couldn't send request: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted_tx(
        config: &CrawlerConfig,
    ) -> (
        CountedTx<u8>,
        mpsc::UnboundedReceiver<FetchRequest<u8>>,
        Arc<AtomicUsize>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counter = Arc::new(AtomicUsize::new(0));
        (CountedTx::new(tx, counter.clone(), config), rx, counter)
    }

    #[test]
    fn dedup_drops_seen_urls() {
        let (tx, mut rx, counter) = counted_tx(&CrawlerConfig::default());

        assert!(tx.send(FetchRequest::new("https://a.com/1", 0)));
        assert!(!tx.clone().send(FetchRequest::new("https://a.com/1", 1)));
        assert!(tx.send(FetchRequest::new("https://a.com/2", 0)));

        assert_eq!(2, counter.load(Ordering::SeqCst));
        assert_eq!(Ok(FetchRequest::new("https://a.com/1", 0)), rx.try_recv());
        assert_eq!(Ok(FetchRequest::new("https://a.com/2", 0)), rx.try_recv());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn no_dedup_keeps_duplicates() {
        let config = CrawlerConfig {
            dedup: false,
            ..Default::default()
        };
        let (tx, _rx, counter) = counted_tx(&config);

        assert!(tx.send(FetchRequest::new("https://a.com/1", 0)));
        assert!(tx.send(FetchRequest::new("https://a.com/1", 0)));
        assert_eq!(2, counter.load(Ordering::SeqCst));
    }

    #[test]
    fn max_requests_caps_schedule() {
        let config = CrawlerConfig {
            max_requests: Some(2),
            ..Default::default()
        };
        let (tx, _rx, counter) = counted_tx(&config);

        assert!(tx.send(FetchRequest::new("https://a.com/1", 0)));
        assert!(tx.send(FetchRequest::new("https://a.com/2", 0)));
        assert!(!tx.send(FetchRequest::new("https://a.com/3", 0)));
        assert_eq!(2, counter.load(Ordering::SeqCst));
    }

    #[test]
    fn closed_channel_is_not_counted() {
        let (tx, rx, counter) = counted_tx(&CrawlerConfig::default());
        drop(rx);

        assert!(!tx.send(FetchRequest::new("https://a.com/1", 0)));
        assert_eq!(0, counter.load(Ordering::SeqCst));
    }
}
