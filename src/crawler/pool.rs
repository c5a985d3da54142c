//! Bounded worker pool for item extraction
//!
//! Workers share one browser context and each owns a page. They pull links from a
//! shared queue until they take a stop sentinel; one sentinel is queued per worker
//! behind the links, so every worker stops once the queue has drained.

use super::diagnostics::Diagnostics;
use crate::engine::{BrowserContext, Page};
use crate::extract::ExtractedRecord;
use crate::HarvestError;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Extracts one item on a page owned by the calling worker
#[async_trait]
pub trait ItemExtractor: Send + Sync {
    async fn extract_item(
        &self,
        page: &mut dyn Page,
        url: &Url,
    ) -> Result<ExtractedRecord, HarvestError>;
}

enum PoolMessage {
    Item(Url),
    Stop,
}

/// Records and failures gathered by the pool
#[derive(Debug, Default)]
pub struct PoolOutcome {
    pub records: Vec<ExtractedRecord>,
    pub diagnostics: Diagnostics,
}

/// Fixed-size pool of extraction workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: u32) -> Self {
        Self {
            workers: (workers as usize).max(1),
        }
    }

    /// Number of workers that will run for `links` links
    pub fn workers_for(&self, links: usize) -> usize {
        self.workers.min(links)
    }

    /// Extracts every link and waits for all workers to finish
    ///
    /// A failing item is recorded in the outcome's diagnostics and skipped.
    /// Completion order is not defined.
    pub async fn run(
        &self,
        context: &dyn BrowserContext,
        links: Vec<Url>,
        extractor: &dyn ItemExtractor,
    ) -> PoolOutcome {
        let workers = self.workers_for(links.len());
        if workers == 0 {
            return PoolOutcome::default();
        }

        let mut messages: VecDeque<PoolMessage> = links.into_iter().map(PoolMessage::Item).collect();
        messages.extend((0..workers).map(|_| PoolMessage::Stop));
        let queue = Mutex::new(messages);

        tracing::debug!("Starting {} extraction workers", workers);
        let results = join_all((0..workers).map(|id| worker(id, context, &queue, extractor))).await;

        let mut outcome = PoolOutcome::default();
        for (records, diagnostics) in results {
            outcome.records.extend(records);
            outcome.diagnostics.merge(diagnostics);
        }
        outcome
    }
}

async fn worker(
    id: usize,
    context: &dyn BrowserContext,
    queue: &Mutex<VecDeque<PoolMessage>>,
    extractor: &dyn ItemExtractor,
) -> (Vec<ExtractedRecord>, Diagnostics) {
    let mut records = Vec::new();
    let mut diagnostics = Diagnostics::default();

    let mut page = match context.new_page().await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Worker {} could not open a page: {}", id, e);
            return (records, diagnostics);
        }
    };

    loop {
        let message = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let url = match message {
            Some(PoolMessage::Item(url)) => url,
            Some(PoolMessage::Stop) | None => break,
        };

        match extractor.extract_item(page.as_mut(), &url).await {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Worker {} failed on {}: {}", id, url, e);
                diagnostics.record_item_failure(url.as_str(), e.to_string());
            }
        }
    }

    page.close().await;
    tracing::trace!("Worker {} stopped", id);
    (records, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, Navigation};
    use crate::extract::Field;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct NullPage;

    #[async_trait]
    impl Page for NullPage {
        async fn goto(&mut self, url: &Url) -> Result<Navigation, EngineError> {
            Ok(Navigation {
                url: url.clone(),
                status: 200,
            })
        }

        async fn reload(&mut self) -> Result<Navigation, EngineError> {
            Err(EngineError::NoDocument)
        }

        fn content(&self) -> &str {
            ""
        }

        fn current_url(&self) -> Option<&Url> {
            None
        }

        async fn click(&mut self, _selector: &str) -> Result<bool, EngineError> {
            Ok(false)
        }

        async fn scroll_to_end(&mut self, _selector: &str) -> Result<Option<u64>, EngineError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CountingContext {
        pages: AtomicUsize,
    }

    #[async_trait]
    impl BrowserContext for CountingContext {
        async fn new_page(&self) -> Result<Box<dyn Page>, EngineError> {
            self.pages.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullPage))
        }

        async fn close(&self) {}
    }

    /// Fails every link whose path contains "broken"
    struct FakeExtractor {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ItemExtractor for FakeExtractor {
        async fn extract_item(
            &self,
            page: &mut dyn Page,
            url: &Url,
        ) -> Result<ExtractedRecord, HarvestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            page.wait(Duration::from_millis(1)).await;
            if url.path().contains("broken") {
                return Err(HarvestError::ItemExtraction {
                    url: url.to_string(),
                    reason: "HTTP 404".to_string(),
                });
            }
            Ok(ExtractedRecord {
                url: url.to_string(),
                article: Field::Unresolved,
                name: Field::Resolved(url.path().to_string()),
                price: Field::Unresolved,
                stock: Field::Unresolved,
                tx1: Field::Unresolved,
                tx2: Field::Unresolved,
            })
        }
    }

    fn links(paths: &[&str]) -> Vec<Url> {
        paths
            .iter()
            .map(|p| Url::parse(&format!("https://shop.test{}", p)).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_every_link_extracted_once() {
        let context = CountingContext::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let extractor = FakeExtractor {
            calls: calls.clone(),
        };

        let paths: Vec<String> = (0..10).map(|i| format!("/product/{}/", i)).collect();
        let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();

        let outcome = WorkerPool::new(4)
            .run(&context, links(&path_refs), &extractor)
            .await;

        assert_eq!(outcome.records.len(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(context.pages.load(Ordering::SeqCst), 4);
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_failures_collected_not_fatal() {
        let context = CountingContext::default();
        let extractor = FakeExtractor {
            calls: Arc::new(AtomicUsize::new(0)),
        };

        let outcome = WorkerPool::new(2)
            .run(
                &context,
                links(&["/product/a/", "/product/broken/", "/product/b/"]),
                &extractor,
            )
            .await;

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.diagnostics.item_failures.len(), 1);
        assert_eq!(
            outcome.diagnostics.item_failures[0].url,
            "https://shop.test/product/broken/"
        );
    }

    #[tokio::test]
    async fn test_never_more_workers_than_links() {
        let context = CountingContext::default();
        let extractor = FakeExtractor {
            calls: Arc::new(AtomicUsize::new(0)),
        };

        WorkerPool::new(8)
            .run(&context, links(&["/product/only/"]), &extractor)
            .await;
        assert_eq!(context.pages.load(Ordering::SeqCst), 1);

        let empty = WorkerPool::new(8).run(&context, Vec::new(), &extractor).await;
        assert!(empty.records.is_empty());
        assert_eq!(context.pages.load(Ordering::SeqCst), 1);
    }
}
