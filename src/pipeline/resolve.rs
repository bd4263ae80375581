//! Detail-page resolution on a bounded, order-preserving worker pool.

use std::pin::pin;

use futures::future;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::extract::FieldExtractor;
use crate::http_client::DetailFetcher;
use crate::models::{CandidateLink, ProductRecord};

/// Progress events emitted while resolving.
#[derive(Debug, Clone)]
pub enum ResolveEvent {
    /// Resolution started
    Started { total: usize },
    /// A record was extracted
    ItemResolved { label: String },
    /// An item was skipped after a fetch or extraction failure
    ItemFailed { label: String, error: String },
    /// Resolution finished or was cancelled
    Complete { resolved: usize, failed: usize },
}

/// Counts for one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub total: usize,
    pub resolved: usize,
    pub fetch_failed: usize,
    pub extract_failed: usize,
    /// Items never attempted because the run was cancelled.
    pub not_attempted: usize,
    pub cancelled: bool,
}

impl ResolveSummary {
    pub fn failed(&self) -> usize {
        self.fetch_failed + self.extract_failed
    }
}

enum Outcome {
    Resolved(ProductRecord),
    FetchFailed(String),
    ExtractFailed(String),
}

/// Turns candidate links into product records.
pub struct Resolver<'a, F: DetailFetcher + ?Sized> {
    fetcher: &'a F,
    extractor: &'a FieldExtractor,
    workers: usize,
}

impl<'a, F: DetailFetcher + ?Sized> Resolver<'a, F> {
    pub fn new(fetcher: &'a F, extractor: &'a FieldExtractor) -> Self {
        Self {
            fetcher,
            extractor,
            workers: 1,
        }
    }

    /// Number of detail pages fetched concurrently. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    async fn resolve_one(&self, link: &CandidateLink) -> Outcome {
        info!("Resolving {}", link.label());

        let html = match self.fetcher.fetch(&link.absolute_url).await {
            Ok(html) => html,
            Err(e) => return Outcome::FetchFailed(e.to_string()),
        };

        match self.extractor.extract_record(&html, link.label()) {
            Ok(record) => Outcome::Resolved(record),
            Err(e) => Outcome::ExtractFailed(e.to_string()),
        }
    }

    /// Resolve every link, in input order.
    ///
    /// Per-item failures are logged and skipped; nothing here aborts the
    /// run. Cancellation stops new fetches from starting, while fetches
    /// already in flight finish and keep their results.
    pub async fn resolve_all(
        &self,
        links: &[CandidateLink],
        cancel: &CancellationToken,
        events: Option<mpsc::Sender<ResolveEvent>>,
    ) -> (Vec<ProductRecord>, ResolveSummary) {
        let mut summary = ResolveSummary {
            total: links.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(links.len());

        if let Some(tx) = &events {
            let _ = tx.send(ResolveEvent::Started { total: links.len() }).await;
        }

        let mut outcomes = pin!(stream::iter(links)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|link| async move { (link, self.resolve_one(link).await) })
            .buffered(self.workers));

        let mut attempted = 0;
        while let Some((link, outcome)) = outcomes.next().await {
            attempted += 1;
            let event = match outcome {
                Outcome::Resolved(record) => {
                    summary.resolved += 1;
                    records.push(record);
                    ResolveEvent::ItemResolved {
                        label: link.label().to_string(),
                    }
                }
                Outcome::FetchFailed(error) => {
                    warn!("Failed to fetch {}, skipping: {}", link.absolute_url, error);
                    summary.fetch_failed += 1;
                    ResolveEvent::ItemFailed {
                        label: link.label().to_string(),
                        error,
                    }
                }
                Outcome::ExtractFailed(error) => {
                    warn!("Product not found at {}, skipping: {}", link.absolute_url, error);
                    summary.extract_failed += 1;
                    ResolveEvent::ItemFailed {
                        label: link.label().to_string(),
                        error,
                    }
                }
            };

            if let Some(tx) = &events {
                let _ = tx.send(event).await;
            }
        }

        summary.not_attempted = links.len() - attempted;
        summary.cancelled = summary.not_attempted > 0;
        if summary.cancelled {
            info!(
                "Resolution cancelled with {} of {} links remaining",
                summary.not_attempted,
                links.len()
            );
        }

        info!(
            "Resolved {} of {} links ({} failed)",
            summary.resolved,
            links.len(),
            summary.failed()
        );

        if let Some(tx) = &events {
            let _ = tx
                .send(ResolveEvent::Complete {
                    resolved: summary.resolved,
                    failed: summary.failed(),
                })
                .await;
        }

        (records, summary)
    }
}
