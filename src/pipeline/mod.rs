//! End-to-end acquisition: harvest, resolve, assemble, export.
//!
//! The two stages are decoupled by the [`RawLinkStore`] file. `harvest`
//! fills it from a live listing session, `resolve` reads it back, so a run
//! that dies between stages can be resumed without signing in again.

mod resolve;
mod table;

pub use resolve::{ResolveEvent, ResolveSummary, Resolver};
pub use table::{assemble, export_csv, parse_price, write_csv};

use std::path::Path;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RunConfig;
use crate::error::{ConfigError, ExportError, HarvestError, StoreError};
use crate::extract::FieldExtractor;
use crate::harvest::{HarvestSummary, LinkHarvester, PaginationWalker, RawLinkStore};
use crate::http_client::DetailFetcher;
use crate::models::{CandidateLink, ProductRecord, ProductTable};
use crate::session::ListingSession;

/// One configured acquisition run.
pub struct Pipeline {
    config: RunConfig,
    harvester: LinkHarvester,
    extractor: FieldExtractor,
    store: RawLinkStore,
}

impl Pipeline {
    /// Validate selectors and paths up front so a bad config fails before
    /// any browser work starts.
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        let harvester = LinkHarvester::new(&config.site)?;
        let extractor = FieldExtractor::new(&config.site)?;
        let store = RawLinkStore::new(config.store_file());

        Ok(Self {
            config,
            harvester,
            extractor,
            store,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn store(&self) -> &RawLinkStore {
        &self.store
    }

    /// Truncate the link store. Call once at the start of a fresh run.
    pub async fn reset_store(&self) -> Result<(), StoreError> {
        self.store.reset().await
    }

    /// Walk every listing page of `session` into the link store.
    pub async fn harvest<S: ListingSession>(
        &self,
        session: &mut S,
        cancel: &CancellationToken,
    ) -> Result<HarvestSummary, HarvestError> {
        PaginationWalker::new(
            &self.harvester,
            &self.config.site.next_page_selector,
            self.config.page_settle(),
        )
        .harvest_all_pages(session, &self.store, cancel)
        .await
    }

    /// Candidate links currently in the store.
    pub async fn load_links(&self) -> Result<Vec<CandidateLink>, StoreError> {
        let links = self.store.load(&self.harvester).await?;
        info!("Loaded {} candidate links from {:?}", links.len(), self.store.path());
        Ok(links)
    }

    /// Resolve every stored link into a product record.
    pub async fn resolve<F: DetailFetcher + ?Sized>(
        &self,
        fetcher: &F,
        cancel: &CancellationToken,
        events: Option<mpsc::Sender<ResolveEvent>>,
    ) -> Result<(Vec<ProductRecord>, ResolveSummary), StoreError> {
        let links = self.load_links().await?;
        Ok(Resolver::new(fetcher, &self.extractor)
            .with_workers(self.config.http.workers)
            .resolve_all(&links, cancel, events)
            .await)
    }

    /// Clean records into the output table.
    pub fn assemble(&self, records: &[ProductRecord]) -> ProductTable {
        assemble(records, &self.config.site.currency_symbol)
    }

    /// Write the table to the configured output file.
    pub async fn export(&self, table: &ProductTable) -> Result<(), ExportError> {
        self.export_to(table, &self.config.output_file()).await
    }

    pub async fn export_to(&self, table: &ProductTable, path: &Path) -> Result<(), ExportError> {
        export_csv(table, path).await
    }
}
