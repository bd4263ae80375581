//! Walks the paginated order listing, page by page.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{LinkHarvester, RawLinkStore};
use crate::error::HarvestError;
use crate::session::ListingSession;

/// Outcome of a listing walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Listing pages read.
    pub pages: usize,
    /// Link fragments appended to the store.
    pub links: usize,
    /// The walk stopped because of cancellation rather than the last page.
    pub cancelled: bool,
}

/// Drives the listing until no next-page control remains.
pub struct PaginationWalker<'a> {
    harvester: &'a LinkHarvester,
    next_page_selector: &'a str,
    settle: Duration,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(harvester: &'a LinkHarvester, next_page_selector: &'a str, settle: Duration) -> Self {
        Self {
            harvester,
            next_page_selector,
            settle,
        }
    }

    /// Harvest every listing page into `store`.
    ///
    /// Pages are visited strictly in order: the next-page control of a page
    /// only exists once that page has settled. The store is appended to after
    /// each page, so an abort keeps everything harvested so far.
    pub async fn harvest_all_pages<S: ListingSession>(
        &self,
        session: &mut S,
        store: &RawLinkStore,
        cancel: &CancellationToken,
    ) -> Result<HarvestSummary, HarvestError> {
        let mut summary = HarvestSummary::default();

        loop {
            let page = summary.pages + 1;
            session.settle(self.settle).await;

            info!("Scraping orders page {}", page);
            let html = session
                .page_html()
                .await
                .map_err(|source| HarvestError::Session { page, source })?;

            if !self.harvester.has_listing(&html) {
                return Err(HarvestError::ListingMissing {
                    page,
                    selector: self
                        .harvester
                        .listing_container_selector()
                        .unwrap_or_default()
                        .to_string(),
                });
            }

            let fragments = self.harvester.listing_fragments(&html);
            debug!("Page {}: {} links", page, fragments.len());
            store.append(&fragments).await?;
            summary.pages = page;
            summary.links += fragments.len();

            if cancel.is_cancelled() {
                info!("Cancelled after page {}", page);
                summary.cancelled = true;
                break;
            }

            let next = session
                .find_control(self.next_page_selector)
                .await
                .map_err(|source| HarvestError::Session { page, source })?;

            match next {
                Some(control) => session
                    .activate(control)
                    .await
                    .map_err(|source| HarvestError::Session { page, source })?,
                None => {
                    debug!("No next page after page {}", page);
                    break;
                }
            }
        }

        info!(
            "Listing walk complete: {} pages, {} links",
            summary.pages, summary.links
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::error::SessionError;
    use async_trait::async_trait;

    /// Serves a fixed list of pages; every page but the last has a next control.
    struct FakeListing {
        pages: Vec<String>,
        current: usize,
        reads: usize,
        fail_on_read: Option<usize>,
    }

    impl FakeListing {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages,
                current: 0,
                reads: 0,
                fail_on_read: None,
            }
        }
    }

    #[async_trait]
    impl ListingSession for FakeListing {
        type Control = usize;

        async fn settle(&mut self, _delay: Duration) {}

        async fn page_html(&mut self) -> Result<String, SessionError> {
            self.reads += 1;
            if self.fail_on_read == Some(self.reads) {
                return Err(SessionError::Browser("tab crashed".into()));
            }
            Ok(self.pages[self.current].clone())
        }

        async fn find_control(&mut self, selector: &str) -> Result<Option<usize>, SessionError> {
            assert_eq!(selector, ".a-last a");
            Ok((self.current + 1 < self.pages.len()).then_some(self.current + 1))
        }

        async fn activate(&mut self, control: usize) -> Result<(), SessionError> {
            self.current = control;
            Ok(())
        }
    }

    fn listing_page(products: &[&str]) -> String {
        let rows: String = products
            .iter()
            .map(|p| {
                format!(
                    r#"<div class="a-row"><a class="a-link-normal" href="/dp/{p}">{p}</a></div>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><div id="ordersContainer"><div class="a-fixed-left-grid-col">{rows}</div></div></body></html>"#
        )
    }

    async fn setup() -> (tempfile::TempDir, RawLinkStore, LinkHarvester) {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLinkStore::new(dir.path().join("links.html"));
        store.reset().await.unwrap();
        let harvester = LinkHarvester::new(&SiteConfig::default()).unwrap();
        (dir, store, harvester)
    }

    #[tokio::test]
    async fn test_empty_listing_single_iteration() {
        let (_dir, store, harvester) = setup().await;
        let mut session = FakeListing::new(vec![listing_page(&[])]);
        let walker = PaginationWalker::new(&harvester, ".a-last a", Duration::ZERO);

        let summary = walker
            .harvest_all_pages(&mut session, &store, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.links, 0);
        assert_eq!(session.reads, 1);
        assert!(store.load(&harvester).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pages_concatenated_in_visit_order() {
        let (_dir, store, harvester) = setup().await;
        let mut session = FakeListing::new(vec![
            listing_page(&["A1", "A2"]),
            listing_page(&["B1"]),
            listing_page(&["C1", "C2", "C3"]),
        ]);
        let walker = PaginationWalker::new(&harvester, ".a-last a", Duration::ZERO);

        let summary = walker
            .harvest_all_pages(&mut session, &store, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.links, 6);
        assert!(!summary.cancelled);

        let texts: Vec<String> = store
            .load(&harvester)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.display_text)
            .collect();
        assert_eq!(texts, vec!["A1", "A2", "B1", "C1", "C2", "C3"]);
    }

    #[tokio::test]
    async fn test_cancel_stops_between_pages() {
        let (_dir, store, harvester) = setup().await;
        let mut session = FakeListing::new(vec![listing_page(&["A1"]), listing_page(&["B1"])]);
        let walker = PaginationWalker::new(&harvester, ".a-last a", Duration::ZERO);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = walker
            .harvest_all_pages(&mut session, &store, &cancel)
            .await
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.pages, 1);
        assert_eq!(store.load(&harvester).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_failure_is_fatal_but_keeps_progress() {
        let (_dir, store, harvester) = setup().await;
        let mut session = FakeListing::new(vec![listing_page(&["A1"]), listing_page(&["B1"])]);
        session.fail_on_read = Some(2);
        let walker = PaginationWalker::new(&harvester, ".a-last a", Duration::ZERO);

        let err = walker
            .harvest_all_pages(&mut session, &store, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Session { page: 2, .. }));
        assert_eq!(store.load(&harvester).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_page_is_not_an_empty_listing() {
        let (_dir, store, harvester) = setup().await;
        let mut session = FakeListing::new(vec![r#"<html><body>
            <form name="signIn" method="post"><input type="email" name="email"></form>
        </body></html>"#
            .to_string()]);
        let walker = PaginationWalker::new(&harvester, ".a-last a", Duration::ZERO);

        let err = walker
            .harvest_all_pages(&mut session, &store, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::ListingMissing { page: 1, .. }));
        assert!(err.to_string().contains("#ordersContainer"));
        assert!(store.load(&harvester).await.unwrap().is_empty());
    }
}
