//! End-to-end run through the public API with fake collaborators.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use orderacquire::error::{FetchError, SessionError};
use orderacquire::http_client::DetailFetcher;
use orderacquire::session::ListingSession;
use orderacquire::{Pipeline, RunConfig};

const BASE: &str = "https://shop.test";

/// Listing pages served in order; each page but the last has a next control.
struct FakeListing {
    pages: Vec<String>,
    current: usize,
}

#[async_trait]
impl ListingSession for FakeListing {
    type Control = usize;

    async fn settle(&mut self, _delay: Duration) {}

    async fn page_html(&mut self) -> Result<String, SessionError> {
        Ok(self.pages[self.current].clone())
    }

    async fn find_control(&mut self, _selector: &str) -> Result<Option<usize>, SessionError> {
        Ok((self.current + 1 < self.pages.len()).then_some(self.current + 1))
    }

    async fn activate(&mut self, control: usize) -> Result<(), SessionError> {
        self.current = control;
        Ok(())
    }
}

enum Reply {
    Body(&'static str),
    Unreachable,
}

struct FakeFetcher {
    replies: HashMap<String, Reply>,
}

#[async_trait]
impl DetailFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.replies.get(url) {
            Some(Reply::Body(body)) => Ok(body.to_string()),
            Some(Reply::Unreachable) | None => {
                // Nothing listens on port 1
                let err = reqwest::get("http://127.0.0.1:1/").await.unwrap_err();
                Err(FetchError::Transport(err))
            }
        }
    }
}

const SHOE: &str = r#"<html><body>
    <div id="wayfinding-breadcrumbs_container">
      <a class="a-link-normal a-color-tertiary" href="/c/1">Clothing</a>
      <a class="a-link-normal a-color-tertiary" href="/c/2">Shoes</a>
    </div>
    <span id="productTitle"> Shoe </span>
    <span class="a-price"><span class="a-offscreen">$50.00</span></span>
</body></html>"#;

const NO_TITLE: &str = r#"<html><body>
    <span class="a-offscreen">$12.00</span>
</body></html>"#;

fn listing_page(hrefs: &[&str]) -> String {
    let rows: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="a-fixed-left-grid-col"><div class="a-row"><a class="a-link-normal" href="{href}">{href}</a></div></div>"#
            )
        })
        .collect();
    format!("<html><body><div id=\"ordersContainer\">{rows}</div><ul><li class=\"a-last\"><a href=\"#\">Next</a></li></ul></body></html>")
}

fn config(dir: &std::path::Path) -> RunConfig {
    let mut config = RunConfig {
        store_path: dir.join("links.html"),
        output_path: dir.join("orders.csv"),
        page_settle_secs: 0,
        ..Default::default()
    };
    config.site.base_url = BASE.to_string();
    config
}

fn fetcher() -> FakeFetcher {
    let mut replies = HashMap::new();
    replies.insert(format!("{BASE}/dp/A"), Reply::Body(SHOE));
    replies.insert(format!("{BASE}/dp/B"), Reply::Body(NO_TITLE));
    replies.insert(format!("{BASE}/dp/C"), Reply::Unreachable);
    FakeFetcher { replies }
}

#[tokio::test]
async fn test_harvest_resolve_export() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config(dir.path())).unwrap();
    let cancel = CancellationToken::new();

    pipeline.reset_store().await.unwrap();
    let mut session = FakeListing {
        pages: vec![
            listing_page(&["/dp/A", "https://shop.test/dp/B"]),
            listing_page(&["/dp/C"]),
        ],
        current: 0,
    };
    let harvested = pipeline.harvest(&mut session, &cancel).await.unwrap();
    assert_eq!(harvested.pages, 2);
    assert_eq!(harvested.links, 3);

    let links = pipeline.load_links().await.unwrap();
    let urls: Vec<&str> = links.iter().map(|l| l.absolute_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://shop.test/dp/A",
            "https://shop.test/dp/B",
            "https://shop.test/dp/C"
        ]
    );

    let (records, summary) = pipeline.resolve(&fetcher(), &cancel, None).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(summary.fetch_failed, 1);

    let table = pipeline.assemble(&records);
    assert_eq!(table.len(), 1);
    let row = &table.rows()[0];
    assert_eq!(row.title, "Shoe");
    assert_eq!(row.price, 50.0);
    assert_eq!(row.categories, vec!["Clothing", "Shoes"]);

    pipeline.export(&table).await.unwrap();
    let csv = std::fs::read_to_string(dir.path().join("orders.csv")).unwrap();
    assert_eq!(
        csv,
        "title,price,categories\nShoe,50,\"[\"\"Clothing\"\",\"\"Shoes\"\"]\"\n"
    );
}

#[tokio::test]
async fn test_resolve_from_existing_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("links.html"),
        concat!(
            "<a class=\"a-link-normal\" href=\"/dp/A\">Shoe</a>\n",
            "<a class=\"a-link-normal\" href=\"/dp/A\">Shoe</a>\n",
        ),
    )
    .unwrap();

    let pipeline = Pipeline::new(config(dir.path())).unwrap();
    let (records, _) = pipeline
        .resolve(&fetcher(), &CancellationToken::new(), None)
        .await
        .unwrap();

    // Repeat purchases stay as separate rows
    assert_eq!(pipeline.assemble(&records).len(), 2);
}

#[tokio::test]
async fn test_resolve_without_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config(dir.path())).unwrap();
    assert!(pipeline
        .resolve(&fetcher(), &CancellationToken::new(), None)
        .await
        .is_err());
}

#[test]
fn test_invalid_selector_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.site.title_selector = "span[[".to_string();
    assert!(Pipeline::new(config).is_err());
}
