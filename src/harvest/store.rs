//! Durable hand-off between the pagination walk and resolution.
//!
//! A plain text file with one raw anchor fragment per line. It is truncated
//! when a run starts and appended to after every listing page, so links
//! harvested before a crash can still be resolved later.

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::LinkHarvester;
use crate::error::StoreError;
use crate::models::CandidateLink;

/// Append-only file of raw link fragments.
#[derive(Debug, Clone)]
pub struct RawLinkStore {
    path: PathBuf,
}

impl RawLinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Truncate the store, creating it (and its directory) if needed.
    pub async fn reset(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(self.io_error())?;
            }
        }
        fs::write(&self.path, b"").await.map_err(self.io_error())?;
        debug!("Reset link store {:?}", self.path);
        Ok(())
    }

    /// Append one listing page worth of fragments.
    pub async fn append(&self, fragments: &[String]) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(self.io_error())?;

        let mut buf = String::new();
        for fragment in fragments {
            // Keep one fragment per line even if the anchor spans lines
            buf.push_str(&fragment.replace(['\r', '\n'], " "));
            buf.push('\n');
        }

        file.write_all(buf.as_bytes()).await.map_err(self.io_error())?;
        file.flush().await.map_err(self.io_error())?;
        Ok(())
    }

    /// Raw contents, one fragment per line.
    pub async fn read_raw(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path).await.map_err(self.io_error())
    }

    /// Re-parse the whole store into candidate links, in append order.
    pub async fn load(&self, harvester: &LinkHarvester) -> Result<Vec<CandidateLink>, StoreError> {
        let raw = self.read_raw().await?;
        Ok(harvester.extract_links(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn harvester() -> LinkHarvester {
        LinkHarvester::new(&SiteConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_reset_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLinkStore::new(dir.path().join("links.html"));

        store
            .append(&[r#"<a class="a-link-normal" href="/a">A</a>"#.to_string()])
            .await
            .unwrap();
        assert!(!store.read_raw().await.unwrap().is_empty());

        store.reset().await.unwrap();
        assert_eq!(store.read_raw().await.unwrap(), "");
        assert!(store.load(&harvester()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLinkStore::new(dir.path().join("nested/run/links.html"));
        store.reset().await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_append_preserves_order_across_pages() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLinkStore::new(dir.path().join("links.html"));
        store.reset().await.unwrap();

        store
            .append(&[
                r#"<a class="a-link-normal" href="/p1">One</a>"#.to_string(),
                r#"<a class="a-link-normal" href="/p2">Two</a>"#.to_string(),
            ])
            .await
            .unwrap();
        store.append(&[]).await.unwrap();
        store
            .append(&[r#"<a class="a-link-normal" href="/p1">One</a>"#.to_string()])
            .await
            .unwrap();

        let links = store.load(&harvester()).await.unwrap();
        let texts: Vec<&str> = links.iter().map(|l| l.display_text.as_str()).collect();
        assert_eq!(texts, vec!["One", "Two", "One"]);
        assert_eq!(store.read_raw().await.unwrap().lines().count(), 3);
    }

    #[tokio::test]
    async fn test_multiline_fragment_stays_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLinkStore::new(dir.path().join("links.html"));
        store
            .append(&["<a class=\"a-link-normal\" href=\"/p\">\n  Long\n  name\n</a>".to_string()])
            .await
            .unwrap();

        assert_eq!(store.read_raw().await.unwrap().lines().count(), 1);
        let links = store.load(&harvester()).await.unwrap();
        assert_eq!(links[0].display_text, "Long   name");
    }

    #[tokio::test]
    async fn test_missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLinkStore::new(dir.path().join("absent.html"));
        let err = store.load(&harvester()).await.unwrap_err();
        assert!(err.to_string().contains("absent.html"));
    }
}
