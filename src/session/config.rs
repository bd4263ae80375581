//! Browser engine configuration types.
//!
//! These live outside `#[cfg(feature = "browser")]` so config parsing works
//! without the browser feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode. Off by default: sign-in may need a human to
    /// solve a verification challenge in the window.
    #[serde(default)]
    pub headless: bool,

    /// Page operation timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    /// Can also be set via BROWSER_URL environment variable.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Directory for debugging screenshots. Screenshots are skipped when unset.
    #[serde(default)]
    pub screenshots_dir: Option<PathBuf>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: false,
            timeout: default_timeout(),
            chrome_args: Vec::new(),
            remote_url: None,
            screenshots_dir: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `BROWSER_SCREENSHOTS` - Screenshot directory
    ///
    /// Blank `remote_url` and `screenshots_dir` values count as unset.
    pub fn with_env_overrides(mut self) -> Self {
        self.remote_url = self.remote_url.filter(|u| !u.trim().is_empty());
        self.screenshots_dir = self
            .screenshots_dir
            .filter(|d| !d.as_os_str().is_empty());

        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.is_empty() {
                self.remote_url = Some(val);
            }
        }

        if self.screenshots_dir.is_none() {
            if let Ok(val) = std::env::var("BROWSER_SCREENSHOTS") {
                if !val.is_empty() {
                    self.screenshots_dir = Some(PathBuf::from(val));
                }
            }
        }

        self
    }
}

pub fn default_timeout() -> u64 {
    30
}
