//! Chrome-backed session using chromiumoxide (CDP).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserEngineConfig, FormDriver, ListingSession};
use crate::error::SessionError;

/// One browser tab driven through the sign-in form and the order listing.
pub struct ChromeSession {
    config: BrowserEngineConfig,
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch Chrome, or connect to a remote instance when `remote_url` is set.
    pub async fn launch(config: BrowserEngineConfig) -> Result<Self, SessionError> {
        let (browser, mut handler) = match config.remote_url.clone() {
            Some(remote_url) => Self::connect_remote(&remote_url, &config).await?,
            None => {
                info!("Launching browser (headless={})", config.headless);
                let chrome_path = Self::find_chrome()?;

                let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

                // with_head means NOT headless
                if !config.headless {
                    builder = builder.with_head();
                }

                builder = builder
                    .arg("--disable-blink-features=AutomationControlled")
                    .arg("--disable-infobars")
                    .arg("--no-first-run")
                    .arg("--no-default-browser-check");

                for arg in &config.chrome_args {
                    builder = builder.arg(arg);
                }

                let browser_config = builder.build().map_err(|e| {
                    SessionError::Browser(format!("Failed to build browser config: {}", e))
                })?;

                Browser::launch(browser_config).await?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            config,
            browser,
            page,
            handler,
        })
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<PathBuf, SessionError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(SessionError::Browser(
            "Chrome/Chromium not found. Install it or set BROWSER_URL to a running instance"
                .to_string(),
        ))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(
        url: &str,
        config: &BrowserEngineConfig,
    ) -> Result<(Browser, chromiumoxide::Handler), SessionError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                SessionError::Browser(format!("Failed to parse browser version info: {}", e))
            })?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SessionError::Browser("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        Ok(Browser::connect_with_config(ws_url, handler_config).await?)
    }

    async fn element(&self, selector: &str) -> Result<Element, SessionError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| SessionError::ElementNotFound(selector.to_string()))
    }

    /// Close the browser.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        self.handler.abort();
    }
}

#[async_trait]
impl ListingSession for ChromeSession {
    type Control = Element;

    async fn page_html(&mut self) -> Result<String, SessionError> {
        Ok(self.page.content().await?)
    }

    async fn find_control(&mut self, selector: &str) -> Result<Option<Element>, SessionError> {
        let mut found = self.page.find_elements(selector).await?;
        if found.is_empty() {
            Ok(None)
        } else {
            Ok(Some(found.swap_remove(0)))
        }
    }

    async fn activate(&mut self, control: Element) -> Result<(), SessionError> {
        control.click().await?;
        let timeout = Duration::from_secs(self.config.timeout);
        if tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            warn!("Timeout waiting for navigation after click");
        }
        Ok(())
    }
}

#[async_trait]
impl FormDriver for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), SessionError> {
        let element = self.element(selector).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        self.element(selector).await?.click().await?;
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, label: &str) -> Result<(), SessionError> {
        let script = format!(
            r#"(() => {{
                const select = document.querySelector({selector});
                if (!select) return false;
                const option = Array.from(select.options).find(o => o.text.trim() === {label});
                if (!option) return false;
                select.value = option.value;
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            selector = serde_json::to_string(selector).unwrap_or_default(),
            label = serde_json::to_string(label).unwrap_or_default(),
        );

        let selected: bool = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| SessionError::Browser(e.to_string()))?;

        if selected {
            Ok(())
        } else {
            Err(SessionError::OptionNotFound {
                selector: selector.to_string(),
                label: label.to_string(),
            })
        }
    }

    async fn screenshot(&mut self, name: &str) {
        let Some(dir) = self.config.screenshots_dir.clone() else {
            return;
        };

        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            ..Default::default()
        };

        let data = match self.page.screenshot(params).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Screenshot {} failed: {}", name, e);
                return;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!("Cannot create screenshot directory {:?}: {}", dir, e);
            return;
        }
        let path = dir.join(format!("{}.png", name));
        match tokio::fs::write(&path, data).await {
            Ok(()) => debug!("Saved screenshot {:?}", path),
            Err(e) => warn!("Failed to write screenshot {:?}: {}", path, e),
        }
    }
}
