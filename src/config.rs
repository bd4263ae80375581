//! Run configuration, discovered with the prefer crate and parsed with serde.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::session::{BrowserEngineConfig, LoginDelays};

/// Name used for config file discovery (`orderacquire.toml`, `.json`, ...).
pub const CONFIG_NAME: &str = "orderacquire";

const SIGN_IN_URL: &str = "https://www.amazon.com/ap/signin?openid.pape.max_auth_age=0&openid.return_to=https%3A%2F%2Fwww.amazon.com%2F%3Fref_%3Dnav_custrec_signin&openid.identity=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0%2Fidentifier_select&openid.assoc_handle=usflex&openid.mode=checkid_setup&openid.claimed_id=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0%2Fidentifier_select&openid.ns=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0&";

/// Everything one acquisition run needs, passed explicitly into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Visible text of the order-history time filter option (e.g. "2022").
    #[serde(default = "default_year")]
    pub year: String,

    /// Intermediate file holding raw link fragments between the two stages.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// CSV output file.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Fixed wait before reading each listing page.
    #[serde(default = "default_page_settle_secs")]
    pub page_settle_secs: u64,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub browser: BrowserEngineConfig,

    #[serde(default)]
    pub login: LoginConfig,

    /// Path the config was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_year() -> String {
    "2022".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("filtered_elements.html")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("orders.csv")
}

fn default_page_settle_secs() -> u64 {
    2
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            store_path: default_store_path(),
            output_path: default_output_path(),
            page_settle_secs: default_page_settle_secs(),
            site: SiteConfig::default(),
            http: HttpConfig::default(),
            browser: BrowserEngineConfig::default(),
            login: LoginConfig::default(),
            source_path: None,
        }
    }
}

impl RunConfig {
    /// Load configuration using prefer for discovery.
    /// Falls back to defaults when no config file is found.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default_with_env()),
            },
            Err(_) => Ok(Self::default_with_env()),
        }
    }

    /// Defaults with environment overrides applied.
    pub fn default_with_env() -> Self {
        let mut config = Self::default();
        config.browser = config.browser.with_env_overrides();
        config
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        config.browser = config.browser.with_env_overrides();
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Directory relative paths are resolved against: the config file's
    /// directory when one was loaded, otherwise the working directory.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a possibly relative, possibly `~`-prefixed path.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let path = PathBuf::from(expanded);

        if path.is_absolute() {
            path
        } else {
            self.base_dir().join(path)
        }
    }

    pub fn store_file(&self) -> PathBuf {
        self.resolve_path(&self.store_path)
    }

    pub fn output_file(&self) -> PathBuf {
        self.resolve_path(&self.output_path)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_secs(self.page_settle_secs)
    }
}

/// Storefront URLs and the CSS selectors used to read its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub sign_in_url: String,
    /// Product anchors in any document (listing page or stored fragments).
    pub link_selector: String,
    /// Product anchors inside order rows of a listing page.
    pub listing_link_selector: String,
    /// A listing page without this element aborts the walk, so a sign-in or
    /// challenge page is never mistaken for an empty listing. Blank disables
    /// the check.
    pub listing_container_selector: Option<String>,
    pub next_page_selector: String,
    pub title_selector: String,
    /// Price locations, tried in order.
    pub price_selectors: Vec<String>,
    pub breadcrumb_container_selector: String,
    pub breadcrumb_link_selector: String,
    pub currency_symbol: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.com".to_string(),
            sign_in_url: SIGN_IN_URL.to_string(),
            link_selector: "a.a-link-normal".to_string(),
            listing_link_selector: "div.a-fixed-left-grid-col div.a-row a.a-link-normal"
                .to_string(),
            listing_container_selector: Some("#ordersContainer".to_string()),
            next_page_selector: ".a-last a".to_string(),
            title_selector: "span#productTitle".to_string(),
            price_selectors: vec![
                "span#priceblock_ourprice".to_string(),
                "span.a-offscreen".to_string(),
            ],
            breadcrumb_container_selector: "#wayfinding-breadcrumbs_container".to_string(),
            breadcrumb_link_selector: "a.a-link-normal.a-color-tertiary".to_string(),
            currency_symbol: "$".to_string(),
        }
    }
}

impl SiteConfig {
    /// Scheme and host of `base_url`, without a trailing slash.
    pub fn origin(&self) -> Result<String, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(url.origin().ascii_serialization())
    }
}

/// Detail-page HTTP settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// None keeps the placeholder agent, "impersonate" picks a real browser
    /// agent, anything else is sent verbatim.
    pub user_agent: Option<String>,
    pub accept_language: String,
    pub timeout_secs: u64,
    /// Concurrent detail fetches. 1 resolves strictly in sequence.
    pub workers: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            accept_language: "en-US, en;q=0.5".to_string(),
            timeout_secs: 30,
            workers: 1,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Waits around sign-in and order-history navigation, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub page_load_secs: u64,
    pub form_secs: u64,
    /// Wait after the verification step is confirmed.
    pub after_verification_secs: u64,
    pub orders_page_secs: u64,
    pub filter_secs: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            page_load_secs: 2,
            form_secs: 3,
            after_verification_secs: 10,
            orders_page_secs: 8,
            filter_secs: 5,
        }
    }
}

impl LoginConfig {
    pub fn delays(&self) -> LoginDelays {
        LoginDelays {
            page_load: Duration::from_secs(self.page_load_secs),
            form: Duration::from_secs(self.form_secs),
            after_verification: Duration::from_secs(self.after_verification_secs),
            orders_page: Duration::from_secs(self.orders_page_secs),
            filter: Duration::from_secs(self.filter_secs),
        }
    }
}

/// Parse a configured CSS selector, naming the config field on failure.
pub(crate) fn parse_selector(field: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        field,
        message: format!("{:?}: {:?}", css, e),
    })
}

/// Sign-in credentials for the storefront account.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Build credentials, rejecting missing or empty values.
    pub fn new(email: Option<String>, password: Option<String>) -> Result<Self, ConfigError> {
        let email = email
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingCredential("email (AZ_USER)"))?;
        let password = password
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingCredential("password (AZ_PASSWORD)"))?;
        Ok(Self { email, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
