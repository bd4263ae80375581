//! Error types for each stage of an acquisition run.
//!
//! Failures are recovered at the narrowest scope that makes sense: a missing
//! field yields an empty value, a failing product is skipped, and only
//! session, store and configuration failures abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("Invalid selector for {field}: {message}")]
    Selector { field: &'static str, message: String },
    #[error("Invalid base URL {url}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("Invalid {name} header: {message}")]
    Header { name: &'static str, message: String },
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failure reported by the browser collaborator.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("No option labelled {label:?} in {selector}")]
    OptionNotFound { selector: String, label: String },
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unsupported,
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Browser(err.to_string())
    }
}

/// Failure while signing in or opening the order history.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Login failed while {step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: SessionError,
    },
    #[error("Verification was abandoned before the session became ready")]
    Abandoned,
}

/// Failure of the intermediate link store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Link store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal failure while walking the listing pages.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Session failed on listing page {page}: {source}")]
    Session {
        page: usize,
        #[source]
        source: SessionError,
    },
    #[error("Listing container {selector:?} missing on page {page}")]
    ListingMissing { page: usize, selector: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure fetching one detail page. Never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Failure extracting a record from one detail page. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Empty document")]
    EmptyDocument,
}

/// Failure writing the output table.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to serialize categories: {0}")]
    Categories(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
