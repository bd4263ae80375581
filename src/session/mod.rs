//! Browser session collaborators.
//!
//! The pipeline never talks to a browser directly. It drives the listing
//! through [`ListingSession`] and the sign-in form through [`FormDriver`],
//! both implemented by `ChromeSession` when the `browser` feature is enabled.

mod config;
mod login;

#[cfg(feature = "browser")]
mod browser;

pub use config::BrowserEngineConfig;
pub use login::{open_order_history, LoginDelays, LoginFlow, LoginStep};

#[cfg(feature = "browser")]
pub use browser::ChromeSession;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionError;

/// Read access to the paginated order listing.
#[async_trait]
pub trait ListingSession: Send {
    /// Handle to an interactive element on the current page.
    type Control: Send;

    /// Wait for the current page to stabilize. A fixed delay, not a poll.
    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    /// HTML of the current page.
    async fn page_html(&mut self) -> Result<String, SessionError>;

    /// Look up a control on the current page. Absence is `Ok(None)`.
    async fn find_control(&mut self, selector: &str)
        -> Result<Option<Self::Control>, SessionError>;

    /// Activate (click) a control returned by [`find_control`](Self::find_control).
    async fn activate(&mut self, control: Self::Control) -> Result<(), SessionError>;
}

/// Form-level operations used by the login flow.
#[async_trait]
pub trait FormDriver: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Type `text` into the element matching `selector`.
    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), SessionError>;

    async fn click(&mut self, selector: &str) -> Result<(), SessionError>;

    /// Choose the option whose visible text equals `label` in a `<select>`.
    async fn select_option(&mut self, selector: &str, label: &str) -> Result<(), SessionError>;

    /// Capture a debugging screenshot. Best effort.
    async fn screenshot(&mut self, name: &str);

    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
