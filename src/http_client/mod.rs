//! HTTP client for product detail pages.

mod user_agent;

pub use user_agent::{resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::Client;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{ConfigError, FetchError};

/// Fetches one detail page body by absolute URL.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher sending a fixed header set with every request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client from the `[http]` config section.
    pub fn new(config: &HttpConfig) -> Result<Self, ConfigError> {
        let user_agent = resolve_user_agent(config.user_agent.as_deref());

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT_HEADER, header_value("User-Agent", &user_agent)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("Accept-Language", &config.accept_language)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { client })
    }

    /// Get page content as text. Non-success statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("GET {} -> {}", url, status);

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::Header {
        name,
        message: e.to_string(),
    })
}

#[async_trait]
impl DetailFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.get_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn config(user_agent: Option<&str>) -> HttpConfig {
        HttpConfig {
            user_agent: user_agent.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sends_fixed_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/dp/B0001")
            .match_header("user-agent", "TestAgent/1.0")
            .match_header("accept-language", "en-US, en;q=0.5")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<span id=\"productTitle\">Shoe</span>")
            .create_async()
            .await;

        let client = HttpClient::new(&config(Some("TestAgent/1.0"))).unwrap();
        let body = client
            .fetch(&format!("{}/dp/B0001", server.url()))
            .await
            .unwrap();

        assert!(body.contains("Shoe"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_a_fetch_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/dp/gone")
            .with_status(404)
            .with_body("Error")
            .create_async()
            .await;

        let client = HttpClient::new(&config(None)).unwrap();
        let err = client
            .fetch(&format!("{}/dp/gone", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client = HttpClient::new(&config(None)).unwrap();
        let err = client.fetch("http://127.0.0.1:1/dp/x").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let err = HttpClient::new(&config(Some("bad\nagent"))).unwrap_err();
        assert!(matches!(err, ConfigError::Header { name: "User-Agent", .. }));
    }
}
