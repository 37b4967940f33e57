// ABOUTME: Configuration options for the scraping Client and the fluent ClientBuilder.
// ABOUTME: Covers request timeout, User-Agent, extra headers, a custom HTTP client and catalog.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::error::ClientError;
use crate::extractors::catalog::Catalog;

/// Desktop browser User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration options for the [`Client`].
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    /// Replaces the built-in catalog when set.
    pub catalog: Option<Arc<Catalog>>,
}

impl Default for Options {
    fn default() -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "Accept-Language".to_string(),
            "en-US,en;q=0.9".to_string(),
        );
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_client: None,
            headers,
            catalog: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Use a custom HTTP client. Timeout and User-Agent settings are then ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a custom selector catalog.
    pub fn catalog(mut self, catalog: impl Into<Arc<Catalog>>) -> Self {
        self.opts.catalog = Some(catalog.into());
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        Client::new(self.opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_look_like_a_desktop_browser() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(opts.user_agent.starts_with("Mozilla/5.0"));
        assert!(opts.headers.contains_key("Accept-Language"));
        assert!(opts.catalog.is_none());
    }

    #[test]
    fn builder_overrides() {
        let builder = ClientBuilder::new()
            .timeout(Duration::from_secs(5))
            .user_agent("pricetag-test")
            .header("X-Trace", "1");
        assert_eq!(builder.opts.timeout, Duration::from_secs(5));
        assert_eq!(builder.opts.user_agent, "pricetag-test");
        assert_eq!(builder.opts.headers.get("X-Trace").map(String::as_str), Some("1"));
    }
}
