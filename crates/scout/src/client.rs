// ABOUTME: The Client that detects the platform, fetches a product page and extracts its fields.
// ABOUTME: Provides async scrape() plus scrape_html()/scrape_html_as() for already-fetched markup.

use std::sync::Arc;

use chrono::Utc;

use crate::dom::Document;
use crate::error::{ClientError, ScrapeError};
use crate::extractors::catalog::Catalog;
use crate::extractors::extract;
use crate::extractors::loader::load_builtin_catalog;
use crate::options::{ClientBuilder, Options};
use crate::platform::{detect_platform, PlatformId};
use crate::resource::{fetch, FetchOptions};
use crate::result::ScrapeResult;

/// The product page scraper.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
#[derive(Debug)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    catalog: Arc<Catalog>,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Result<Self, ClientError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()?,
        };

        let catalog = match opts.catalog.clone() {
            Some(catalog) => catalog,
            None => Arc::new(load_builtin_catalog()?),
        };

        Ok(Self {
            opts,
            http_client,
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetches `url` and extracts its product fields.
    ///
    /// URLs matching no known platform fail with an unsupported-platform
    /// error before any request is made.
    pub async fn scrape(&self, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScrapeError::invalid_url(url, "Scrape", None));
        }

        let Some(platform) = detect_platform(url) else {
            tracing::debug!(url, "no platform marker in URL");
            return Err(ScrapeError::unsupported_platform(url, "Scrape"));
        };

        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
        };
        let page = fetch(&self.http_client, url, &fetch_opts)
            .await
            .inspect_err(|e| tracing::warn!(url, %platform, error = %e, "fetch failed"))?;
        if page.final_url != page.source_url {
            tracing::debug!(url, final_url = %page.final_url, "followed redirect");
        }

        self.extract_markup(&page.text(), &page.source_url, platform)
    }

    /// Extracts product fields from markup, detecting the platform from `url`.
    pub fn scrape_html(&self, html: &str, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let Some(platform) = detect_platform(url) else {
            return Err(ScrapeError::unsupported_platform(url, "ScrapeHTML"));
        };
        self.extract_markup(html, url, platform)
    }

    /// Extracts product fields from markup for an explicit platform.
    pub fn scrape_html_as(
        &self,
        html: &str,
        platform: PlatformId,
    ) -> Result<ScrapeResult, ScrapeError> {
        self.extract_markup(html, "", platform)
    }

    fn extract_markup(
        &self,
        html: &str,
        url: &str,
        platform: PlatformId,
    ) -> Result<ScrapeResult, ScrapeError> {
        let doc = Document::parse(html);
        let fields = extract(&doc, &self.catalog, platform).ok_or_else(|| {
            ScrapeError::extract(
                url,
                "Extract",
                Some(anyhow::anyhow!("catalog has no entry for {platform}")),
            )
        })?;

        tracing::info!(
            url,
            %platform,
            filled = fields.filled(),
            total = fields.len(),
            "scrape complete"
        );

        Ok(ScrapeResult {
            url: url.to_string(),
            platform,
            fields,
            scraped_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::catalog::{Field, FieldSpec, ImageRules, Locator, PlatformCatalog};
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const FLIPKART_PAGE: &str = r#"<html><body>
        <span class="VU-ZEz">Samsung Galaxy M14</span>
        <div class="Nx9bqj CxhGGd">₹13,490</div>
        <div class="yRaY8j A6+E6v">₹17,990</div>
        <div class="UkUFwK WW8yVX"><span>25% off</span></div>
        <img class="_0DkuPH" src="https://rukminim2.flixcart.com/image/128/128/xif0q/mobile/m14.jpeg">
    </body></html>"#;

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn scrape_fetches_and_extracts() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/www.flipkart.com/galaxy-m14/p/itm1");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(FLIPKART_PAGE);
        });

        let url = server.url("/www.flipkart.com/galaxy-m14/p/itm1");
        let result = client().scrape(&url).await.unwrap();
        mock.assert();

        assert_eq!(result.platform, PlatformId::Flipkart);
        assert_eq!(result.url, url);
        assert_eq!(result.fields.get(Field::Title), Some("Samsung Galaxy M14"));
        assert_eq!(result.fields.get(Field::Price), Some("₹13,490"));
        assert_eq!(result.fields.get(Field::Mrp), Some("₹17,990"));
        assert_eq!(result.fields.get(Field::Discount), Some("25% off"));
        assert_eq!(
            result.fields.get(Field::Image),
            Some("https://rukminim2.flixcart.com/image/1080/1080/xif0q/mobile/m14.jpeg")
        );
    }

    #[tokio::test]
    async fn unknown_platform_fails_before_fetching() {
        // Nothing listens on the discard port, so any request would be a fetch error.
        let err = client()
            .scrape("http://127.0.0.1:9/shop.example.org/item")
            .await
            .unwrap_err();
        assert!(err.is_unsupported_platform());
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/www.amazon.in/dp/B0");
            then.status(503).body("Service Unavailable");
        });

        let err = client()
            .scrape(&server.url("/www.amazon.in/dp/B0"))
            .await
            .unwrap_err();
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn empty_url_is_invalid() {
        let err = client().scrape("  ").await.unwrap_err();
        assert!(err.is_invalid_url());
    }

    #[test]
    fn scrape_html_detects_platform_from_url() {
        let result = client()
            .scrape_html(FLIPKART_PAGE, "https://www.flipkart.com/x/p/itm1")
            .unwrap();
        assert_eq!(result.platform, PlatformId::Flipkart);
        assert_eq!(result.fields.len(), 5);

        let err = client()
            .scrape_html(FLIPKART_PAGE, "https://example.org/x")
            .unwrap_err();
        assert!(err.is_unsupported_platform());
    }

    #[test]
    fn scrape_html_as_uses_explicit_platform() {
        let result = client()
            .scrape_html_as(FLIPKART_PAGE, PlatformId::Amazon)
            .unwrap();
        assert_eq!(result.platform, PlatformId::Amazon);
        assert_eq!(result.fields.filled(), 0);
        assert_eq!(result.url, "");
    }

    #[test]
    fn missing_catalog_entry_is_extract_error() {
        let catalog = Catalog::new(
            1,
            vec![PlatformCatalog {
                platform: PlatformId::Amazon,
                fields: vec![FieldSpec::new(Field::Title, vec![Locator::css("#productTitle")])],
                image: ImageRules::default(),
            }],
        )
        .unwrap();
        let client = Client::builder().catalog(catalog).build().unwrap();
        let err = client
            .scrape_html(FLIPKART_PAGE, "https://www.flipkart.com/x")
            .unwrap_err();
        assert!(err.is_extract());
    }
}
