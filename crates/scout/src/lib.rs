// ABOUTME: Library entry point for pricetag-scout, the e-commerce product page scraper.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Catalog, ResultMap, ScrapeResult and errors.

//! pricetag-scout extracts product fields (title, price, MRP, discount and a
//! high-resolution image URL) from Flipkart and Amazon product pages.
//!
//! Selectors live in a data-driven [`Catalog`]: each field has an ordered
//! chain of CSS or structural-path locators, and the first one producing a
//! non-empty value wins. A field that nothing matches is the empty string,
//! never an error.
//!
//! # Example
//!
//! ```no_run
//! use pricetag_scout::{Client, Field};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::builder().build()?;
//!     let result = client.scrape("https://www.amazon.in/dp/B09B8V1LZ3").await?;
//!     println!("{}", result.fields.get(Field::Price).unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod options;
pub mod platform;
pub mod resource;
pub mod result;

pub use crate::client::Client;
pub use crate::dom::Document;
pub use crate::error::{CatalogError, ClientError, ErrorCode, ScrapeError};
pub use crate::extractors::catalog::{
    Catalog, EmbeddedImageSource, Field, FieldSpec, ImageRules, Locator, LocatorKind,
    PlatformCatalog, TokenRewrite, TokenTable,
};
pub use crate::extractors::extract;
pub use crate::extractors::loader::{load_builtin_catalog, load_catalog_file};
pub use crate::options::{ClientBuilder, Options};
pub use crate::platform::{detect_platform, PlatformId, UnknownPlatform};
pub use crate::result::{ResultMap, ScrapeResult};
