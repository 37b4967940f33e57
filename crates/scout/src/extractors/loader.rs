// ABOUTME: Loads selector catalogs from the embedded JSON data or from a file on disk.
// ABOUTME: Provides load_builtin_catalog() used by the default Client.

//! Catalog loader.
//!
//! The built-in catalog ships inside the binary. A replacement catalog in the
//! same JSON format can be loaded from disk so selectors can be refreshed
//! without a rebuild.

use std::path::Path;

use crate::error::CatalogError;
use crate::extractors::catalog::Catalog;

/// Embedded JSON holding the built-in Flipkart and Amazon selectors.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../../data/catalog.json");

/// Parses the built-in catalog.
pub fn load_builtin_catalog() -> Result<Catalog, CatalogError> {
    let catalog = Catalog::from_json(BUILTIN_CATALOG_JSON)?;
    report_invalid(&catalog);
    Ok(catalog)
}

/// Reads and validates a catalog file.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let catalog = Catalog::from_json(&json)?;
    tracing::info!(
        path = %path.display(),
        version = catalog.version(),
        platforms = catalog.platforms().len(),
        "loaded catalog file"
    );
    report_invalid(&catalog);
    Ok(catalog)
}

fn report_invalid(catalog: &Catalog) {
    for (platform, field, locator) in catalog.invalid_locators() {
        tracing::warn!(%platform, %field, %locator, "catalog locator will never match");
    }
}
