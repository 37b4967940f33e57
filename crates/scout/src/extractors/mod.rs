// ABOUTME: Extraction pipeline: catalog lookup, per-field resolution and result aggregation.
// ABOUTME: Every catalog field always appears in the result, empty when nothing matched.

//! Product field extraction.
//!
//! Submodules:
//! - `catalog`: the selector catalog data model.
//! - `loader`: the built-in catalog and catalog files.
//! - `locate`: locator evaluation against a document.
//! - `fields`: plain text field resolution.
//! - `image`: resolution-aware image field resolution.

pub mod catalog;
pub mod fields;
pub mod image;
pub mod loader;
pub mod locate;

use crate::dom::Document;
use crate::extractors::catalog::{Catalog, Field, PlatformCatalog};
use crate::platform::PlatformId;
use crate::result::ResultMap;

/// Extracts every field of one platform catalog entry.
pub fn extract_with(doc: &Document, entry: &PlatformCatalog) -> ResultMap {
    let mut result = ResultMap::new();
    for spec in &entry.fields {
        let value = match spec.field {
            Field::Image => image::resolve_image(doc, spec, &entry.image),
            _ => fields::resolve(doc, spec),
        };
        result.insert(spec.field, value);
    }
    result
}

/// Extracts a platform's fields from a document.
///
/// Returns `None` only when the catalog has no entry for `platform`.
pub fn extract(doc: &Document, catalog: &Catalog, platform: PlatformId) -> Option<ResultMap> {
    let entry = catalog.get(platform)?;
    Some(extract_with(doc, entry))
}
