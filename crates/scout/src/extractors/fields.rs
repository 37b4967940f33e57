// ABOUTME: Plain-field resolution: walks a field's locator chain in priority order.
// ABOUTME: The first locator whose first match has non-empty content wins; later ones are skipped.

//! Field resolution.
//!
//! Key behaviors:
//! - Locators are tried strictly in order.
//! - Only the first element a locator matches is inspected.
//! - Images yield their raw `src`, meta tags their `content`, other
//!   elements their whitespace-normalized visible text.
//! - An empty value falls through to the next locator; when all are
//!   exhausted the field is the empty string.

use crate::dom::Document;
use crate::extractors::catalog::FieldSpec;
use crate::extractors::locate::locate_first;

/// Resolves one field. Never fails: a miss is the empty string.
pub fn resolve(doc: &Document, spec: &FieldSpec) -> String {
    for (index, locator) in spec.locators.iter().enumerate() {
        let Some(node) = locate_first(doc, locator) else {
            tracing::trace!(field = %spec.field, %locator, "no match");
            continue;
        };
        let value = node.content();
        if !value.is_empty() {
            tracing::debug!(field = %spec.field, index, %locator, "field resolved");
            return value;
        }
        tracing::trace!(field = %spec.field, %locator, "matched element is empty");
    }
    tracing::debug!(field = %spec.field, "no locator produced a value");
    String::new()
}
