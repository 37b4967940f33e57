// ABOUTME: Resolution-aware image URL selection for the image field.
// ABOUTME: Prefers the widest srcset candidate, then hint attributes, then an embedded JSON map.

//! Image resolution.
//!
//! For each locator in priority order, every matched element is inspected:
//!
//! 1. Responsive candidate lists (`srcset`-style attributes) are parsed and
//!    the candidate with the strictly largest `w` descriptor is kept.
//! 2. The first non-empty single-URL attribute from the rules' priority list
//!    is read. It is used when no responsive candidate exists, or when the
//!    responsive candidate still carries a low-resolution marker and the
//!    attribute value does not.
//!
//! The first element yielding a URL ends the search. If nothing matched and
//! the platform declares an embedded JSON source, its first key is used.
//! Any URL found has its low-resolution markers rewritten.

use crate::dom::{Document, Node};
use crate::extractors::catalog::{EmbeddedImageSource, FieldSpec, ImageRules};
use crate::extractors::locate::{locate, locate_first};

/// Splits a responsive candidate list into `(url, descriptor)` pairs.
///
/// A URL runs to the next whitespace and may itself contain commas
/// (`/w_100,h_100/a.jpg`); trailing commas end it with no descriptor.
/// Descriptors run to the next comma.
fn srcset_candidates(srcset: &str) -> Vec<(&str, Option<&str>)> {
    let mut out = Vec::new();
    let mut rest = srcset;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (raw_url, after) = rest.split_at(url_end);
        let url = raw_url.trim_end_matches(',');
        if url.len() < raw_url.len() {
            out.push((url, None));
            rest = after;
            continue;
        }
        let desc_end = after.find(',').unwrap_or(after.len());
        let descriptor = after[..desc_end].trim();
        out.push((url, (!descriptor.is_empty()).then_some(descriptor)));
        rest = &after[desc_end..];
    }
    out
}

/// Picks the URL with the largest `w` descriptor from a responsive candidate list.
///
/// Candidates with no descriptor or a non-width descriptor (`2x`) are ignored.
/// Ties keep the earlier candidate.
pub fn best_srcset_candidate(srcset: &str) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    for (url, descriptor) in srcset_candidates(srcset) {
        let Some(width) = descriptor
            .and_then(|d| d.split_whitespace().next())
            .and_then(|d| d.strip_suffix(&['w', 'W'][..]))
            .and_then(|w| w.parse::<u32>().ok())
        else {
            continue;
        };
        if best.map_or(true, |(w, _)| width > w) {
            best = Some((width, url));
        }
    }
    best.map(|(_, url)| url.to_string())
}

/// Lazy-loading placeholders are not real image sources.
fn is_placeholder(value: &str) -> bool {
    value.starts_with("data:")
}

fn image_url_from_node(node: &Node<'_>, rules: &ImageRules) -> Option<String> {
    let responsive = rules
        .srcset_attributes
        .iter()
        .filter_map(|attr| node.attr(attr))
        .find_map(best_srcset_candidate);

    let fallback = rules
        .source_attributes
        .iter()
        .filter_map(|attr| node.attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty() && !is_placeholder(v));

    let tokens = &rules.low_res_tokens;
    match (responsive, fallback) {
        (Some(r), Some(f)) if tokens.has_marker(&r) && !tokens.has_marker(f) => Some(f.to_string()),
        (Some(r), _) => Some(r),
        (None, f) => f.map(str::to_string),
    }
}

/// Reads the first key of a JSON object stored in an attribute.
///
/// Absent elements, absent attributes and malformed JSON all yield `None`.
pub fn embedded_image(doc: &Document, source: &EmbeddedImageSource) -> Option<String> {
    let node = locate_first(doc, &source.locator)?;
    let raw = node.attr(&source.attribute)?;
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        Ok(map) => map
            .keys()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
            .map(str::to_string),
        Err(e) => {
            tracing::debug!(attribute = %source.attribute, error = %e, "embedded image data is not a JSON object");
            None
        }
    }
}

/// Resolves the image field. Never fails: a miss is the empty string.
pub fn resolve_image(doc: &Document, spec: &FieldSpec, rules: &ImageRules) -> String {
    let found = spec.locators.iter().enumerate().find_map(|(index, locator)| {
        let url = locate(doc, locator).find_map(|node| image_url_from_node(&node, rules));
        if url.is_some() {
            tracing::debug!(index, %locator, "image resolved");
        }
        url
    });

    let found = found.or_else(|| {
        let source = rules.embedded.as_ref()?;
        let url = embedded_image(doc, source);
        if url.is_some() {
            tracing::debug!(attribute = %source.attribute, "image resolved from embedded data");
        }
        url
    });

    match found {
        Some(url) => rules.low_res_tokens.rewrite(&url),
        None => {
            tracing::debug!("no image candidate found");
            String::new()
        }
    }
}
