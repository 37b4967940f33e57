// ABOUTME: Selector catalog data model: fields, locators, image rules and per-platform entries.
// ABOUTME: Locators are compiled once at load time; the catalog is immutable afterwards.

//! The selector catalog.
//!
//! A [`Catalog`] maps each [`PlatformId`] to an ordered list of [`FieldSpec`]s.
//! Each field carries its locator chain, highest priority first. Locators are
//! either CSS selectors or structural path queries and serialize as
//! `{"css": "..."}` / `{"xpath": "..."}`.
//!
//! Compilation happens when a locator is deserialized or constructed. A
//! locator that fails to compile stays in the catalog but never matches, so a
//! single bad selector degrades one field rather than the whole catalog.

use std::collections::HashSet;
use std::fmt;

use aho_corasick::{AhoCorasick, MatchKind};
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::dom::xpath::XPath;
use crate::error::CatalogError;
use crate::platform::PlatformId;

/// The product fields a catalog can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Price,
    Mrp,
    Discount,
    Image,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::Mrp => "mrp",
            Field::Discount => "discount",
            Field::Image => "image",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    /// CSS selector evaluated against the whole document.
    Css,
    /// Structural path expression evaluated from the document root.
    Xpath,
}

#[derive(Debug, Clone)]
pub(crate) enum Compiled {
    Css(Selector),
    Xpath(XPath),
    Invalid,
}

/// One rule identifying zero or more elements of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "LocatorDef", into = "LocatorDef")]
pub struct Locator {
    kind: LocatorKind,
    source: String,
    compiled: Compiled,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LocatorDef {
    Css(String),
    Xpath(String),
}

impl From<LocatorDef> for Locator {
    fn from(def: LocatorDef) -> Self {
        match def {
            LocatorDef::Css(s) => Locator::css(s),
            LocatorDef::Xpath(s) => Locator::xpath(s),
        }
    }
}

impl From<Locator> for LocatorDef {
    fn from(locator: Locator) -> Self {
        match locator.kind {
            LocatorKind::Css => LocatorDef::Css(locator.source),
            LocatorKind::Xpath => LocatorDef::Xpath(locator.source),
        }
    }
}

impl Locator {
    pub fn css(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = match Selector::parse(&source) {
            Ok(sel) => Compiled::Css(sel),
            Err(e) => {
                tracing::warn!(selector = %source, error = %e, "css locator failed to compile");
                Compiled::Invalid
            }
        };
        Self {
            kind: LocatorKind::Css,
            source,
            compiled,
        }
    }

    pub fn xpath(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = match XPath::compile(&source) {
            Ok(xpath) => Compiled::Xpath(xpath),
            Err(e) => {
                tracing::warn!(xpath = %source, error = %e, "xpath locator failed to compile");
                Compiled::Invalid
            }
        };
        Self {
            kind: LocatorKind::Xpath,
            source,
            compiled,
        }
    }

    pub fn kind(&self) -> LocatorKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// False when the locator failed to compile and will never match.
    pub fn is_valid(&self) -> bool {
        !matches!(self.compiled, Compiled::Invalid)
    }

    pub(crate) fn compiled(&self) -> &Compiled {
        &self.compiled
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LocatorKind::Css => write!(f, "css:{}", self.source),
            LocatorKind::Xpath => write!(f, "xpath:{}", self.source),
        }
    }
}

/// A field paired with its locator chain, highest priority first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: Field,
    pub locators: Vec<Locator>,
}

impl FieldSpec {
    pub fn new(field: Field, locators: Vec<Locator>) -> Self {
        Self { field, locators }
    }
}

/// One literal low-resolution → high-resolution substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRewrite {
    pub from: String,
    pub to: String,
}

/// The low-resolution marker table, compiled into a single multi-pattern matcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TokenRewrite>", into = "Vec<TokenRewrite>")]
pub struct TokenTable {
    rewrites: Vec<TokenRewrite>,
    matcher: Option<AhoCorasick>,
}

impl TryFrom<Vec<TokenRewrite>> for TokenTable {
    type Error = String;

    fn try_from(rewrites: Vec<TokenRewrite>) -> Result<Self, Self::Error> {
        if rewrites.iter().any(|r| r.from.is_empty()) {
            return Err("low-resolution token must not be empty".to_string());
        }
        if rewrites.is_empty() {
            return Ok(Self::default());
        }
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(rewrites.iter().map(|r| r.from.as_str()))
            .map_err(|e| e.to_string())?;
        Ok(Self {
            rewrites,
            matcher: Some(matcher),
        })
    }
}

impl From<TokenTable> for Vec<TokenRewrite> {
    fn from(table: TokenTable) -> Self {
        table.rewrites
    }
}

impl TokenTable {
    pub fn rewrites(&self) -> &[TokenRewrite] {
        &self.rewrites
    }

    /// True when `url` contains any known low-resolution marker.
    pub fn has_marker(&self, url: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(url))
    }

    /// Replaces every low-resolution marker in `url` with its high-resolution pair.
    pub fn rewrite(&self, url: &str) -> String {
        match &self.matcher {
            Some(m) => {
                let replacements: Vec<&str> = self.rewrites.iter().map(|r| r.to.as_str()).collect();
                m.replace_all(url, &replacements)
            }
            None => url.to_string(),
        }
    }
}

/// An attribute holding a JSON object keyed by image URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedImageSource {
    pub locator: Locator,
    pub attribute: String,
}

fn default_srcset_attributes() -> Vec<String> {
    vec!["srcset".to_string(), "data-srcset".to_string()]
}

fn default_source_attributes() -> Vec<String> {
    [
        "data-old-hires",
        "data-zoom-image",
        "data-large-image",
        "data-src",
        "src",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Settings for image-field resolution on one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRules {
    /// Attributes holding responsive `URL width` candidate lists.
    #[serde(default = "default_srcset_attributes")]
    pub srcset_attributes: Vec<String>,
    /// Single-URL attributes, high-resolution hints first.
    #[serde(default = "default_source_attributes")]
    pub source_attributes: Vec<String>,
    #[serde(default)]
    pub low_res_tokens: TokenTable,
    /// Last-resort JSON blob lookup.
    #[serde(default)]
    pub embedded: Option<EmbeddedImageSource>,
}

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            srcset_attributes: default_srcset_attributes(),
            source_attributes: default_source_attributes(),
            low_res_tokens: TokenTable::default(),
            embedded: None,
        }
    }
}

/// Everything needed to extract one platform's product pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCatalog {
    pub platform: PlatformId,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub image: ImageRules,
}

impl PlatformCatalog {
    pub fn field(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field == field)
    }
}

/// Immutable, shareable mapping from platform to field definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    version: u32,
    platforms: Vec<PlatformCatalog>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate platforms or duplicate fields.
    pub fn new(version: u32, platforms: Vec<PlatformCatalog>) -> Result<Self, CatalogError> {
        let catalog = Self { version, platforms };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parses and validates a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut platforms = HashSet::new();
        for entry in &self.platforms {
            if !platforms.insert(entry.platform) {
                return Err(CatalogError::DuplicatePlatform(entry.platform.to_string()));
            }
            let mut fields = HashSet::new();
            for spec in &entry.fields {
                if !fields.insert(spec.field) {
                    return Err(CatalogError::DuplicateField {
                        platform: entry.platform.to_string(),
                        field: spec.field.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, platform: PlatformId) -> Option<&PlatformCatalog> {
        self.platforms.iter().find(|p| p.platform == platform)
    }

    pub fn platforms(&self) -> &[PlatformCatalog] {
        &self.platforms
    }

    /// Every locator in the catalog that failed to compile.
    pub fn invalid_locators(&self) -> Vec<(PlatformId, Field, &Locator)> {
        let mut out = Vec::new();
        for entry in &self.platforms {
            for spec in &entry.fields {
                for locator in spec.locators.iter().filter(|l| !l.is_valid()) {
                    out.push((entry.platform, spec.field, locator));
                }
            }
        }
        out
    }
}
