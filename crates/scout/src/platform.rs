// ABOUTME: Platform identifiers and URL-based platform detection.
// ABOUTME: Detection is a pure substring match over a fixed, ordered marker table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The retailers a catalog can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    Flipkart,
    Amazon,
}

/// Ordered marker table. First platform with a matching marker wins.
const PLATFORM_MARKERS: &[(PlatformId, &[&str])] = &[
    (PlatformId::Flipkart, &["flipkart.com", "dl.flipkart.com"]),
    (PlatformId::Amazon, &["amazon", "amzn.to", "amzn.in", "amzn.eu"]),
];

impl PlatformId {
    /// All known platforms in detection order.
    pub const ALL: [PlatformId; 2] = [PlatformId::Flipkart, PlatformId::Amazon];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Flipkart => "flipkart",
            PlatformId::Amazon => "amazon",
        }
    }

    /// URL substrings that identify this platform.
    pub fn markers(&self) -> &'static [&'static str] {
        PLATFORM_MARKERS
            .iter()
            .find(|(id, _)| id == self)
            .map(|(_, markers)| *markers)
            .unwrap_or(&[])
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for PlatformId {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flipkart" => Ok(PlatformId::Flipkart),
            "amazon" => Ok(PlatformId::Amazon),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Maps a product URL to the platform that serves it.
///
/// Matching is case-insensitive over the whole URL string. Returns `None` when
/// no marker matches; that is a normal outcome, not an error.
pub fn detect_platform(url: &str) -> Option<PlatformId> {
    let lowered = url.to_lowercase();
    PLATFORM_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| lowered.contains(m)))
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_flipkart() {
        assert_eq!(
            detect_platform("https://www.flipkart.com/p/item"),
            Some(PlatformId::Flipkart)
        );
        assert_eq!(
            detect_platform("https://dl.flipkart.com/s/abc"),
            Some(PlatformId::Flipkart)
        );
    }

    #[test]
    fn detects_amazon_across_locales_and_short_links() {
        assert_eq!(
            detect_platform("https://www.amazon.in/dp/B0CHX1W1XY"),
            Some(PlatformId::Amazon)
        );
        assert_eq!(
            detect_platform("https://WWW.AMAZON.COM/dp/B0CHX1W1XY"),
            Some(PlatformId::Amazon)
        );
        assert_eq!(
            detect_platform("https://amzn.in/d/abc123"),
            Some(PlatformId::Amazon)
        );
    }

    #[test]
    fn unknown_host_yields_none() {
        assert_eq!(detect_platform("https://example.org"), None);
        assert_eq!(detect_platform("https://www.myntra.com/shoes"), None);
    }

    #[test]
    fn first_marker_in_table_order_wins() {
        // Both markers present; flipkart is listed first.
        assert_eq!(
            detect_platform("https://www.flipkart.com/search?q=amazon+echo"),
            Some(PlatformId::Flipkart)
        );
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!("Amazon".parse::<PlatformId>(), Ok(PlatformId::Amazon));
        assert_eq!(" flipkart ".parse::<PlatformId>(), Ok(PlatformId::Flipkart));
        assert!("ebay".parse::<PlatformId>().is_err());
        assert_eq!(PlatformId::Flipkart.to_string(), "flipkart");
        assert!(PlatformId::Amazon.markers().contains(&"amazon"));
    }
}
