// ABOUTME: ResultMap (ordered field → string map) and ScrapeResult returned by the Client.
// ABOUTME: ResultMap serializes as a flat JSON object in catalog order.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::extractors::catalog::Field;
use crate::platform::PlatformId;

/// Field values for one extraction, in catalog order. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMap {
    entries: Vec<(Field, String)>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any earlier value while keeping its position.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.entries.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields with a non-empty value.
    pub fn filled(&self) -> usize {
        self.entries.iter().filter(|(_, v)| !v.is_empty()).count()
    }
}

impl Serialize for ResultMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// The outcome of scraping one product page.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub url: String,
    pub platform: PlatformId,
    pub fields: ResultMap,
    pub scraped_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_flat_in_insertion_order() {
        let mut map = ResultMap::new();
        map.insert(Field::Title, "Echo Dot");
        map.insert(Field::Price, "");
        map.insert(Field::Image, "https://m.media-amazon.com/I/a.jpg");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Echo Dot","price":"","image":"https://m.media-amazon.com/I/a.jpg"}"#
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = ResultMap::new();
        map.insert(Field::Title, "a");
        map.insert(Field::Mrp, "b");
        map.insert(Field::Title, "c");
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(Field::Title, "c"), (Field::Mrp, "b")]);
        assert_eq!(map.filled(), 2);
        assert_eq!(map.get(Field::Discount), None);
    }
}
