//! Entry trait and the reference place record.

use std::cmp::Ordering;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_key;

/// A record that can live in the index.
///
/// Implementations supply their own wire shape through the serde bounds —
/// bucket artifacts store entries exactly as the type serializes itself.
///
/// Two invariants are required and not checked:
///
/// - [`key`](Self::key) must return a key produced by
///   [`normalize_key`](crate::normalize_key), computed from the same input
///   every time;
/// - the [`Ord`] implementation must order by that key first, with a stable
///   tie-break (such as a numeric id) so that equal keys from distinct
///   records do not collapse.
pub trait IndexEntry: Clone + Ord + Serialize + DeserializeOwned {
    /// The normalized key this entry is indexed under.
    fn key(&self) -> &str;
}

/// Geographic coordinate carried by a [`Place`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Longitude in degrees.
    pub lon: f32,
    /// Latitude in degrees.
    pub lat: f32,
}

/// A named place, the reference entry type.
///
/// Matches the city-record JSON schema: `_id`, `name`, `country` and a
/// nested `coord` object. The index key is derived from the
/// `"name, country"` label and memoized on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Stable record identity, used as the ordering tie-break.
    #[serde(rename = "_id")]
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Country code or name, part of the display label.
    pub country: String,

    /// Coordinate, not part of identity or ordering.
    #[serde(default)]
    pub coord: Coord,

    #[serde(skip)]
    key: OnceLock<String>,
}

impl Place {
    /// Create a place with a zero coordinate.
    pub fn new(id: i64, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            country: country.into(),
            coord: Coord::default(),
            key: OnceLock::new(),
        }
    }

    /// Create a place with an explicit coordinate.
    pub fn with_coord(
        id: i64,
        name: impl Into<String>,
        country: impl Into<String>,
        coord: Coord,
    ) -> Self {
        Self {
            coord,
            ..Self::new(id, name, country)
        }
    }

    /// The display label the index key is derived from.
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

impl IndexEntry for Place {
    fn key(&self) -> &str {
        self.key.get_or_init(|| normalize_key(&self.label()))
    }
}

impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.id == other.id
    }
}

impl Eq for Place {}

impl PartialOrd for Place {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Place {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(other.key())
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derives_from_label() {
        let place = Place::new(1, "Den Haag", "NL");
        assert_eq!(place.label(), "Den Haag, NL");
        assert_eq!(place.key(), "den_haag_nl");
    }

    #[test]
    fn test_orders_by_key_then_id() {
        let amstelveen = Place::new(7, "Amstelveen", "NL");
        let amsterdam = Place::new(3, "Amsterdam", "NL");
        assert!(amstelveen < amsterdam);

        let first = Place::new(1, "Amsterdam", "NL");
        let second = Place::new(2, "Amsterdam", "NL");
        assert!(first < second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_equality_ignores_coordinates() {
        let a = Place::with_coord(5, "Utrecht", "NL", Coord { lon: 5.12, lat: 52.09 });
        let b = Place::new(5, "Utrecht", "NL");
        assert_eq!(a, b);
    }

    #[test]
    fn test_wire_shape_matches_city_schema() {
        let json = r#"{"country":"UA","name":"Hurzuf","_id":707860,"coord":{"lon":34.283333,"lat":44.549999}}"#;
        let place: Place = serde_json::from_str(json).expect("record should parse");
        assert_eq!(place.id, 707_860);
        assert_eq!(place.name, "Hurzuf");
        assert_eq!(place.country, "UA");
        assert!((f64::from(place.coord.lon) - 34.283_333).abs() < 1e-4);

        let value = serde_json::to_value(&place).expect("record should serialize");
        assert_eq!(value["_id"], 707_860);
        assert!(value["coord"].get("lat").is_some());
        assert!(value.get("key").is_none());
    }

    #[test]
    fn test_missing_coord_defaults_to_zero() {
        let place: Place =
            serde_json::from_str(r#"{"_id":1,"name":"Ede","country":"NL"}"#).expect("should parse");
        assert_eq!(place.coord, Coord::default());
    }
}
