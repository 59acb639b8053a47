#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical trash bin record types.
//!
//! Every dataset schema (simple API rows, the bundled sample file, and the
//! detailed district-level export) is normalized into a [`CanonicalRecord`].
//! Coordinates are optional: records without a usable latitude/longitude
//! pair can still be listed but are never placed on the map.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A raw dataset row, exactly as it arrived from the source.
///
/// Field names vary by schema and any field may be missing.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude, `-90..=90`.
    pub latitude: f64,
    /// Longitude, `-180..=180`.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the marker key for this coordinate.
    #[must_use]
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::new(self.latitude, self.longitude)
    }
}

/// Key that associates a record with its rendered marker.
///
/// Built by concatenating the raw latitude and longitude values with an
/// underscore (no rounding). Two records at the exact same coordinate share
/// a key; the last one rendered wins.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoordinateKey(String);

impl CoordinateKey {
    /// Builds the key for a latitude/longitude pair.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(format!("{latitude}_{longitude}"))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rectangular map viewport given by its south-west and north-east
/// corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub south: f64,
    /// Western longitude boundary.
    pub west: f64,
    /// Northern latitude boundary.
    pub north: f64,
    /// Eastern longitude boundary.
    pub east: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its south-west and north-east corners.
    #[must_use]
    pub const fn new(south_west: Coordinate, north_east: Coordinate) -> Self {
        Self {
            south: south_west.latitude,
            west: south_west.longitude,
            north: north_east.latitude,
            east: north_east.longitude,
        }
    }

    /// Whether the coordinate lies inside the closed rectangle. All four
    /// edges are inclusive.
    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.latitude >= self.south
            && coordinate.latitude <= self.north
            && coordinate.longitude >= self.west
            && coordinate.longitude <= self.east
    }
}

/// A trash bin normalized to the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// Detailed location or place name.
    pub name: String,
    /// Road address, or a district + road composite.
    pub address: String,
    /// Installation site type.
    pub category: String,
    /// Kind of waste collected.
    pub collection_type: String,
    /// Administrative district, when the schema carries one.
    pub district: Option<String>,
    /// Latitude (WGS84). `None` when the source has no usable value.
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` when the source has no usable value.
    pub longitude: Option<f64>,
}

impl CanonicalRecord {
    /// Returns the coordinate if both latitude and longitude are present.
    #[must_use]
    pub const fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        }
    }

    /// A record is locatable iff both coordinates are present.
    #[must_use]
    pub const fn is_locatable(&self) -> bool {
        self.coordinate().is_some()
    }

    /// Marker key for locatable records.
    #[must_use]
    pub fn coordinate_key(&self) -> Option<CoordinateKey> {
        self.coordinate().map(|c| c.key())
    }

    /// Label payload shown on markers and list entries.
    #[must_use]
    pub fn label(&self) -> RecordLabel {
        RecordLabel {
            name: self.name.clone(),
            address: self.address.clone(),
            category: self.category.clone(),
            collection_type: self.collection_type.clone(),
        }
    }
}

/// Text attached to a marker popup or list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordLabel {
    /// Display name.
    pub name: String,
    /// Display address.
    pub address: String,
    /// Installation site type.
    pub category: String,
    /// Kind of waste collected.
    pub collection_type: String,
}

/// Which selection mode produced a visible record set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterMode {
    /// Everything within a radius of an origin.
    Radius,
    /// Everything inside the current viewport.
    Bounds,
    /// Free-text query match.
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(latitude: Option<f64>, longitude: Option<f64>) -> CanonicalRecord {
        CanonicalRecord {
            name: "잠실역 2번 출구".to_string(),
            address: "서울 송파구 올림픽로 265".to_string(),
            category: "지하철역".to_string(),
            collection_type: "일반".to_string(),
            district: Some("송파구".to_string()),
            latitude,
            longitude,
        }
    }

    #[test]
    fn coordinate_key_uses_raw_values() {
        let key = CoordinateKey::new(37.5176, 127.1229);
        assert_eq!(key.as_str(), "37.5176_127.1229");
        assert_eq!(CoordinateKey::new(37.0, 127.5).as_str(), "37_127.5");
    }

    #[test]
    fn record_needs_both_coordinates_to_be_locatable() {
        assert!(record(Some(37.5), Some(127.0)).is_locatable());
        assert!(!record(Some(37.5), None).is_locatable());
        assert!(!record(None, Some(127.0)).is_locatable());
        assert!(record(None, None).coordinate_key().is_none());
    }

    #[test]
    fn bounding_box_edges_are_inclusive() {
        let bounds = BoundingBox::new(Coordinate::new(37.5, 126.9), Coordinate::new(37.6, 127.1));
        assert!(bounds.contains(Coordinate::new(37.5, 127.0)));
        assert!(bounds.contains(Coordinate::new(37.6, 127.1)));
        assert!(bounds.contains(Coordinate::new(37.55, 126.9)));
        assert!(!bounds.contains(Coordinate::new(37.4999, 127.0)));
        assert!(!bounds.contains(Coordinate::new(37.55, 127.1001)));
    }

    #[test]
    fn label_copies_display_fields() {
        let label = record(None, None).label();
        assert_eq!(label.name, "잠실역 2번 출구");
        assert_eq!(label.collection_type, "일반");
    }

    #[test]
    fn filter_mode_round_trips_through_strings() {
        assert_eq!(FilterMode::Bounds.to_string(), "bounds");
        assert_eq!("text".parse::<FilterMode>().unwrap(), FilterMode::Text);
    }
}
