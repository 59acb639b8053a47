//! Field-fallback table mapping heterogeneous raw rows onto
//! [`CanonicalRecord`].
//!
//! Three row schemas are in circulation:
//!
//! - the public data portal API (`설치장소명`, `소재지도로명주소`,
//!   `설치장소특성`, `수거쓰레기종류`, `위도`, `경도`),
//! - the bundled sample file (same names, `휴지통종류` for the waste type),
//! - the detailed district export (`자치구명`, `세부 위치`, `도로명`,
//!   `설치위치(도로명 주소)`, `설치 장소 유형`, `수거 쓰레기 종류`).
//!
//! Each canonical attribute has an ordered list of candidate keys; the first
//! candidate holding a non-empty value wins.

use serde::{Deserialize, Serialize};
use trash_bin_map_record_models::{CanonicalRecord, Coordinate, RawRecord};

/// Fallback name for records without one.
pub const DEFAULT_NAME: &str = "이름 없음";
/// Fallback address for records without one.
pub const DEFAULT_ADDRESS: &str = "주소 정보 없음";
/// Fallback installation site type.
pub const DEFAULT_CATEGORY: &str = "기타";
/// Fallback waste type.
pub const DEFAULT_COLLECTION_TYPE: &str = "일반";

/// Ordered candidate keys per canonical attribute.
///
/// Deserializable from a source TOML `[fields]` table; any attribute left
/// out keeps its default candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Detailed location first, then place name.
    pub name: Vec<String>,
    /// Road address keys.
    pub address: Vec<String>,
    /// Parts joined with a space when no road address is present
    /// (district + road name).
    pub address_composite: Vec<String>,
    /// Installation site type keys.
    pub category: Vec<String>,
    /// Waste type keys.
    pub collection_type: Vec<String>,
    /// Administrative district keys.
    pub district: Vec<String>,
    /// Latitude keys. The first one is written back by geocoding backfill.
    pub latitude: Vec<String>,
    /// Longitude keys. The first one is written back by geocoding backfill.
    pub longitude: Vec<String>,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            name: keys(&["세부 위치", "세부위치", "설치장소명"]),
            address: keys(&["소재지도로명주소", "설치위치(도로명 주소)", "도로명주소"]),
            address_composite: keys(&["자치구명", "도로명"]),
            category: keys(&["설치장소특성", "설치 장소 유형", "설치장소유형"]),
            collection_type: keys(&["수거쓰레기종류", "수거 쓰레기 종류", "휴지통종류"]),
            district: keys(&["자치구명", "자치구"]),
            latitude: keys(&["위도", "latitude", "lat"]),
            longitude: keys(&["경도", "longitude", "lng", "lon"]),
        }
    }
}

impl FieldMapping {
    /// Normalizes a raw row. Never fails: every attribute has a default.
    #[must_use]
    pub fn normalize(&self, raw: &RawRecord) -> CanonicalRecord {
        CanonicalRecord {
            name: first_text(raw, &self.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            address: self
                .resolve_address(raw)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            category: first_text(raw, &self.category)
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            collection_type: first_text(raw, &self.collection_type)
                .unwrap_or_else(|| DEFAULT_COLLECTION_TYPE.to_string()),
            district: self.resolve_district(raw),
            latitude: first_coordinate(raw, &self.latitude, 90.0),
            longitude: first_coordinate(raw, &self.longitude, 180.0),
        }
    }

    /// The record's address, or `None` when neither a road address nor any
    /// composite part is present.
    #[must_use]
    pub fn resolve_address(&self, raw: &RawRecord) -> Option<String> {
        first_text(raw, &self.address).or_else(|| {
            let parts: Vec<String> = self
                .address_composite
                .iter()
                .filter_map(|key| text_value(raw.get(key)?))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        })
    }

    /// The record's district, if any.
    #[must_use]
    pub fn resolve_district(&self, raw: &RawRecord) -> Option<String> {
        first_text(raw, &self.district)
    }

    /// Writes a coordinate into the primary latitude/longitude keys.
    pub fn write_coordinate(&self, raw: &mut RawRecord, coordinate: Coordinate) {
        if let Some(key) = self.latitude.first() {
            raw.insert(key.clone(), serde_json::Value::from(coordinate.latitude));
        }
        if let Some(key) = self.longitude.first() {
            raw.insert(key.clone(), serde_json::Value::from(coordinate.longitude));
        }
    }
}

/// Returns the first candidate with a non-empty text value.
fn first_text(raw: &RawRecord, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| raw.get(key).and_then(text_value))
}

/// Strings are trimmed; numbers are stringified (some exports store house
/// numbers or codes as numbers). Everything else is absent.
fn text_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns the first candidate holding a usable coordinate value within
/// `±limit` degrees.
fn first_coordinate(raw: &RawRecord, candidates: &[String], limit: f64) -> Option<f64> {
    candidates
        .iter()
        .find_map(|key| raw.get(key).and_then(|v| coordinate_value(v, limit)))
}

/// Accepts JSON numbers and numeric strings. `null`, empty strings,
/// non-numeric text, non-finite values, and out-of-range values are absent.
/// Zero is a real coordinate.
fn coordinate_value(value: &serde_json::Value, limit: f64) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (parsed.is_finite() && parsed.abs() <= limit).then_some(parsed)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn normalizes_api_schema() {
        let record = FieldMapping::default().normalize(&raw(json!({
            "설치장소명": "시청역 1번 출구",
            "소재지도로명주소": "서울특별시 중구 세종대로 110",
            "설치장소특성": "지하철역",
            "수거쓰레기종류": "재활용",
            "위도": 37.5665,
            "경도": 126.978
        })));
        assert_eq!(record.name, "시청역 1번 출구");
        assert_eq!(record.address, "서울특별시 중구 세종대로 110");
        assert_eq!(record.category, "지하철역");
        assert_eq!(record.collection_type, "재활용");
        assert_eq!(record.coordinate(), Some(Coordinate::new(37.5665, 126.978)));
    }

    #[test]
    fn sample_schema_uses_bin_type_fallback() {
        let record = FieldMapping::default().normalize(&raw(json!({
            "설치장소명": "올림픽공원",
            "휴지통종류": "일반+재활용",
            "위도": "37.5176",
            "경도": "127.1229"
        })));
        assert_eq!(record.collection_type, "일반+재활용");
        assert_eq!(record.coordinate(), Some(Coordinate::new(37.5176, 127.1229)));
    }

    #[test]
    fn detailed_schema_prefers_detailed_location_for_name() {
        let record = FieldMapping::default().normalize(&raw(json!({
            "자치구명": "송파구",
            "도로명": "올림픽로",
            "세부 위치": "잠실역 8번 출구 앞",
            "설치위치(도로명 주소)": "올림픽로 265",
            "설치 장소 유형": "버스정류장",
            "수거 쓰레기 종류": "일반쓰레기"
        })));
        assert_eq!(record.name, "잠실역 8번 출구 앞");
        assert_eq!(record.address, "올림픽로 265");
        assert_eq!(record.category, "버스정류장");
        assert_eq!(record.collection_type, "일반쓰레기");
        assert_eq!(record.district.as_deref(), Some("송파구"));
        assert!(!record.is_locatable());
    }

    #[test]
    fn detailed_schema_builds_composite_address() {
        let record = FieldMapping::default().normalize(&raw(json!({
            "자치구명": "종로구",
            "도로명": "세종대로",
            "설치위치(도로명 주소)": "  "
        })));
        assert_eq!(record.address, "종로구 세종대로");
    }

    #[test]
    fn empty_record_gets_every_default() {
        let record = FieldMapping::default().normalize(&RawRecord::new());
        assert_eq!(record.name, DEFAULT_NAME);
        assert_eq!(record.address, DEFAULT_ADDRESS);
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert_eq!(record.collection_type, DEFAULT_COLLECTION_TYPE);
        assert!(record.district.is_none());
        assert!(!record.is_locatable());
    }

    #[test]
    fn unusable_coordinates_are_absent() {
        let mapping = FieldMapping::default();
        for (lat, lng) in [
            (json!(null), json!(127.0)),
            (json!(""), json!(127.0)),
            (json!("abc"), json!(127.0)),
            (json!(37.5), json!(200.0)),
            (json!(true), json!(127.0)),
        ] {
            let record = mapping.normalize(&raw(json!({ "위도": lat, "경도": lng })));
            assert!(!record.is_locatable(), "{lat} / {lng}");
        }
    }

    #[test]
    fn zero_is_a_real_coordinate() {
        let record = FieldMapping::default().normalize(&raw(json!({ "위도": 0, "경도": 0.0 })));
        assert_eq!(record.coordinate(), Some(Coordinate::new(0.0, 0.0)));
    }

    #[test]
    fn empty_string_candidate_falls_through_to_next() {
        let record = FieldMapping::default().normalize(&raw(json!({
            "세부 위치": "",
            "설치장소명": "광화문광장"
        })));
        assert_eq!(record.name, "광화문광장");
    }

    #[test]
    fn write_coordinate_uses_primary_keys() {
        let mapping = FieldMapping::default();
        let mut row = RawRecord::new();
        mapping.write_coordinate(&mut row, Coordinate::new(37.5, 127.0));
        assert_eq!(row.get("위도"), Some(&json!(37.5)));
        assert_eq!(row.get("경도"), Some(&json!(127.0)));
        assert!(mapping.normalize(&row).is_locatable());
    }

    #[test]
    fn partial_toml_override_keeps_other_defaults() {
        let mapping: FieldMapping = toml::de::from_str(r#"name = ["place"]"#).unwrap();
        assert_eq!(mapping.name, ["place"]);
        assert_eq!(mapping.latitude, FieldMapping::default().latitude);
    }
}
