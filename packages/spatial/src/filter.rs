//! Radius, viewport, and free-text selection modes.

use trash_bin_map_record_models::{BoundingBox, CanonicalRecord, Coordinate, FilterMode};

use crate::distance::distance_m;

/// A selection request against the record set.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialQuery {
    /// Records strictly closer than `radius_m` to `origin`. With no origin
    /// every record passes.
    Radius {
        /// Center of the search circle.
        origin: Option<Coordinate>,
        /// Radius in meters.
        radius_m: f64,
    },
    /// Locatable records inside the viewport.
    Bounds(BoundingBox),
    /// Locatable records matching `query`. A blank query falls back to
    /// [`SpatialQuery::Bounds`] over `viewport`.
    Text {
        /// Free-text query.
        query: String,
        /// Current viewport, used when the query is blank.
        viewport: BoundingBox,
    },
}

impl SpatialQuery {
    /// The mode that will actually run, accounting for the blank-query
    /// fallback.
    #[must_use]
    pub fn effective_mode(&self) -> FilterMode {
        match self {
            Self::Radius { .. } => FilterMode::Radius,
            Self::Bounds(_) => FilterMode::Bounds,
            Self::Text { query, .. } if query.trim().is_empty() => FilterMode::Bounds,
            Self::Text { .. } => FilterMode::Text,
        }
    }

    /// Runs the query, preserving input order.
    #[must_use]
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a CanonicalRecord>
    where
        I: IntoIterator<Item = &'a CanonicalRecord>,
    {
        let selected = match self {
            Self::Radius { origin, radius_m } => within_radius(records, *origin, *radius_m),
            Self::Bounds(bounds) => within_bounds(records, bounds),
            Self::Text { query, viewport } => search(records, query, viewport),
        };
        log::debug!(
            "{} selection kept {} record(s)",
            self.effective_mode(),
            selected.len()
        );
        selected
    }
}

/// Selects records whose distance to `origin` is strictly less than
/// `radius_m`.
///
/// Non-locatable records have no distance and are dropped. When `origin` is
/// `None` every record is returned unchanged, locatable or not.
#[must_use]
pub fn within_radius<'a, I>(
    records: I,
    origin: Option<Coordinate>,
    radius_m: f64,
) -> Vec<&'a CanonicalRecord>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let Some(origin) = origin else {
        return records.into_iter().collect();
    };

    records
        .into_iter()
        .filter(|r| {
            r.coordinate()
                .is_some_and(|c| distance_m(origin, c) < radius_m)
        })
        .collect()
}

/// Selects locatable records inside `bounds` (all edges inclusive).
#[must_use]
pub fn within_bounds<'a, I>(records: I, bounds: &BoundingBox) -> Vec<&'a CanonicalRecord>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    records
        .into_iter()
        .filter(|r| r.coordinate().is_some_and(|c| bounds.contains(c)))
        .collect()
}

/// Selects locatable records whose name, address, category, collection
/// type, or district contains `query`, ignoring case.
///
/// A blank or whitespace-only query means "no query" and selects by
/// `viewport` instead.
#[must_use]
pub fn search<'a, I>(records: I, query: &str, viewport: &BoundingBox) -> Vec<&'a CanonicalRecord>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return within_bounds(records, viewport);
    }

    records
        .into_iter()
        .filter(|r| r.is_locatable() && matches_text(r, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn matches_text(record: &CanonicalRecord, needle: &str) -> bool {
    [
        Some(record.name.as_str()),
        Some(record.address.as_str()),
        Some(record.category.as_str()),
        Some(record.collection_type.as_str()),
        record.district.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(name: &str, category: &str, coordinate: Option<(f64, f64)>) -> CanonicalRecord {
        CanonicalRecord {
            name: name.to_string(),
            address: format!("서울 {name}로 1"),
            category: category.to_string(),
            collection_type: "일반".to_string(),
            district: None,
            latitude: coordinate.map(|c| c.0),
            longitude: coordinate.map(|c| c.1),
        }
    }

    fn seoul_viewport() -> BoundingBox {
        BoundingBox::new(Coordinate::new(37.4, 126.8), Coordinate::new(37.7, 127.2))
    }

    #[test]
    fn radius_includes_origin_and_excludes_far_records() {
        let records = vec![
            bin("시청", "공원", Some((37.5665, 126.978))),
            bin("중랑", "공원", Some((37.6, 127.1))),
        ];
        let origin = Coordinate::new(37.5665, 126.978);
        let selected = within_radius(&records, Some(origin), 1000.0);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "시청");
    }

    #[test]
    fn radius_is_strictly_less_than() {
        let records = vec![bin("시청", "공원", Some((37.5665, 126.978)))];
        let origin = Coordinate::new(37.5665, 126.978);
        assert!(within_radius(&records, Some(origin), 0.0).is_empty());
    }

    #[test]
    fn radius_without_origin_passes_everything_through() {
        let records = vec![
            bin("a", "공원", Some((37.5, 127.0))),
            bin("b", "공원", None),
        ];
        let selected = within_radius(&records, None, 1000.0);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn radius_drops_unlocatable_records() {
        let records = vec![bin("b", "공원", None)];
        let origin = Coordinate::new(37.5, 127.0);
        assert!(within_radius(&records, Some(origin), 1e9).is_empty());
    }

    #[test]
    fn bounds_edge_is_inclusive() {
        let viewport = seoul_viewport();
        let records = vec![
            bin("edge", "공원", Some((viewport.south, 127.0))),
            bin("outside", "공원", Some((viewport.south - 0.0001, 127.0))),
            bin("nowhere", "공원", None),
        ];
        let selected = within_bounds(&records, &viewport);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "edge");
    }

    #[test]
    fn text_matches_category_case_insensitively() {
        let records = vec![
            bin("a", "재활용 분리수거", Some((37.5, 127.0))),
            bin("b", "일반", Some((37.51, 127.01))),
            bin("c", "재활용", None),
            bin("Station Exit", "지하철역", Some((37.52, 127.02))),
        ];
        let viewport = seoul_viewport();

        let selected = search(&records, "재활용", &viewport);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");

        let selected = search(&records, "  sTATION ", &viewport);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Station Exit");
    }

    #[test]
    fn text_matches_district() {
        let mut record = bin("a", "공원", Some((37.5, 127.0)));
        record.district = Some("송파구".to_string());
        let records = vec![record, bin("b", "공원", Some((37.5, 127.0)))];
        let selected = search(&records, "송파", &seoul_viewport());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");
    }

    #[test]
    fn blank_text_falls_back_to_bounds() {
        let records = vec![
            bin("in", "공원", Some((37.5, 127.0))),
            bin("out", "공원", Some((35.1, 129.0))),
        ];
        let viewport = seoul_viewport();
        for query in ["", "   ", "\t"] {
            let selected = search(&records, query, &viewport);
            assert_eq!(selected.len(), 1, "query {query:?}");
            assert_eq!(selected[0].name, "in");
        }
    }

    #[test]
    fn selection_preserves_source_order() {
        let records = vec![
            bin("c", "공원", Some((37.5, 127.0))),
            bin("a", "공원", Some((37.5, 127.0))),
            bin("b", "공원", Some((37.5, 127.0))),
        ];
        let names: Vec<&str> = within_bounds(&records, &seoul_viewport())
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn query_reports_effective_mode() {
        let viewport = seoul_viewport();
        let blank = SpatialQuery::Text {
            query: " ".to_string(),
            viewport,
        };
        assert_eq!(blank.effective_mode(), FilterMode::Bounds);

        let radius = SpatialQuery::Radius {
            origin: None,
            radius_m: 1000.0,
        };
        let records = vec![bin("a", "공원", None)];
        assert_eq!(radius.apply(&records).len(), 1);
        assert_eq!(radius.effective_mode(), FilterMode::Radius);
    }
}
