//! Marker/list reconciliation.

use std::collections::BTreeMap;

use trash_bin_map_record_models::{CanonicalRecord, Coordinate, CoordinateKey};

use crate::{LABEL_DELAY, ListDisplay, ListEntry, MapView, NO_NEARBY_MESSAGE, SELECT_ZOOM};

/// Owns the external map and list and the index from [`CoordinateKey`] to
/// placed marker.
///
/// Every render starts from a blank slate: all markers and list entries are
/// removed before the new selection is drawn. Records sharing a coordinate
/// share a key, and the later one wins the index.
pub struct ViewSync<M, L> {
    map: M,
    list: L,
    markers: BTreeMap<CoordinateKey, Coordinate>,
}

impl<M: MapView, L: ListDisplay> ViewSync<M, L> {
    /// Wraps the external collaborators. Nothing is drawn yet.
    pub const fn new(map: M, list: L) -> Self {
        Self {
            map,
            list,
            markers: BTreeMap::new(),
        }
    }

    /// Replaces whatever is on screen with `records`.
    pub fn render(&mut self, records: &[&CanonicalRecord]) {
        self.clear();

        if records.is_empty() {
            self.list.show_message(NO_NEARBY_MESSAGE);
            return;
        }

        for record in records {
            let label = record.label();
            let key = record.coordinate().map(|at| {
                let key = at.key();
                self.map.add_point_marker(&key, at, &label);
                self.markers.insert(key.clone(), at);
                key
            });
            self.list.push_entry(&ListEntry { label, key });
        }

        log::debug!(
            "Rendered {} entries, {} markers",
            records.len(),
            self.markers.len()
        );
    }

    /// Clears the screen and shows `message` in the list.
    pub fn show_message(&mut self, message: &str) {
        self.clear();
        self.list.show_message(message);
    }

    /// Focuses the marker for `key`: centers the map at [`SELECT_ZOOM`],
    /// waits [`LABEL_DELAY`], then opens the marker's label. Returns `false`
    /// without touching the map when no marker has that key.
    pub async fn select(&mut self, key: &CoordinateKey) -> bool {
        let Some(&at) = self.markers.get(key) else {
            log::debug!("No marker for {key}");
            return false;
        };

        self.map.set_view(at, SELECT_ZOOM);
        tokio::time::sleep(LABEL_DELAY).await;
        self.map.open_marker_label(key);
        true
    }

    /// Zooms the map out (or in) to show every placed marker. Returns
    /// `false` and leaves the map alone when nothing is placed.
    pub fn fit_to_markers(&mut self) -> bool {
        if self.markers.is_empty() {
            return false;
        }
        let points: Vec<Coordinate> = self.markers.values().copied().collect();
        self.map.fit_to(&points);
        true
    }

    /// Number of distinct marker keys currently indexed.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// The map collaborator.
    pub const fn map(&self) -> &M {
        &self.map
    }

    /// The map collaborator, mutably.
    pub const fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// The list collaborator, mutably.
    pub const fn list_mut(&mut self) -> &mut L {
        &mut self.list
    }

    fn clear(&mut self) {
        self.map.remove_all_markers();
        self.markers.clear();
        self.list.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;
    use trash_bin_map_record_models::{BoundingBox, RecordLabel};

    use super::*;
    use crate::fakes::{FakeList, FakeMap, ListCall, MapCall};

    fn record(name: &str, coordinate: Option<(f64, f64)>) -> CanonicalRecord {
        CanonicalRecord {
            name: name.to_string(),
            address: "주소".to_string(),
            category: "기타".to_string(),
            collection_type: "일반".to_string(),
            district: None,
            latitude: coordinate.map(|c| c.0),
            longitude: coordinate.map(|c| c.1),
        }
    }

    fn sync() -> (ViewSync<FakeMap, FakeList>, FakeMap, FakeList) {
        let map = FakeMap::new(BoundingBox::new(
            Coordinate::new(37.0, 126.0),
            Coordinate::new(38.0, 128.0),
        ));
        let list = FakeList::default();
        (ViewSync::new(map.clone(), list.clone()), map, list)
    }

    #[test]
    fn render_places_markers_only_for_locatable_records() {
        let (mut sync, map, list) = sync();
        let a = record("a", Some((37.5, 127.0)));
        let b = record("b", None);
        sync.render(&[&a, &b]);

        let markers: Vec<MapCall> = map
            .calls()
            .into_iter()
            .filter(|c| matches!(c, MapCall::AddMarker(..)))
            .collect();
        assert_eq!(
            markers,
            [MapCall::AddMarker(
                CoordinateKey::new(37.5, 127.0),
                Coordinate::new(37.5, 127.0),
                RecordLabel {
                    name: "a".to_string(),
                    address: "주소".to_string(),
                    category: "기타".to_string(),
                    collection_type: "일반".to_string(),
                }
            )]
        );

        let entries = list.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_locatable());
        assert!(!entries[1].is_locatable());
        assert_eq!(entries[1].label.name, "b");
    }

    #[test]
    fn render_clears_previous_state_first() {
        let (mut sync, map, list) = sync();
        let a = record("a", Some((37.5, 127.0)));
        sync.render(&[&a]);
        sync.render(&[]);

        assert_eq!(map.calls().last(), Some(&MapCall::RemoveAll));
        assert_eq!(
            list.calls()[list.calls().len() - 2..],
            [
                ListCall::Clear,
                ListCall::Message(NO_NEARBY_MESSAGE.to_string())
            ]
        );
        assert_eq!(sync.marker_count(), 0);
    }

    #[test]
    fn fit_to_markers_covers_every_placed_marker() {
        let (mut sync, map, _) = sync();
        assert!(!sync.fit_to_markers());
        assert!(map.calls().is_empty());

        let a = record("a", Some((37.5, 127.0)));
        let b = record("b", None);
        let c = record("c", Some((37.6, 126.9)));
        sync.render(&[&a, &b, &c]);
        assert!(sync.fit_to_markers());

        let Some(MapCall::FitTo(points)) = map.calls().pop() else {
            panic!("expected a fit");
        };
        assert_eq!(points.len(), 2);
        assert!(points.contains(&Coordinate::new(37.5, 127.0)));
        assert!(points.contains(&Coordinate::new(37.6, 126.9)));
    }

    #[test]
    fn shared_coordinates_share_one_key() {
        let (mut sync, _, list) = sync();
        let a = record("a", Some((37.5, 127.0)));
        let b = record("b", Some((37.5, 127.0)));
        sync.render(&[&a, &b]);
        assert_eq!(sync.marker_count(), 1);
        assert_eq!(list.entries().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn select_centers_then_opens_label_after_delay() {
        let (mut sync, map, _) = sync();
        let a = record("a", Some((37.5, 127.0)));
        sync.render(&[&a]);
        let key = CoordinateKey::new(37.5, 127.0);

        let started = Instant::now();
        {
            let mut select = std::pin::pin!(sync.select(&key));
            assert!(
                tokio::time::timeout(Duration::from_millis(299), &mut select)
                    .await
                    .is_err()
            );
            let calls = map.calls();
            assert_eq!(
                calls.last(),
                Some(&MapCall::SetView(Coordinate::new(37.5, 127.0), SELECT_ZOOM))
            );
            assert!(select.await);
        }

        assert!(started.elapsed() >= LABEL_DELAY);
        assert_eq!(map.calls().last(), Some(&MapCall::OpenLabel(key)));
    }

    #[tokio::test(start_paused = true)]
    async fn select_unknown_key_does_nothing() {
        let (mut sync, map, _) = sync();
        let before = map.calls().len();
        assert!(!sync.select(&CoordinateKey::new(1.0, 2.0)).await);
        assert_eq!(map.calls().len(), before);
    }
}
