#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading, querying, and geocoding backfill for trash bin datasets.
//!
//! The binary in this crate is the operator's entry point: list the
//! configured sources, load one and query it by radius, bounds, or text,
//! or run the offline geocoding pass that fills in missing coordinates in
//! a dataset file.

pub mod backfill;
pub mod checkpoint;
pub mod interactive;

use std::path::Path;
use std::sync::Arc;

use trash_bin_map_geocoder::GeocodeError;
use trash_bin_map_geocoder::nominatim::NominatimGeocoder;
use trash_bin_map_geocoder::service_registry;
use trash_bin_map_source::fields::FieldMapping;
use trash_bin_map_source::progress::ProgressCallback;
use trash_bin_map_source::source_def::{SourceDefinition, SourceLoader, load_static_file};
use trash_bin_map_source::store::RecordStore;
use trash_bin_map_source::{SourceError, load_store};

use crate::backfill::{BackfillOptions, BackfillSummary, backfill};
use crate::checkpoint::FileCheckpoint;

/// Setup failures that prevent a backfill pass from starting.
#[derive(Debug, thiserror::Error)]
pub enum BackfillError {
    /// The dataset file could not be read or parsed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The geocoding client could not be built.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// No enabled geocoding service is configured.
    #[error("No enabled geocoding service configured")]
    NoGeocoder,

    /// `checkpoint_every` was zero.
    #[error("Checkpoint interval must be at least 1")]
    InvalidCheckpointInterval,
}

/// Returns all configured data sources from the TOML registry.
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    trash_bin_map_source::registry::all_sources()
}

/// Returns the sources selected by `--sources` or `TRASH_BIN_MAP_SOURCES`,
/// or every enabled source when neither is set.
#[must_use]
pub fn enabled_sources(cli_filter: Option<String>) -> Vec<SourceDefinition> {
    trash_bin_map_source::registry::enabled_sources(cli_filter)
}

/// Looks up a source by id, enabled or not.
#[must_use]
pub fn find_source(id: &str) -> Option<SourceDefinition> {
    all_sources().into_iter().find(|s| s.id() == id)
}

/// Loads and normalizes one source.
///
/// # Errors
///
/// Returns [`SourceError`] if the source cannot be fetched or parsed.
pub async fn load_source(
    source: &SourceDefinition,
    progress: Arc<dyn ProgressCallback>,
) -> Result<RecordStore, SourceError> {
    let loader = SourceLoader::new(source.clone())?.with_progress(progress);
    load_store(&loader).await
}

/// Geocodes the records of a dataset file that lack coordinates and writes
/// the result back to the same file.
///
/// # Errors
///
/// Returns [`BackfillError`] if the file cannot be loaded, no geocoding
/// service is configured, or `checkpoint_every` is zero.
pub async fn geocode_file(
    path: &Path,
    limit: Option<u64>,
    checkpoint_every: u64,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<BackfillSummary, BackfillError> {
    let service = service_registry::nominatim().ok_or(BackfillError::NoGeocoder)?;
    let geocoder = NominatimGeocoder::new(&service)?;

    let dataset = load_static_file(path).await?;
    let mut store = RecordStore::new(dataset, FieldMapping::default());
    log::info!(
        "{}: {} record(s), {} already located",
        path.display(),
        store.len(),
        store.locatable_count()
    );

    let options = BackfillOptions {
        limit,
        checkpoint_every,
        ..BackfillOptions::for_service(&service)
    };
    let sink = FileCheckpoint::new(path);

    backfill(&mut store, &geocoder, &sink, &options, progress).await
}

#[cfg(test)]
mod tests {
    use trash_bin_map_record_models::Coordinate;
    use trash_bin_map_source::progress::null_progress;
    use trash_bin_map_spatial::{within_bounds, within_radius};

    use super::*;

    const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../source/data/sample.json");

    async fn sample_store() -> RecordStore {
        let dataset = load_static_file(Path::new(SAMPLE)).await.unwrap();
        RecordStore::new(dataset, FieldMapping::default())
    }

    #[tokio::test]
    async fn sample_has_one_bin_within_a_kilometre_of_olympic_park() {
        let store = sample_store().await;
        assert_eq!(store.len(), 6);
        assert_eq!(store.locatable_count(), 6);

        let nearby = within_radius(
            store.records(),
            Some(Coordinate::new(37.5176, 127.1229)),
            1000.0,
        );
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].name, "올림픽공원 평화의문");
    }

    #[tokio::test]
    async fn sample_without_origin_passes_everything_through() {
        let store = sample_store().await;
        assert_eq!(within_radius(store.records(), None, 1000.0).len(), 6);
    }

    #[tokio::test]
    async fn sample_bounds_around_city_hall() {
        let store = sample_store().await;
        let bounds = trash_bin_map_record_models::BoundingBox::new(
            Coordinate::new(37.56, 126.97),
            Coordinate::new(37.585, 126.985),
        );
        let names: Vec<&str> = within_bounds(store.records(), &bounds)
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["서울시청 앞", "경복궁 광화문"]);
    }

    #[test]
    fn registry_sample_points_at_bundled_file() {
        let source = find_source("seoul_sample").unwrap();
        assert!(source.enabled);
        assert!(find_source("busan").is_none());
    }

    #[tokio::test]
    async fn geocode_file_on_missing_path_fails_before_any_lookup() {
        let result = geocode_file(
            Path::new("/nonexistent/data.json"),
            None,
            50,
            &null_progress(),
        )
        .await;
        assert!(matches!(result, Err(BackfillError::Source(SourceError::Io(_)))));
    }
}
