#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map/list synchronization for the trash bin map.
//!
//! The map widget, its marker layer, the result list, and the device's
//! location service are external collaborators reached through the
//! [`MapView`], [`ListDisplay`], and [`LocationProvider`] traits. This crate
//! owns the bookkeeping between them: which marker belongs to which record
//! ([`sync::ViewSync`]) and which selection mode runs on which user action
//! ([`controller::MapController`]).

pub mod controller;
pub mod sync;

use std::time::Duration;

use async_trait::async_trait;
use trash_bin_map_record_models::{BoundingBox, Coordinate, CoordinateKey, RecordLabel};

/// Initial map center (Seoul City Hall).
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(37.5665, 126.978);
/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 13;
/// Zoom level after a location fix.
pub const LOCATE_ZOOM: u8 = 15;
/// Zoom level when a list entry is selected.
pub const SELECT_ZOOM: u8 = 17;
/// Delay between centering on a selected entry and opening its label, so
/// the pan animation can settle first.
pub const LABEL_DELAY: Duration = Duration::from_millis(300);
/// Radius around the user's location, in meters.
pub const NEARBY_RADIUS_M: f64 = 1000.0;

/// Shown while a load is in flight.
pub const LOADING_MESSAGE: &str = "데이터 불러오는 중...";
/// Shown when a load fails, followed by the error text.
pub const LOAD_FAILED_MESSAGE: &str = "데이터를 불러오지 못했습니다.";
/// Shown when the selection is empty.
pub const NO_NEARBY_MESSAGE: &str = "근처에 휴지통이 없습니다.";

/// Why the device location is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    /// The user refused the permission prompt, or the fix failed.
    #[error("위치 정보를 가져올 수 없습니다.")]
    Denied,
    /// The platform has no location service.
    #[error("위치 서비스를 지원하지 않습니다.")]
    Unsupported,
}

/// One row of the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// What to show.
    pub label: RecordLabel,
    /// Marker to focus when the entry is selected. `None` for records
    /// without coordinates, whose entries are not interactive.
    pub key: Option<CoordinateKey>,
}

impl ListEntry {
    /// Whether selecting this entry does anything.
    #[must_use]
    pub const fn is_locatable(&self) -> bool {
        self.key.is_some()
    }
}

/// The map widget and its marker layer.
pub trait MapView {
    /// Centers the map on `center` at `zoom`.
    fn set_view(&mut self, center: Coordinate, zoom: u8);

    /// The currently visible rectangle.
    fn visible_bounds(&self) -> BoundingBox;

    /// Adjusts center and zoom so every point is visible.
    fn fit_to(&mut self, points: &[Coordinate]);

    /// Places a marker with a popup label.
    fn add_point_marker(&mut self, key: &CoordinateKey, at: Coordinate, label: &RecordLabel);

    /// Removes every marker placed with [`Self::add_point_marker`].
    fn remove_all_markers(&mut self);

    /// Opens the popup label of a placed marker.
    fn open_marker_label(&mut self, key: &CoordinateKey);

    /// Shows the "you are here" marker.
    fn show_user_location(&mut self, at: Coordinate);
}

/// The result list next to the map.
pub trait ListDisplay {
    /// Removes every entry and message.
    fn clear(&mut self);

    /// Appends an entry.
    fn push_entry(&mut self, entry: &ListEntry);

    /// Replaces the list content with a single informational line.
    fn show_message(&mut self, message: &str);

    /// Shows a blocking notice (e.g., a browser alert).
    fn show_alert(&mut self, message: &str);
}

/// The device's location service.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Asks for the current position.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError`] if permission is refused or the platform
    /// has no location service.
    async fn current_location(&self) -> Result<Coordinate, GeolocationError>;
}

/// Errors surfaced by [`controller::MapController`].
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// The dataset could not be loaded.
    #[error(transparent)]
    Source(#[from] trash_bin_map_source::SourceError),

    /// The device location is unavailable.
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}
