//! User-action handlers.
//!
//! Each handler picks a selection mode, runs it against the loaded store,
//! and hands the result to [`ViewSync`]:
//!
//! - page load and location fix select by radius around the origin,
//! - panning or zooming selects by the visible bounds,
//! - the search box selects by text, falling back to bounds when blank.

use std::sync::Arc;

use trash_bin_map_record_models::{Coordinate, CoordinateKey};
use trash_bin_map_source::store::RecordStore;
use trash_bin_map_source::{DatasetLoader, load_store};
use trash_bin_map_spatial::{search, within_bounds, within_radius};

use crate::sync::ViewSync;
use crate::{
    DEFAULT_CENTER, DEFAULT_ZOOM, LOAD_FAILED_MESSAGE, LOADING_MESSAGE, LOCATE_ZOOM,
    ListDisplay, LocationProvider, MapView, NEARBY_RADIUS_M, ViewError,
};

/// Drives a map and list from one dataset source.
///
/// Handlers take `&mut self`, so a caller can only start a new load after
/// the previous one has been awaited or dropped. Dropping an in-flight
/// future leaves the current store untouched.
pub struct MapController<M, L> {
    loader: Arc<dyn DatasetLoader>,
    location: Arc<dyn LocationProvider>,
    store: RecordStore,
    view: ViewSync<M, L>,
    origin: Option<Coordinate>,
}

impl<M: MapView, L: ListDisplay> MapController<M, L> {
    /// Centers `map` on the default view. No data is loaded yet.
    pub fn new(
        loader: Arc<dyn DatasetLoader>,
        location: Arc<dyn LocationProvider>,
        mut map: M,
        list: L,
    ) -> Self {
        map.set_view(DEFAULT_CENTER, DEFAULT_ZOOM);
        Self {
            loader,
            location,
            store: RecordStore::default(),
            view: ViewSync::new(map, list),
            origin: None,
        }
    }

    /// Reloads the dataset and shows the records near `origin`, or every
    /// record when `origin` is `None`. Returns the number of records shown.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Source`] if the load fails. The previously
    /// loaded store is kept and the list shows the failure.
    pub async fn load(&mut self, origin: Option<Coordinate>) -> Result<usize, ViewError> {
        self.view.show_message(LOADING_MESSAGE);

        match load_store(self.loader.as_ref()).await {
            Ok(store) => {
                self.store = store;
                self.origin = origin;
                let selected = within_radius(self.store.records(), origin, NEARBY_RADIUS_M);
                self.view.render(&selected);
                Ok(selected.len())
            }
            Err(e) => {
                log::error!("[{}] Load failed: {e}", self.loader.label());
                self.view.show_message(&format!("{LOAD_FAILED_MESSAGE} {e}"));
                Err(e.into())
            }
        }
    }

    /// Asks for the device location, centers the map on it, and reloads
    /// the records around it.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Geolocation`] after alerting the user if the
    /// location is unavailable. Nothing is reloaded in that case. Load
    /// failures are reported as in [`Self::load`].
    pub async fn locate(&mut self) -> Result<usize, ViewError> {
        let at = match self.location.current_location().await {
            Ok(at) => at,
            Err(e) => {
                log::warn!("Location unavailable: {e:?}");
                self.view.list_mut().show_alert(&e.to_string());
                return Err(e.into());
            }
        };

        let map = self.view.map_mut();
        map.set_view(at, LOCATE_ZOOM);
        map.show_user_location(at);

        self.load(Some(at)).await
    }

    /// Shows the records inside the map's visible bounds.
    pub fn map_moved(&mut self) -> usize {
        let bounds = self.view.map().visible_bounds();
        let selected = within_bounds(self.store.records(), &bounds);
        self.view.render(&selected);
        selected.len()
    }

    /// Shows the records matching `query`, or the visible bounds when the
    /// query is blank.
    pub fn search(&mut self, query: &str) -> usize {
        let bounds = self.view.map().visible_bounds();
        let selected = search(self.store.records(), query, &bounds);
        self.view.render(&selected);
        selected.len()
    }

    /// Focuses the marker behind a list entry. See [`ViewSync::select`].
    pub async fn select(&mut self, key: &CoordinateKey) -> bool {
        self.view.select(key).await
    }

    /// The last successfully loaded store.
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Origin of the last successful load.
    pub const fn origin(&self) -> Option<Coordinate> {
        self.origin
    }

    /// The map and list bookkeeping.
    pub const fn view(&self) -> &ViewSync<M, L> {
        &self.view
    }
}
