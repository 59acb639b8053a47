#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address-to-coordinate lookup for trash bin records.
//!
//! Records from the district export carry a road address but no
//! coordinates. This crate turns such an address into a coordinate through
//! an external lookup service. The only provider is Nominatim /
//! `OpenStreetMap`, configured via TOML files in `services/` and limited to
//! **1 request per second**; rate limiting is the caller's job (see the
//! ingest crate's backfill).

pub mod address;
pub mod nominatim;
pub mod service_registry;

use async_trait::async_trait;
use thiserror::Error;
use trash_bin_map_record_models::Coordinate;

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

impl GeocodedAddress {
    /// The resolved point.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Resolves a free-form address to a coordinate.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up `query`. `Ok(None)` means the service answered but found no
    /// match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails, the service rate
    /// limits us, or the response cannot be parsed.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}
