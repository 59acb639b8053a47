#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Spatial selection over an in-memory trash bin record set.
//!
//! Three independent modes pick the visible subset of records:
//!
//! 1. **Radius**: records strictly closer than `R` meters to an origin
//!    ([`within_radius`]).
//! 2. **Bounds**: locatable records inside a closed viewport rectangle
//!    ([`within_bounds`]).
//! 3. **Text**: locatable records whose text fields contain a
//!    case-insensitive query, falling back to bounds when the query is blank
//!    ([`search`]).
//!
//! Every mode is read-only and preserves the input order. The datasets are
//! small (hundreds to low thousands of rows) so selection is a linear scan.

pub mod distance;
pub mod filter;

pub use distance::{EARTH_RADIUS_M, distance_m};
pub use filter::{SpatialQuery, search, within_bounds, within_radius};
