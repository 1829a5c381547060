//! Provider adapters for the Wayfinder engine.
//!
//! Responsibilities:
//! - Translate canonical queries into provider-specific HTTP requests.
//! - Convert provider payloads into [`wayfinder_core::Coordinate`] and
//!   [`wayfinder_core::RouteResult`], normalising units.
//! - Classify every failure with a [`wayfinder_core::ErrorKind`].
//!
//! Boundaries:
//! - No retry, caching or fallback; those live in `wayfinder-resolver`.
//! - One outbound request per call.
//!
//! # Example
//!
//! ```no_run
//! use wayfinder_core::{GeocodingProvider, LocationQuery};
//! use wayfinder_providers::{HttpProviderConfig, NominatimProvider};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpProviderConfig::new("https://nominatim.openstreetmap.org")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let nominatim = NominatimProvider::with_config(&config)?;
//! let coord = nominatim
//!     .geocode(&LocationQuery::new("Mumbai").with_hint("India"))
//!     .await?;
//! println!("{}, {}", coord.lat, coord.lon);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod estimate;
mod graphhopper;
mod http;
mod nominatim;
mod osrm;

pub use estimate::{
    DEFAULT_AVERAGE_SPEED_KMPH, DEFAULT_DETOUR_FACTOR, GREAT_CIRCLE, GreatCircleEstimator,
};
pub use graphhopper::{GRAPHHOPPER, GRAPHHOPPER_BASE_URL, GraphHopperProvider};
pub use http::{DEFAULT_USER_AGENT, HttpProviderConfig, ProviderBuildError};
pub use nominatim::{NOMINATIM, NOMINATIM_BASE_URL, NominatimProvider};
pub use osrm::{OSRM, OSRM_BASE_URL, OsrmProvider};
