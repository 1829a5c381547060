//! Core domain types for the Wayfinder geo-resolution engine.
//!
//! The crate defines the canonical query and result types, the provider
//! capability traits, and the error taxonomy shared by every adapter. It
//! performs no I/O: HTTP adapters live in `wayfinder-providers` and the
//! fallback machinery in `wayfinder-resolver`.
//!
//! Constructors that take values from outside the engine return `Result`
//! to surface invalid input early.

#![forbid(unsafe_code)]

pub mod error;
pub mod location;
pub mod provider;
pub mod route;

pub use error::{ErrorKind, FailureOutcome, Operation, ProviderError, ProviderFailure, ResolveError};
pub use location::{Coordinate, CoordinateError, LocationQuery, MAX_QUERY_CHARS};
pub use provider::{Capabilities, GeocodingProvider, ProviderSpec, Resolution, RoutingProvider};
pub use route::{
    ParseVehicleProfileError, RouteKey, RouteQuery, RouteResult, RouteResultError, VehicleProfile,
};
