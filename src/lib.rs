//! Facade crate for the Wayfinder geo-resolution and routing engine.
//!
//! This crate re-exports the core domain types and exposes the HTTP provider
//! adapters and the fallback engine behind feature flags.

#![forbid(unsafe_code)]

pub use wayfinder_core::{
    Capabilities, Coordinate, CoordinateError, ErrorKind, FailureOutcome, GeocodingProvider,
    LocationQuery, Operation, ProviderError, ProviderFailure, ProviderSpec, ResolveError,
    Resolution, RouteQuery, RouteResult, RoutingProvider, VehicleProfile,
};

#[cfg(feature = "providers")]
pub use wayfinder_providers::{
    GraphHopperProvider, GreatCircleEstimator, HttpProviderConfig, NominatimProvider,
    OsrmProvider, ProviderBuildError,
};

#[cfg(feature = "resolver")]
pub use wayfinder_resolver::{
    Backoff, CacheConfig, CacheStats, CallContext, CancellationToken, Engine, EngineBuildError,
    EngineBuilder, EngineConfig, RetryPolicy,
};
