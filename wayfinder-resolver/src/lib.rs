//! Retry, caching and ordered fallback for the Wayfinder engine.
//!
//! Responsibilities:
//! - Drive geocoding and routing through one uniform pipeline: validate,
//!   consult the cache, deduplicate concurrent calls, then try providers in
//!   configured order under a bounded retry policy.
//! - Skip providers cooling down after rate limiting.
//! - Collect a per-provider diagnostic trail when everything fails.
//!
//! Boundaries:
//! - Providers are supplied by the caller as trait objects; this crate makes
//!   no network calls of its own.
//! - Cache and cool-down state belong to an [`Engine`] instance; there is no
//!   global state.
//!
//! # Example
//!
//! ```
//! use wayfinder_core::{Coordinate, ProviderError};
//! use wayfinder_resolver::{EngineBuilder, EngineConfig};
//! use wayfinder_resolver::test_support::ScriptedProvider;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let engine = EngineBuilder::new(EngineConfig::default())
//!     .with_geocoder(ScriptedProvider::failing("primary", ProviderError::not_found("no hits")))
//!     .with_geocoder(ScriptedProvider::answering("secondary", Coordinate { lat: 19.076, lon: 72.877 }))
//!     .build()?;
//!
//! let found = engine.resolve_location("Mumbai", Some("India")).await?;
//! assert_eq!(found.provider, "secondary");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

#![forbid(unsafe_code)]

mod cache;
mod context;
mod cooldown;
mod engine;
mod fallback;
mod flight;
mod retry;

#[doc(hidden)]
pub mod test_support;

pub use cache::{CacheConfig, CacheStats, DEFAULT_MAX_ENTRIES, DEFAULT_TTL, ResultCache};
pub use context::CallContext;
pub use cooldown::{CooldownTracker, DEFAULT_COOLDOWN};
pub use engine::{Engine, EngineBuildError, EngineBuilder, EngineConfig};
pub use fallback::{FallbackResolver, GeocodeLookup, Lookup, ResolverSettings, RouteLookup};
pub use retry::{
    Backoff, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BACKOFF_DELAY, DEFAULT_MAX_ATTEMPTS, RetryOutcome,
    RetryPolicy,
};
pub use tokio_util::sync::CancellationToken;
