//! Engine facade: one geocoding and one routing resolver sharing a
//! cool-down tracker.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use wayfinder_core::{
    Coordinate, GeocodingProvider, LocationQuery, Operation, ResolveError, Resolution, RouteQuery,
    RouteResult, RoutingProvider, VehicleProfile,
};

use crate::cache::{CacheConfig, CacheStats, ResultCache};
use crate::context::CallContext;
use crate::cooldown::{CooldownTracker, DEFAULT_COOLDOWN};
use crate::fallback::{FallbackResolver, GeocodeLookup, ResolverSettings, RouteLookup};
use crate::retry::RetryPolicy;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Retry policy applied to every provider.
    pub retry: RetryPolicy,
    /// Sizing and expiry of each result cache.
    pub cache: CacheConfig,
    /// How long a rate-limited provider is skipped.
    pub cooldown: Duration,
    /// Overall budget for calls whose context carries no deadline.
    pub default_deadline: Option<Duration>,
    /// Share one upstream resolution between concurrent identical calls.
    pub single_flight: bool,
    /// Vehicle used by [`Engine::compute_route`].
    pub default_vehicle: VehicleProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
            cooldown: DEFAULT_COOLDOWN,
            default_deadline: None,
            single_flight: true,
            default_vehicle: VehicleProfile::default(),
        }
    }
}

impl EngineConfig {
    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the cache configuration.
    #[must_use]
    pub const fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the rate-limit cool-down window.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the default overall deadline.
    #[must_use]
    pub const fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }

    /// Enable or disable single-flight deduplication.
    #[must_use]
    pub const fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Set the vehicle profile used when none is given.
    #[must_use]
    pub const fn with_default_vehicle(mut self, vehicle: VehicleProfile) -> Self {
        self.default_vehicle = vehicle;
        self
    }

    fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            retry: self.retry,
            default_deadline: self.default_deadline,
            single_flight: self.single_flight,
        }
    }
}

/// Errors raised while assembling an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineBuildError {
    /// A provider was registered for an operation it does not declare.
    #[error("provider {provider} does not support {operation}")]
    Unsupported {
        /// Offending provider.
        provider: String,
        /// Operation it was registered for.
        operation: Operation,
    },
    /// Two providers for the same operation share a name.
    #[error("provider {provider} is registered twice for {operation}")]
    Duplicate {
        /// Repeated provider name.
        provider: String,
        /// Operation with the duplicate.
        operation: Operation,
    },
}

/// Builder collecting ordered provider lists.
///
/// # Examples
///
/// ```
/// use wayfinder_core::Coordinate;
/// use wayfinder_resolver::{EngineBuilder, EngineConfig};
/// use wayfinder_resolver::test_support::ScriptedProvider;
///
/// let engine = EngineBuilder::new(EngineConfig::default())
///     .with_geocoder(ScriptedProvider::answering("primary", Coordinate { lat: 1.0, lon: 2.0 }))
///     .build()
///     .expect("engine should build");
/// assert_eq!(engine.geocoder_names(), vec!["primary"]);
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    geocoders: Vec<Arc<dyn GeocodingProvider>>,
    routers: Vec<Arc<dyn RoutingProvider>>,
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("geocoders", &self.geocoders.len())
            .field("routers", &self.routers.len())
            .finish()
    }
}

impl EngineBuilder {
    /// Start a builder with `config` and no providers.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            geocoders: Vec::new(),
            routers: Vec::new(),
        }
    }

    /// Append a geocoding provider to the fallback order.
    #[must_use]
    pub fn with_geocoder(self, provider: impl GeocodingProvider + 'static) -> Self {
        self.with_shared_geocoder(Arc::new(provider))
    }

    /// Append a shared geocoding provider to the fallback order.
    #[must_use]
    pub fn with_shared_geocoder(mut self, provider: Arc<dyn GeocodingProvider>) -> Self {
        self.geocoders.push(provider);
        self
    }

    /// Append a routing provider to the fallback order.
    #[must_use]
    pub fn with_router(self, provider: impl RoutingProvider + 'static) -> Self {
        self.with_shared_router(Arc::new(provider))
    }

    /// Append a shared routing provider to the fallback order.
    #[must_use]
    pub fn with_shared_router(mut self, provider: Arc<dyn RoutingProvider>) -> Self {
        self.routers.push(provider);
        self
    }

    /// Validate the provider lists and build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineBuildError`] when a provider lacks the capability for
    /// its list or a name repeats within a list.
    pub fn build(self) -> Result<Engine, EngineBuildError> {
        check_providers(
            Operation::Geocode,
            self.geocoders
                .iter()
                .map(|p| (p.name(), p.spec().capabilities.geocoding)),
        )?;
        check_providers(
            Operation::Route,
            self.routers
                .iter()
                .map(|p| (p.name(), p.spec().capabilities.routing)),
        )?;

        let settings = self.config.resolver_settings();
        let cooldown = Arc::new(CooldownTracker::new(self.config.cooldown));
        let geocode = FallbackResolver::new(
            self.geocoders,
            settings.clone(),
            ResultCache::new(self.config.cache),
            Arc::clone(&cooldown),
        );
        let route = FallbackResolver::new(
            self.routers,
            settings,
            ResultCache::new(self.config.cache),
            Arc::clone(&cooldown),
        );
        log::debug!(
            "engine ready: geocoders {:?}, routers {:?}",
            geocode.provider_names(),
            route.provider_names()
        );
        Ok(Engine {
            config: self.config,
            geocode,
            route,
            cooldown,
        })
    }
}

fn check_providers<'a>(
    operation: Operation,
    providers: impl Iterator<Item = (&'a str, bool)>,
) -> Result<(), EngineBuildError> {
    let mut seen = HashSet::new();
    for (name, capable) in providers {
        if !capable {
            return Err(EngineBuildError::Unsupported {
                provider: name.to_owned(),
                operation,
            });
        }
        if !seen.insert(name) {
            return Err(EngineBuildError::Duplicate {
                provider: name.to_owned(),
                operation,
            });
        }
    }
    Ok(())
}

/// Resolves locations and routes through ordered provider fallback.
///
/// The engine owns its caches and cool-down state; share it behind an `Arc`
/// to serve concurrent callers.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    geocode: FallbackResolver<GeocodeLookup>,
    route: FallbackResolver<RouteLookup>,
    cooldown: Arc<CooldownTracker>,
}

impl Engine {
    /// Start building an engine with default configuration.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve free text, optionally qualified by a region hint, to a
    /// coordinate.
    ///
    /// # Errors
    ///
    /// See [`Engine::resolve_location_with`].
    pub async fn resolve_location(
        &self,
        text: &str,
        hint: Option<&str>,
    ) -> Result<Resolution<Coordinate>, ResolveError> {
        self.resolve_location_with(&LocationQuery::from_parts(text, hint), &CallContext::new())
            .await
    }

    /// Resolve `query` under the caller's cancellation token and deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidInput`] for blank or oversized text,
    /// [`ResolveError::Cancelled`] when `ctx` is cancelled, and
    /// [`ResolveError::AllProvidersFailed`] when no geocoder answered.
    pub async fn resolve_location_with(
        &self,
        query: &LocationQuery,
        ctx: &CallContext,
    ) -> Result<Resolution<Coordinate>, ResolveError> {
        self.geocode.resolve(query, ctx).await
    }

    /// Compute road distance and duration between two coordinates using the
    /// default vehicle profile.
    ///
    /// # Errors
    ///
    /// See [`Engine::compute_route_with`].
    pub async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Resolution<RouteResult>, ResolveError> {
        let query = RouteQuery::new(origin, destination).with_vehicle(self.config.default_vehicle);
        self.compute_route_with(&query, &CallContext::new()).await
    }

    /// Compute `query` under the caller's cancellation token and deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidInput`] for out-of-range coordinates,
    /// [`ResolveError::Cancelled`] when `ctx` is cancelled, and
    /// [`ResolveError::AllProvidersFailed`] when no router answered.
    pub async fn compute_route_with(
        &self,
        query: &RouteQuery,
        ctx: &CallContext,
    ) -> Result<Resolution<RouteResult>, ResolveError> {
        self.route.resolve(query, ctx).await
    }

    /// Geocoders in fallback order.
    #[must_use]
    pub fn geocoder_names(&self) -> Vec<&str> {
        self.geocode.provider_names()
    }

    /// Routers in fallback order.
    #[must_use]
    pub fn router_names(&self) -> Vec<&str> {
        self.route.provider_names()
    }

    /// Geocode cache counters.
    #[must_use]
    pub fn geocode_cache_stats(&self) -> CacheStats {
        self.geocode.cache_stats()
    }

    /// Route cache counters.
    #[must_use]
    pub fn route_cache_stats(&self) -> CacheStats {
        self.route.cache_stats()
    }

    /// Whether `provider` is currently skipped after rate limiting.
    #[must_use]
    pub fn is_cooling_down(&self, provider: &str) -> bool {
        self.cooldown.is_cooling(provider)
    }

    /// Drop every cached result and cool-down.
    pub fn reset(&self) {
        self.geocode.cache().clear();
        self.route.cache().clear();
        self.cooldown.reset();
    }
}
