//! Ordered provider fallback shared by geocoding and routing.
//!
//! [`Lookup`] describes one operation: how to validate and key a query and
//! how to call a provider for it. [`FallbackResolver`] drives any lookup
//! through the same pipeline: validation, cache, single-flight, then each
//! provider in configured order under the retry policy and cool-down.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;
use wayfinder_core::{
    Coordinate, ErrorKind, GeocodingProvider, LocationQuery, Operation, ProviderError,
    ProviderFailure, ResolveError, Resolution, RouteKey, RouteQuery, RouteResult, RoutingProvider,
};

use crate::cache::{CacheStats, ResultCache};
use crate::context::CallContext;
use crate::cooldown::CooldownTracker;
use crate::flight::SingleFlight;
use crate::retry::RetryPolicy;

/// One resolvable operation and the provider trait that serves it.
pub trait Lookup: Send + Sync + 'static {
    /// Operation reported in errors and logs.
    const OPERATION: Operation;
    /// Canonical query.
    type Query: Send + Sync;
    /// Normalised cache and single-flight key.
    type Key: Eq + Hash + Clone + Send + Sync;
    /// Canonical result.
    type Output: Clone + Send + Sync;
    /// Provider trait object serving this operation.
    type Provider: ?Sized + Send + Sync;

    /// Reject malformed queries before any provider is called.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error describing the problem.
    fn validate(query: &Self::Query) -> Result<(), ProviderError>;

    /// Normalised key for `query`.
    fn key(query: &Self::Query) -> Self::Key;

    /// Provider name used in diagnostics and cool-down bookkeeping.
    fn provider_name(provider: &Self::Provider) -> &str;

    /// Issue one call to `provider`.
    fn call<'a>(
        provider: &'a Self::Provider,
        query: &'a Self::Query,
    ) -> BoxFuture<'a, Result<Self::Output, ProviderError>>;
}

/// Free-text location to coordinate.
#[derive(Debug, Clone, Copy)]
pub struct GeocodeLookup;

impl Lookup for GeocodeLookup {
    const OPERATION: Operation = Operation::Geocode;
    type Query = LocationQuery;
    type Key = String;
    type Output = Coordinate;
    type Provider = dyn GeocodingProvider;

    fn validate(query: &LocationQuery) -> Result<(), ProviderError> {
        query.validate()
    }

    fn key(query: &LocationQuery) -> String {
        query.cache_key()
    }

    fn provider_name(provider: &Self::Provider) -> &str {
        provider.name()
    }

    fn call<'a>(
        provider: &'a Self::Provider,
        query: &'a LocationQuery,
    ) -> BoxFuture<'a, Result<Coordinate, ProviderError>> {
        provider.geocode(query)
    }
}

/// Coordinate pair to road distance and duration.
#[derive(Debug, Clone, Copy)]
pub struct RouteLookup;

impl Lookup for RouteLookup {
    const OPERATION: Operation = Operation::Route;
    type Query = RouteQuery;
    type Key = RouteKey;
    type Output = RouteResult;
    type Provider = dyn RoutingProvider;

    fn validate(query: &RouteQuery) -> Result<(), ProviderError> {
        query.validate()
    }

    fn key(query: &RouteQuery) -> RouteKey {
        query.cache_key()
    }

    fn provider_name(provider: &Self::Provider) -> &str {
        provider.name()
    }

    fn call<'a>(
        provider: &'a Self::Provider,
        query: &'a RouteQuery,
    ) -> BoxFuture<'a, Result<RouteResult, ProviderError>> {
        provider.route(query)
    }
}

type Outcome<L> = Result<Resolution<<L as Lookup>::Output>, ResolveError>;

/// Settings shared by every resolver of an engine.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Retry policy applied to each provider.
    pub retry: RetryPolicy,
    /// Budget applied when the caller supplies no deadline.
    pub default_deadline: Option<Duration>,
    /// Whether concurrent identical queries share one resolution.
    pub single_flight: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            default_deadline: None,
            single_flight: true,
        }
    }
}

/// Tries providers in order until one answers.
pub struct FallbackResolver<L: Lookup> {
    providers: Vec<Arc<L::Provider>>,
    settings: ResolverSettings,
    cache: ResultCache<L::Key, Resolution<L::Output>>,
    cooldown: Arc<CooldownTracker>,
    flight: SingleFlight<L::Key, Outcome<L>>,
}

impl<L: Lookup> std::fmt::Debug for FallbackResolver<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResolver")
            .field("operation", &L::OPERATION)
            .field("providers", &self.provider_names())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<L: Lookup> FallbackResolver<L> {
    /// Create a resolver over `providers`, tried in the given order.
    #[must_use]
    pub fn new(
        providers: Vec<Arc<L::Provider>>,
        settings: ResolverSettings,
        cache: ResultCache<L::Key, Resolution<L::Output>>,
        cooldown: Arc<CooldownTracker>,
    ) -> Self {
        Self {
            providers,
            settings,
            cache,
            cooldown,
            flight: SingleFlight::default(),
        }
    }

    /// Provider names in fallback order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers
            .iter()
            .map(|provider| L::provider_name(provider))
            .collect()
    }

    /// The resolver's result cache.
    #[must_use]
    pub const fn cache(&self) -> &ResultCache<L::Key, Resolution<L::Output>> {
        &self.cache
    }

    /// Cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolve `query`, consulting the cache before any provider.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidInput`] for malformed queries,
    /// [`ResolveError::Cancelled`] when the context's token fires, and
    /// [`ResolveError::AllProvidersFailed`] with one trail entry per
    /// provider when nothing answered.
    pub async fn resolve(&self, query: &L::Query, ctx: &CallContext) -> Outcome<L> {
        L::validate(query).map_err(|err| invalid_input::<L>(&err))?;

        let key = L::key(query);
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("{} cache hit ({})", L::OPERATION, hit.provider);
            return Ok(hit.into_cached());
        }

        let deadline = ctx.effective_deadline(self.settings.default_deadline);
        let work = async {
            if self.settings.single_flight {
                self.flight
                    .run(&key, || self.resolve_in_flight(query, &key, deadline))
                    .await
            } else {
                self.resolve_uncached(query, &key, deadline).await
            }
        };

        tokio::select! {
            biased;
            () = ctx.token().cancelled() => {
                log::debug!("{} cancelled by caller", L::OPERATION);
                Err(ResolveError::Cancelled { operation: L::OPERATION })
            }
            outcome = work => outcome,
        }
    }

    /// Leader side of a flight. A flight for the same key may have finished
    /// and filled the cache after this caller's first lookup missed.
    async fn resolve_in_flight(
        &self,
        query: &L::Query,
        key: &L::Key,
        deadline: Option<Instant>,
    ) -> Outcome<L> {
        if let Some(hit) = self.cache.get(key) {
            log::debug!("{} cache hit on joining flight ({})", L::OPERATION, hit.provider);
            return Ok(hit.into_cached());
        }
        self.resolve_uncached(query, key, deadline).await
    }

    async fn resolve_uncached(
        &self,
        query: &L::Query,
        key: &L::Key,
        deadline: Option<Instant>,
    ) -> Outcome<L> {
        let mut failures = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let name = L::provider_name(provider);
            if let Some(remaining) = self.cooldown.remaining(name) {
                log::debug!("skipping {name}: cooling down for {remaining:?}");
                failures.push(ProviderFailure::skipped(
                    name,
                    ErrorKind::RateLimited,
                    format!("cooling down for another {}s", remaining.as_secs()),
                ));
                continue;
            }

            let outcome = self
                .settings
                .retry
                .run(deadline, || L::call(provider, query))
                .await;
            let error = match outcome.result {
                Ok(value) => {
                    if !failures.is_empty() {
                        log::info!("{} answered by fallback provider {name}", L::OPERATION);
                    }
                    let resolution = Resolution::fresh(value, name);
                    self.cache.insert(key.clone(), resolution.clone());
                    return Ok(resolution.with_fallbacks(failures));
                }
                Err(error) => error,
            };

            log::warn!(
                "{} provider {name} failed after {} attempt(s): {error}",
                L::OPERATION,
                outcome.attempts
            );
            match error.kind() {
                ErrorKind::InvalidInput => return Err(invalid_input::<L>(&error)),
                ErrorKind::RateLimited => self.cooldown.start(name),
                ErrorKind::NotFound | ErrorKind::Unavailable => {}
            }
            failures.push(ProviderFailure::from_error(name, &error, outcome.attempts));
        }

        Err(ResolveError::AllProvidersFailed {
            operation: L::OPERATION,
            failures,
        })
    }
}

fn invalid_input<L: Lookup>(error: &ProviderError) -> ResolveError {
    ResolveError::InvalidInput {
        operation: L::OPERATION,
        message: error.message().to_owned(),
    }
}
