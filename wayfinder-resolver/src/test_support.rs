//! Test utilities for resolver and engine tests.
//!
//! [`ScriptedProvider`] is a deterministic stand-in for a remote service: it
//! replays a script of results, then repeats a fixed answer, counting every
//! call it receives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use wayfinder_core::{
    Capabilities, Coordinate, GeocodingProvider, LocationQuery, ProviderError, ProviderSpec,
    RouteQuery, RouteResult, RoutingProvider,
};

/// Provider stub replaying scripted results.
///
/// Implements [`GeocodingProvider`] when `T` is [`Coordinate`] and
/// [`RoutingProvider`] when `T` is [`RouteResult`]. Queries are validated
/// first, as real adapters do, and rejected queries are not counted.
///
/// # Example
///
/// ```
/// use wayfinder_core::{Coordinate, GeocodingProvider, LocationQuery, ProviderError};
/// use wayfinder_resolver::test_support::ScriptedProvider;
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let mumbai = Coordinate { lat: 19.076, lon: 72.877 };
/// let stub = ScriptedProvider::answering("p1", mumbai)
///     .with_steps([Err(ProviderError::unavailable("503"))]);
///
/// let query = LocationQuery::new("Mumbai");
/// assert!(stub.geocode(&query).await.is_err());
/// assert_eq!(stub.geocode(&query).await, Ok(mumbai));
/// assert_eq!(stub.calls(), 2);
/// # });
/// ```
#[derive(Debug)]
pub struct ScriptedProvider<T> {
    spec: ProviderSpec,
    steps: Mutex<VecDeque<Result<T, ProviderError>>>,
    otherwise: Result<T, ProviderError>,
    delay: Duration,
    calls: AtomicU32,
}

impl<T: Clone> ScriptedProvider<T> {
    fn with_default(name: &str, otherwise: Result<T, ProviderError>) -> Self {
        Self {
            spec: ProviderSpec::new(name, format!("stub://{name}"))
                .with_geocoding()
                .with_routing(),
            steps: Mutex::new(VecDeque::new()),
            otherwise,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    /// A provider that always answers `value`.
    #[must_use]
    pub fn answering(name: &str, value: T) -> Self {
        Self::with_default(name, Ok(value))
    }

    /// A provider that always fails with `error`.
    #[must_use]
    pub fn failing(name: &str, error: ProviderError) -> Self {
        Self::with_default(name, Err(error))
    }

    /// Play `steps` in order before falling back to the fixed answer.
    #[must_use]
    pub fn with_steps(self, steps: impl IntoIterator<Item = Result<T, ProviderError>>) -> Self {
        self.steps.lock().extend(steps);
        self
    }

    /// Replace the declared capabilities, which default to everything.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.spec.capabilities = capabilities;
        self
    }

    /// Wait `delay` before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let step = self.steps.lock().pop_front();
        step.unwrap_or_else(|| self.otherwise.clone())
    }
}

#[async_trait]
impl GeocodingProvider for ScriptedProvider<Coordinate> {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinate, ProviderError> {
        query.validate()?;
        self.respond().await
    }
}

#[async_trait]
impl RoutingProvider for ScriptedProvider<RouteResult> {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        query.validate()?;
        self.respond().await
    }
}
