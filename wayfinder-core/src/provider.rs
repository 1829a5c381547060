//! Provider capability traits and descriptors.
//!
//! A provider is an external (or local) service that can geocode place
//! names, compute routes, or both. Each capability is a separate async
//! trait so a resolver can hold an ordered list of trait objects per
//! operation. Implementations must validate their input before issuing a
//! request and classify every failure into an [`ErrorKind`](crate::ErrorKind).

use async_trait::async_trait;

use crate::{
    Coordinate, LocationQuery, ProviderError, ProviderFailure, RouteQuery, RouteResult,
};

/// Capability flags declared by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    /// Resolves place names to coordinates.
    pub geocoding: bool,
    /// Computes distance and duration between coordinates.
    pub routing: bool,
    /// Honours [`RouteQuery::vehicle`].
    pub vehicle_aware: bool,
}

/// Static description of a provider.
///
/// # Examples
///
/// ```
/// use wayfinder_core::ProviderSpec;
///
/// let spec = ProviderSpec::new("osrm", "https://router.project-osrm.org").with_routing();
/// assert!(spec.capabilities.routing);
/// assert!(!spec.capabilities.geocoding);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderSpec {
    /// Identifier used in logs, diagnostics and cool-down tracking.
    pub name: String,
    /// Base endpoint the provider talks to.
    pub endpoint: String,
    /// What the provider can do.
    pub capabilities: Capabilities,
    /// Whether a credential must be configured.
    pub requires_credential: bool,
}

impl ProviderSpec {
    /// Describe a provider with no capabilities yet.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            capabilities: Capabilities::default(),
            requires_credential: false,
        }
    }

    /// Declare geocoding support.
    #[must_use]
    pub const fn with_geocoding(mut self) -> Self {
        self.capabilities.geocoding = true;
        self
    }

    /// Declare routing support.
    #[must_use]
    pub const fn with_routing(mut self) -> Self {
        self.capabilities.routing = true;
        self
    }

    /// Declare routing support that honours the vehicle profile.
    #[must_use]
    pub const fn with_vehicle_aware_routing(mut self) -> Self {
        self.capabilities.routing = true;
        self.capabilities.vehicle_aware = true;
        self
    }

    /// Declare that a credential is mandatory.
    #[must_use]
    pub const fn requiring_credential(mut self) -> Self {
        self.requires_credential = true;
        self
    }
}

/// Resolve place names to coordinates.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Static description of this provider.
    fn spec(&self) -> &ProviderSpec;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Resolve `query` to a single coordinate.
    ///
    /// Implementations must return an
    /// [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) error,
    /// without any network traffic, when [`LocationQuery::validate`] fails.
    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinate, ProviderError>;
}

/// Compute distance and duration between coordinates.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Static description of this provider.
    fn spec(&self) -> &ProviderSpec;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Compute a route for `query` in metres and seconds.
    ///
    /// Implementations must return an
    /// [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) error,
    /// without any network traffic, when [`RouteQuery::validate`] fails.
    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError>;
}

/// A resolved value and where it came from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution<T> {
    /// The canonical result.
    pub value: T,
    /// Name of the provider that produced the value.
    pub provider: String,
    /// Whether the value was served from the result cache.
    pub cached: bool,
    /// Providers that failed before `provider` answered, in the order they
    /// were tried. Empty for cache hits.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub fallbacks: Vec<ProviderFailure>,
}

impl<T> Resolution<T> {
    /// A value freshly produced by `provider`.
    #[must_use]
    pub fn fresh(value: T, provider: impl Into<String>) -> Self {
        Self {
            value,
            provider: provider.into(),
            cached: false,
            fallbacks: Vec::new(),
        }
    }

    /// Record the providers that failed before this one answered.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: Vec<ProviderFailure>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// The same resolution, marked as served from cache.
    #[must_use]
    pub fn into_cached(self) -> Self {
        Self {
            cached: true,
            fallbacks: Vec::new(),
            ..self
        }
    }
}
