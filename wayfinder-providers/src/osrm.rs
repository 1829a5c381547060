//! OSRM Route service adapter.
//!
//! The Route service returns the fastest route between coordinates given as
//! `lon,lat` pairs in the path. Distances are metres and durations seconds,
//! so no unit conversion is needed. OSRM has a single driving profile per
//! deployment and ignores the vehicle profile.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use async_trait::async_trait;
use serde::Deserialize;
use wayfinder_core::{ProviderError, ProviderSpec, RouteQuery, RouteResult, RoutingProvider};

use crate::http::{HttpClient, HttpProviderConfig, ProviderBuildError};

/// Provider name used in diagnostics.
pub const OSRM: &str = "osrm";

/// Public OSRM demo server.
pub const OSRM_BASE_URL: &str = "https://router.project-osrm.org";

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"NoRoute"` - No route between the points
    /// - `"NoSegment"` - A coordinate could not be snapped to the network
    /// - `"InvalidQuery"` - Invalid query parameters
    code: String,

    /// Optional error message when `code` is not `"Ok"`.
    message: Option<String>,

    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    distance: f64,
    duration: f64,
}

impl RouteResponse {
    fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// OSRM routing adapter.
#[derive(Debug)]
pub struct OsrmProvider {
    http: HttpClient,
    spec: ProviderSpec,
}

impl OsrmProvider {
    /// Create a provider with default configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for the OSRM service (e.g., `"http://localhost:5000"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let http = HttpClient::new(config)?;
        let spec = ProviderSpec::new(OSRM, http.base_url()).with_routing();
        Ok(Self { http, spec })
    }

    /// Build the Route API URL.
    ///
    /// The URL format is:
    /// `{base_url}/route/v1/driving/{lon},{lat};{lon},{lat}?overview=false`.
    fn build_route_url(&self, query: &RouteQuery) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.http.base_url(),
            query.origin.lon,
            query.origin.lat,
            query.destination.lon,
            query.destination.lat
        )
    }

    fn convert_response(response: RouteResponse) -> Result<RouteResult, ProviderError> {
        if !response.is_ok() {
            let message = format!(
                "OSRM {}: {}",
                response.code,
                response.message.unwrap_or_default()
            );
            return Err(match response.code.as_str() {
                "NoRoute" | "NoSegment" => ProviderError::not_found(message),
                _ => ProviderError::unavailable(message),
            });
        }
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::not_found("OSRM response contained no routes"))?;
        RouteResult::new(route.distance, route.duration, OSRM)
            .map_err(|err| ProviderError::unavailable(err.to_string()))
    }
}

#[async_trait]
impl RoutingProvider for OsrmProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        query.validate()?;
        let response: RouteResponse = self.http.get_json(&self.build_route_url(query)).await?;
        Self::convert_response(response)
    }
}
