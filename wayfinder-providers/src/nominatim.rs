//! OpenStreetMap Nominatim geocoding.
//!
//! Nominatim answers with a JSON array of places whose coordinates are
//! encoded as strings. It needs no key but insists on an identifying
//! user agent.

use async_trait::async_trait;
use serde::Deserialize;
use wayfinder_core::{Coordinate, GeocodingProvider, LocationQuery, ProviderError, ProviderSpec};

use crate::http::{HttpClient, HttpProviderConfig, ProviderBuildError, encode_query};

/// Provider name used in diagnostics.
pub const NOMINATIM: &str = "nominatim";

/// Public Nominatim endpoint.
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Nominatim geocoding adapter.
#[derive(Debug)]
pub struct NominatimProvider {
    http: HttpClient,
    spec: ProviderSpec,
}

impl NominatimProvider {
    /// Create a provider for the public instance with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpProviderConfig::new(NOMINATIM_BASE_URL))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let http = HttpClient::new(config)?;
        let spec = ProviderSpec::new(NOMINATIM, http.base_url()).with_geocoding();
        Ok(Self { http, spec })
    }

    fn search_url(&self, query: &LocationQuery) -> String {
        let text = query.search_text();
        let params = encode_query([("q", text.as_str()), ("format", "json"), ("limit", "1")]);
        format!("{}/search?{params}", self.http.base_url())
    }

    fn convert_response(places: Vec<Place>, query: &LocationQuery) -> Result<Coordinate, ProviderError> {
        let place = places.into_iter().next().ok_or_else(|| {
            ProviderError::not_found(format!("no places match {:?}", query.search_text()))
        })?;
        let lat = parse_degrees(&place.lat, "lat")?;
        let lon = parse_degrees(&place.lon, "lon")?;
        Coordinate::new(lat, lon)
            .map_err(|err| ProviderError::unavailable(format!("unusable place: {err}")))
    }
}

fn parse_degrees(raw: &str, field: &str) -> Result<f64, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::unavailable(format!("place {field} {raw:?} is not a number")))
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinate, ProviderError> {
        query.validate()?;
        let places: Vec<Place> = self.http.get_json(&self.search_url(query)).await?;
        Self::convert_response(places, query)
    }
}
