//! GraphHopper geocoding and truck-aware routing.
//!
//! Both endpoints take the API key as a `key` query parameter. Routes are
//! reported in metres and **milliseconds**; the adapter converts durations
//! to seconds.
//!
//! See: <https://docs.graphhopper.com/>

use async_trait::async_trait;
use serde::Deserialize;
use wayfinder_core::{
    Coordinate, GeocodingProvider, LocationQuery, ProviderError, ProviderSpec, RouteQuery,
    RouteResult, RoutingProvider,
};

use crate::http::{HttpClient, HttpProviderConfig, ProviderBuildError, encode_query};

/// Provider name used in diagnostics.
pub const GRAPHHOPPER: &str = "graphhopper";

/// Public GraphHopper API endpoint.
pub const GRAPHHOPPER_BASE_URL: &str = "https://graphhopper.com/api/1";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    point: Point,
}

#[derive(Debug, Deserialize)]
struct Point {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    paths: Vec<Path>,
}

#[derive(Debug, Deserialize)]
struct Path {
    /// Metres.
    distance: f64,
    /// Milliseconds.
    time: f64,
}

/// GraphHopper adapter implementing both geocoding and routing.
#[derive(Debug)]
pub struct GraphHopperProvider {
    http: HttpClient,
    spec: ProviderSpec,
    key: String,
}

impl GraphHopperProvider {
    /// Create a provider for the public API with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpProviderConfig::new(GRAPHHOPPER_BASE_URL).with_credential(api_key))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is configured, the base URL is
    /// invalid, or the HTTP client fails to build.
    pub fn with_config(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let key = config
            .credential
            .clone()
            .ok_or(ProviderBuildError::MissingCredential {
                provider: GRAPHHOPPER,
            })?;
        let http = HttpClient::new(config)?;
        let spec = ProviderSpec::new(GRAPHHOPPER, http.base_url())
            .with_geocoding()
            .with_vehicle_aware_routing()
            .requiring_credential();
        Ok(Self { http, spec, key })
    }

    fn geocode_url(&self, query: &LocationQuery) -> String {
        let text = query.search_text();
        let params = encode_query([
            ("q", text.as_str()),
            ("limit", "1"),
            ("locale", "en"),
            ("key", self.key.as_str()),
        ]);
        format!("{}/geocode?{params}", self.http.base_url())
    }

    fn route_url(&self, query: &RouteQuery) -> String {
        let from = format!("{},{}", query.origin.lat, query.origin.lon);
        let to = format!("{},{}", query.destination.lat, query.destination.lon);
        let params = encode_query([
            ("point", from.as_str()),
            ("point", to.as_str()),
            ("profile", query.vehicle.as_str()),
            ("calc_points", "false"),
            ("key", self.key.as_str()),
        ]);
        format!("{}/route?{params}", self.http.base_url())
    }

    fn convert_geocode(response: GeocodeResponse, query: &LocationQuery) -> Result<Coordinate, ProviderError> {
        let hit = response.hits.into_iter().next().ok_or_else(|| {
            ProviderError::not_found(format!("no geocode hits for {:?}", query.search_text()))
        })?;
        Coordinate::new(hit.point.lat, hit.point.lng)
            .map_err(|err| ProviderError::unavailable(format!("unusable geocode hit: {err}")))
    }

    fn convert_route(response: RouteResponse) -> Result<RouteResult, ProviderError> {
        let path = response
            .paths
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::not_found("no route paths in response"))?;
        RouteResult::new(path.distance, millis_to_secs(path.time), GRAPHHOPPER)
            .map_err(|err| ProviderError::unavailable(err.to_string()))
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "GraphHopper reports durations in milliseconds"
)]
fn millis_to_secs(millis: f64) -> f64 {
    millis / 1000.0
}

#[async_trait]
impl GeocodingProvider for GraphHopperProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinate, ProviderError> {
        query.validate()?;
        let response: GeocodeResponse = self.http.get_json(&self.geocode_url(query)).await?;
        Self::convert_geocode(response, query)
    }
}

#[async_trait]
impl RoutingProvider for GraphHopperProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        query.validate()?;
        let response: RouteResponse = self.http.get_json(&self.route_url(query)).await?;
        Self::convert_route(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use wayfinder_core::{ErrorKind, VehicleProfile};

    #[fixture]
    fn provider() -> GraphHopperProvider {
        GraphHopperProvider::with_config(
            &HttpProviderConfig::new("https://gh.example.com/api/1/").with_credential("k3y"),
        )
        .expect("provider should build")
    }

    #[rstest]
    fn requires_a_key() {
        let err = GraphHopperProvider::with_config(&HttpProviderConfig::new(GRAPHHOPPER_BASE_URL))
            .expect_err("missing key should fail");
        assert!(matches!(
            err,
            ProviderBuildError::MissingCredential { provider: GRAPHHOPPER }
        ));
    }

    #[rstest]
    fn declares_both_capabilities(provider: GraphHopperProvider) {
        let spec = GeocodingProvider::spec(&provider);
        assert!(spec.capabilities.geocoding);
        assert!(spec.capabilities.vehicle_aware);
        assert!(spec.requires_credential);
        assert_eq!(spec.endpoint, "https://gh.example.com/api/1");
    }

    #[rstest]
    fn geocode_url_appends_hint_and_key(provider: GraphHopperProvider) {
        let url = provider.geocode_url(&LocationQuery::new("Nagpur").with_hint("India"));
        assert_eq!(
            url,
            "https://gh.example.com/api/1/geocode?q=Nagpur%2C+India&limit=1&locale=en&key=k3y"
        );
    }

    #[rstest]
    fn route_url_repeats_point_and_sets_profile(provider: GraphHopperProvider) {
        let query = RouteQuery::new(
            Coordinate { lat: 19.076, lon: 72.877 },
            Coordinate { lat: 28.704, lon: 77.102 },
        )
        .with_vehicle(VehicleProfile::Car);
        let url = provider.route_url(&query);
        assert_eq!(
            url,
            "https://gh.example.com/api/1/route?point=19.076%2C72.877&point=28.704%2C77.102\
             &profile=car&calc_points=false&key=k3y"
        );
    }

    #[rstest]
    fn converts_first_geocode_hit() {
        let response: GeocodeResponse = serde_json::from_str(
            r#"{"hits":[{"point":{"lat":19.076,"lng":72.877},"name":"Mumbai"},
                       {"point":{"lat":0.0,"lng":0.0}}]}"#,
        )
        .expect("should deserialise");
        let coord = GraphHopperProvider::convert_geocode(response, &LocationQuery::new("Mumbai"))
            .expect("should convert");
        assert_eq!(coord, Coordinate { lat: 19.076, lon: 72.877 });
    }

    #[rstest]
    #[case(r#"{"hits":[]}"#)]
    #[case(r#"{"locale":"en"}"#)]
    fn empty_hits_are_not_found(#[case] body: &str) {
        let response: GeocodeResponse = serde_json::from_str(body).expect("should deserialise");
        let err = GraphHopperProvider::convert_geocode(response, &LocationQuery::new("Atlantis"))
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    fn out_of_range_hit_is_unavailable() {
        let response: GeocodeResponse =
            serde_json::from_str(r#"{"hits":[{"point":{"lat":120.0,"lng":0.0}}]}"#)
                .expect("should deserialise");
        let err = GraphHopperProvider::convert_geocode(response, &LocationQuery::new("x"))
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[rstest]
    fn route_time_is_converted_to_seconds() {
        let response: RouteResponse = serde_json::from_str(
            r#"{"paths":[{"distance":1400567.8,"time":90720000,"weight":1.0}]}"#,
        )
        .expect("should deserialise");
        let route = GraphHopperProvider::convert_route(response).expect("should convert");
        assert_eq!(route.distance_meters, 1_400_567.8);
        assert_eq!(route.duration_seconds, 90_720.0);
        assert_eq!(route.provider, GRAPHHOPPER);
    }

    #[rstest]
    fn missing_paths_are_not_found() {
        let response: RouteResponse = serde_json::from_str(r#"{"paths":[]}"#).expect("json");
        let err = GraphHopperProvider::convert_route(response).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_route_input_short_circuits(provider: GraphHopperProvider) {
        let query = RouteQuery::new(
            Coordinate { lat: f64::NAN, lon: 0.0 },
            Coordinate { lat: 0.0, lon: 0.0 },
        );
        let err = provider.route(&query).await.expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
