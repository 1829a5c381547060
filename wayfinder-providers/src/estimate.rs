//! Offline route estimate from great-circle distance.
//!
//! Used as the routing provider of last resort: it never touches the network
//! and always answers for valid coordinates. Road distance is approximated by
//! inflating the haversine distance by a detour factor; duration assumes a
//! constant average speed.

use async_trait::async_trait;
use geo::{Distance, Haversine, Point};
use wayfinder_core::{ProviderError, ProviderSpec, RouteQuery, RouteResult, RoutingProvider};

/// Provider name used in diagnostics.
pub const GREAT_CIRCLE: &str = "great-circle";

/// Average road speed assumed by the estimate, in km/h.
pub const DEFAULT_AVERAGE_SPEED_KMPH: f64 = 55.0;

/// Ratio of road distance to straight-line distance.
pub const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// Routing provider that estimates distance and duration locally.
///
/// # Examples
///
/// ```
/// use wayfinder_core::{Coordinate, RouteQuery, RoutingProvider};
/// use wayfinder_providers::GreatCircleEstimator;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let estimator = GreatCircleEstimator::default();
/// let here = Coordinate::new(19.076, 72.8777).unwrap();
/// let route = estimator.route(&RouteQuery::new(here, here)).await.unwrap();
/// assert_eq!(route.distance_meters, 0.0);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct GreatCircleEstimator {
    spec: ProviderSpec,
    detour_factor: f64,
    speed_kmph: f64,
}

impl Default for GreatCircleEstimator {
    fn default() -> Self {
        Self {
            spec: ProviderSpec::new(GREAT_CIRCLE, "local://great-circle").with_routing(),
            detour_factor: DEFAULT_DETOUR_FACTOR,
            speed_kmph: DEFAULT_AVERAGE_SPEED_KMPH,
        }
    }
}

impl GreatCircleEstimator {
    /// Override the detour factor. Values below 1 or non-finite are ignored.
    #[must_use]
    pub fn with_detour_factor(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor >= 1.0 {
            self.detour_factor = factor;
        }
        self
    }

    /// Override the average speed. Non-positive or non-finite values are
    /// ignored.
    #[must_use]
    pub fn with_average_speed(mut self, kmph: f64) -> Self {
        if kmph.is_finite() && kmph > 0.0 {
            self.speed_kmph = kmph;
        }
        self
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "distance and duration are derived from floating point geometry"
    )]
    fn estimate(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        let from = Point::new(query.origin.lon, query.origin.lat);
        let to = Point::new(query.destination.lon, query.destination.lat);
        let distance = Haversine.distance(from, to) * self.detour_factor;
        let metres_per_second = self.speed_kmph * 1000.0 / 3600.0;
        RouteResult::new(distance, distance / metres_per_second, GREAT_CIRCLE)
            .map_err(|err| ProviderError::unavailable(err.to_string()))
    }
}

#[async_trait]
impl RoutingProvider for GreatCircleEstimator {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, ProviderError> {
        query.validate()?;
        self.estimate(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use wayfinder_core::{Coordinate, ErrorKind};

    #[fixture]
    fn mumbai_to_delhi() -> RouteQuery {
        RouteQuery::new(
            Coordinate { lat: 19.0760, lon: 72.8777 },
            Coordinate { lat: 28.7041, lon: 77.1025 },
        )
    }

    #[rstest]
    #[tokio::test]
    async fn estimates_inflated_distance(mumbai_to_delhi: RouteQuery) {
        let route = GreatCircleEstimator::default()
            .route(&mumbai_to_delhi)
            .await
            .expect("estimate should succeed");

        // Straight-line distance is roughly 1,150 km.
        assert!(route.distance_meters > 1_400_000.0, "{}", route.distance_meters);
        assert!(route.distance_meters < 1_560_000.0, "{}", route.distance_meters);
        assert_eq!(route.provider, GREAT_CIRCLE);
    }

    #[rstest]
    #[tokio::test]
    async fn duration_follows_average_speed(mumbai_to_delhi: RouteQuery) {
        let estimator = GreatCircleEstimator::default().with_average_speed(36.0);
        let route = estimator.route(&mumbai_to_delhi).await.expect("estimate");

        // 36 km/h is exactly 10 m/s.
        let expected = route.distance_meters / 10.0;
        assert!((route.duration_seconds - expected).abs() < 1e-6);
    }

    #[rstest]
    fn ignores_nonsensical_overrides() {
        let estimator = GreatCircleEstimator::default()
            .with_detour_factor(0.5)
            .with_average_speed(f64::NAN);
        assert_eq!(estimator.detour_factor, DEFAULT_DETOUR_FACTOR);
        assert_eq!(estimator.speed_kmph, DEFAULT_AVERAGE_SPEED_KMPH);
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_invalid_coordinates() {
        let query = RouteQuery::new(
            Coordinate { lat: 91.0, lon: 0.0 },
            Coordinate { lat: 0.0, lon: 0.0 },
        );
        let err = GreatCircleEstimator::default()
            .route(&query)
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
