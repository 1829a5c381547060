//! Route queries between two coordinates and their canonical results.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::{Coordinate, ProviderError};

/// Vehicle class used by vehicle-aware routers.
///
/// Routers without vehicle support ignore the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VehicleProfile {
    /// Passenger car.
    Car,
    /// Heavy goods vehicle.
    #[default]
    Truck,
}

impl VehicleProfile {
    /// Profile name as understood by routing services.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Truck => "truck",
        }
    }
}

impl fmt::Display for VehicleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`VehicleProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown vehicle profile {0:?} (expected car or truck)")]
pub struct ParseVehicleProfileError(pub String);

impl FromStr for VehicleProfile {
    type Err = ParseVehicleProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(Self::Car),
            "truck" | "hgv" => Ok(Self::Truck),
            _ => Err(ParseVehicleProfileError(s.to_owned())),
        }
    }
}

/// An ordered origin/destination pair.
///
/// Direction matters: `a → b` and `b → a` are distinct queries with
/// distinct cache keys.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteQuery {
    /// Start of the route.
    pub origin: Coordinate,
    /// End of the route.
    pub destination: Coordinate,
    /// Vehicle the route is planned for.
    #[cfg_attr(feature = "serde", serde(default))]
    pub vehicle: VehicleProfile,
}

impl RouteQuery {
    /// Build a query with the default vehicle profile.
    #[must_use]
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            vehicle: VehicleProfile::default(),
        }
    }

    /// Replace the vehicle profile.
    #[must_use]
    pub const fn with_vehicle(mut self, vehicle: VehicleProfile) -> Self {
        self.vehicle = vehicle;
        self
    }

    /// Reject coordinates that are non-finite or out of range.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput)
    /// error naming the offending endpoint.
    pub fn validate(&self) -> Result<(), ProviderError> {
        self.origin
            .validate()
            .map_err(|err| ProviderError::invalid_input(format!("origin: {err}")))?;
        self.destination
            .validate()
            .map_err(|err| ProviderError::invalid_input(format!("destination: {err}")))
    }

    /// Key identifying this query in caches.
    #[must_use]
    pub fn cache_key(&self) -> RouteKey {
        RouteKey {
            origin: [key_bits(self.origin.lat), key_bits(self.origin.lon)],
            destination: [
                key_bits(self.destination.lat),
                key_bits(self.destination.lon),
            ],
            vehicle: self.vehicle,
        }
    }
}

/// Hashable identity of a [`RouteQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: [u64; 2],
    destination: [u64; 2],
    vehicle: VehicleProfile,
}

// Signed zeros compare equal, so they must share a key.
fn key_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

/// Distance and travel time between two coordinates, in canonical units.
///
/// # Examples
///
/// ```
/// use wayfinder_core::RouteResult;
///
/// let route = RouteResult::new(1_400_567.8, 90_720.0, "osrm")?;
/// assert_eq!(route.provider, "osrm");
/// assert!(RouteResult::new(-1.0, 0.0, "osrm").is_err());
/// # Ok::<(), wayfinder_core::RouteResultError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteResult {
    /// Road distance in metres.
    pub distance_meters: f64,
    /// Travel time in seconds.
    pub duration_seconds: f64,
    /// Name of the provider that produced the route.
    pub provider: String,
}

/// Errors returned by [`RouteResult::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RouteResultError {
    /// Distance was negative or not finite.
    #[error("route distance {0} is not a finite, non-negative number of metres")]
    InvalidDistance(f64),
    /// Duration was negative or not finite.
    #[error("route duration {0} is not a finite, non-negative number of seconds")]
    InvalidDuration(f64),
}

impl RouteResult {
    /// Validate and construct a route result.
    pub fn new(
        distance_meters: f64,
        duration_seconds: f64,
        provider: impl Into<String>,
    ) -> Result<Self, RouteResultError> {
        if !is_non_negative(distance_meters) {
            return Err(RouteResultError::InvalidDistance(distance_meters));
        }
        if !is_non_negative(duration_seconds) {
            return Err(RouteResultError::InvalidDuration(duration_seconds));
        }
        Ok(Self {
            distance_meters,
            duration_seconds,
            provider: provider.into(),
        })
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rstest::{fixture, rstest};

    #[fixture]
    fn mumbai() -> Coordinate {
        Coordinate {
            lat: 19.076,
            lon: 72.877,
        }
    }

    #[fixture]
    fn delhi() -> Coordinate {
        Coordinate {
            lat: 28.704,
            lon: 77.102,
        }
    }

    #[rstest]
    fn direction_is_part_of_the_key(mumbai: Coordinate, delhi: Coordinate) {
        let there = RouteQuery::new(mumbai, delhi);
        let back = RouteQuery::new(delhi, mumbai);
        assert_ne!(there.cache_key(), back.cache_key());
        assert_eq!(there.cache_key(), RouteQuery::new(mumbai, delhi).cache_key());
    }

    #[rstest]
    fn vehicle_is_part_of_the_key(mumbai: Coordinate, delhi: Coordinate) {
        let truck = RouteQuery::new(mumbai, delhi);
        let car = truck.with_vehicle(VehicleProfile::Car);
        assert_ne!(truck.cache_key(), car.cache_key());
    }

    #[rstest]
    fn signed_zero_shares_a_key(delhi: Coordinate) {
        let positive = RouteQuery::new(Coordinate { lat: 0.0, lon: 0.0 }, delhi);
        let negative = RouteQuery::new(Coordinate { lat: -0.0, lon: -0.0 }, delhi);
        assert_eq!(positive.cache_key(), negative.cache_key());
    }

    #[rstest]
    #[case(Coordinate { lat: f64::NAN, lon: 0.0 })]
    #[case(Coordinate { lat: 0.0, lon: 200.0 })]
    #[case(Coordinate { lat: -95.0, lon: 0.0 })]
    fn invalid_endpoints_are_rejected(#[case] bad: Coordinate, delhi: Coordinate) {
        let err = RouteQuery::new(bad, delhi)
            .validate()
            .expect_err("invalid origin should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.message().starts_with("origin"));

        let err = RouteQuery::new(delhi, bad)
            .validate()
            .expect_err("invalid destination should fail");
        assert!(err.message().starts_with("destination"));
    }

    #[rstest]
    #[case("truck", VehicleProfile::Truck)]
    #[case(" CAR ", VehicleProfile::Car)]
    #[case("hgv", VehicleProfile::Truck)]
    fn parses_vehicle_profiles(#[case] raw: &str, #[case] expected: VehicleProfile) {
        assert_eq!(raw.parse::<VehicleProfile>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_vehicle_profile() {
        assert!("bicycle".parse::<VehicleProfile>().is_err());
    }

    #[rstest]
    #[case(f64::NAN, 1.0)]
    #[case(1.0, -0.5)]
    #[case(f64::INFINITY, 1.0)]
    fn route_result_rejects_invalid_metrics(#[case] distance: f64, #[case] duration: f64) {
        assert!(RouteResult::new(distance, duration, "osrm").is_err());
    }

    #[rstest]
    fn route_result_accepts_zero_length_routes() {
        let route = RouteResult::new(0.0, 0.0, "osrm").expect("zero route is valid");
        assert_eq!(route.distance_meters, 0.0);
    }
}
