//! Route command implementation for the Wayfinder CLI.

use std::io::Write;
use std::str::FromStr;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfinder_core::{Coordinate, Operation, RouteQuery, VehicleProfile};
use wayfinder_resolver::CallContext;

use crate::providers::{
    EngineFactory, EnginePlan, ProviderSettings, default_routers, parse_provider_list,
};
use crate::{
    ARG_GRAPHHOPPER_KEY, ARG_GRAPHHOPPER_URL, ARG_MAX_ATTEMPTS, ARG_OSRM_URL, ARG_ROUTE_FROM,
    ARG_ROUTE_TO, ARG_ROUTE_VEHICLE, ARG_ROUTERS, ARG_TIMEOUT_SECS, CliError,
    ENV_ROUTE_FROM, ENV_ROUTE_GRAPHHOPPER_KEY, ENV_ROUTE_TO, write_json,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Compute road distance and travel time between two \
                 coordinates given as LAT,LON. Routers are tried in the \
                 configured order; the great-circle estimate can close the \
                 list as a last resort.",
    about = "Compute distance and duration between two coordinates"
)]
#[ortho_config(prefix = "WAYFINDER")]
pub(crate) struct RouteArgs {
    /// Origin as LAT,LON, e.g. "19.076,72.877".
    #[arg(long = ARG_ROUTE_FROM, value_name = "lat,lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) from: Option<String>,
    /// Destination as LAT,LON.
    #[arg(long = ARG_ROUTE_TO, value_name = "lat,lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) to: Option<String>,
    /// Vehicle profile (car or truck).
    #[arg(long = ARG_ROUTE_VEHICLE, value_name = "profile")]
    #[serde(default)]
    pub(crate) vehicle: Option<String>,
    /// Comma-separated routers in fallback order (graphhopper, osrm, estimate).
    #[arg(long = ARG_ROUTERS, value_name = "list")]
    #[serde(default)]
    pub(crate) routers: Option<String>,
    /// GraphHopper API key.
    #[arg(long = ARG_GRAPHHOPPER_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) graphhopper_key: Option<String>,
    /// Override the GraphHopper base URL.
    #[arg(long = ARG_GRAPHHOPPER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) graphhopper_url: Option<String>,
    /// Override the OSRM base URL.
    #[arg(long = ARG_OSRM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_url: Option<String>,
    /// Attempts per provider before falling back.
    #[arg(long = ARG_MAX_ATTEMPTS, value_name = "n")]
    #[serde(default)]
    pub(crate) max_attempts: Option<u32>,
    /// Overall time budget in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    /// Query handed to the engine.
    pub(crate) query: RouteQuery,
    /// Providers to assemble.
    pub(crate) plan: EnginePlan,
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let from = args.from.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_FROM,
            env: ENV_ROUTE_FROM,
        })?;
        let to = args.to.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_TO,
            env: ENV_ROUTE_TO,
        })?;
        let origin = parse_coordinate(&from, ARG_ROUTE_FROM)?;
        let destination = parse_coordinate(&to, ARG_ROUTE_TO)?;
        let vehicle = match args.vehicle.as_deref() {
            Some(raw) => VehicleProfile::from_str(raw)?,
            None => VehicleProfile::default(),
        };

        let settings = ProviderSettings {
            graphhopper_key: args.graphhopper_key,
            graphhopper_url: args.graphhopper_url,
            nominatim_url: None,
            osrm_url: args.osrm_url,
            max_attempts: args.max_attempts,
            timeout_secs: args.timeout_secs,
        };
        let routers = match args.routers.as_deref() {
            Some(raw) => parse_provider_list(raw, ARG_ROUTERS, Operation::Route)?,
            None => default_routers(settings.has_graphhopper_key()),
        };
        settings.require_graphhopper_key(&routers, ENV_ROUTE_GRAPHHOPPER_KEY)?;

        Ok(Self {
            query: RouteQuery::new(origin, destination).with_vehicle(vehicle),
            plan: EnginePlan {
                geocoders: Vec::new(),
                routers,
                settings,
            },
        })
    }
}

/// Parse `LAT,LON` into a validated coordinate.
pub(crate) fn parse_coordinate(raw: &str, field: &'static str) -> Result<Coordinate, CliError> {
    let invalid = |reason: String| CliError::InvalidCoordinate {
        field,
        value: raw.to_owned(),
        reason,
    };
    let (lat_text, lon_text) = raw
        .split_once(',')
        .ok_or_else(|| invalid("expected LAT,LON".to_owned()))?;
    let lat: f64 = lat_text
        .trim()
        .parse()
        .map_err(|err| invalid(format!("latitude: {err}")))?;
    let lon: f64 = lon_text
        .trim()
        .parse()
        .map_err(|err| invalid(format!("longitude: {err}")))?;
    Coordinate::new(lat, lon).map_err(|err| invalid(err.to_string()))
}

pub(crate) async fn run_route_with(
    args: RouteArgs,
    factory: &dyn EngineFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_route(&config, factory, writer).await
}

pub(crate) async fn execute_route(
    config: &RouteConfig,
    factory: &dyn EngineFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let engine = factory.build(&config.plan)?;
    let resolution = engine
        .compute_route_with(&config.query, &CallContext::new())
        .await?;
    write_json(writer, &resolution)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
