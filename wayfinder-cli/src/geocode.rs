//! Geocode command implementation for the Wayfinder CLI.

use std::io::Write;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfinder_core::{LocationQuery, Operation};
use wayfinder_resolver::CallContext;

use crate::providers::{
    EngineFactory, EnginePlan, ProviderSettings, default_geocoders, parse_provider_list,
};
use crate::{
    ARG_GEOCODE_HINT, ARG_GEOCODE_TEXT, ARG_GEOCODERS, ARG_GRAPHHOPPER_KEY, ARG_GRAPHHOPPER_URL,
    ARG_MAX_ATTEMPTS, ARG_NOMINATIM_URL, ARG_TIMEOUT_SECS, CliError, ENV_GEOCODE_GRAPHHOPPER_KEY,
    ENV_GEOCODE_TEXT, write_json,
};

/// CLI arguments for the `geocode` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Resolve a free-text place name to a coordinate. Geocoders \
                 are tried in the configured order; transient failures are \
                 retried and rate-limited services are skipped for a while.",
    about = "Resolve a place name to a coordinate"
)]
#[ortho_config(prefix = "WAYFINDER")]
pub(crate) struct GeocodeArgs {
    /// Place name to resolve, e.g. "Mumbai".
    #[arg(value_name = ARG_GEOCODE_TEXT)]
    #[serde(default)]
    pub(crate) text: Option<String>,
    /// Country or region hint, e.g. "India".
    #[arg(long = ARG_GEOCODE_HINT, value_name = "region")]
    #[serde(default)]
    pub(crate) hint: Option<String>,
    /// Comma-separated geocoders in fallback order (graphhopper, nominatim).
    #[arg(long = ARG_GEOCODERS, value_name = "list")]
    #[serde(default)]
    pub(crate) geocoders: Option<String>,
    /// GraphHopper API key.
    #[arg(long = ARG_GRAPHHOPPER_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) graphhopper_key: Option<String>,
    /// Override the GraphHopper base URL.
    #[arg(long = ARG_GRAPHHOPPER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) graphhopper_url: Option<String>,
    /// Override the Nominatim base URL.
    #[arg(long = ARG_NOMINATIM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_url: Option<String>,
    /// Attempts per provider before falling back.
    #[arg(long = ARG_MAX_ATTEMPTS, value_name = "n")]
    #[serde(default)]
    pub(crate) max_attempts: Option<u32>,
    /// Overall time budget in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl GeocodeArgs {
    pub(crate) fn into_config(self) -> Result<GeocodeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeocodeConfig::try_from(merged)
    }
}

/// Resolved `geocode` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeocodeConfig {
    /// Query handed to the engine.
    pub(crate) query: LocationQuery,
    /// Providers to assemble.
    pub(crate) plan: EnginePlan,
}

impl TryFrom<GeocodeArgs> for GeocodeConfig {
    type Error = CliError;

    fn try_from(args: GeocodeArgs) -> Result<Self, Self::Error> {
        let text = args.text.ok_or(CliError::MissingArgument {
            field: ARG_GEOCODE_TEXT,
            env: ENV_GEOCODE_TEXT,
        })?;
        let settings = ProviderSettings {
            graphhopper_key: args.graphhopper_key,
            graphhopper_url: args.graphhopper_url,
            nominatim_url: args.nominatim_url,
            osrm_url: None,
            max_attempts: args.max_attempts,
            timeout_secs: args.timeout_secs,
        };
        let geocoders = match args.geocoders.as_deref() {
            Some(raw) => parse_provider_list(raw, ARG_GEOCODERS, Operation::Geocode)?,
            None => default_geocoders(settings.has_graphhopper_key()),
        };
        settings.require_graphhopper_key(&geocoders, ENV_GEOCODE_GRAPHHOPPER_KEY)?;

        Ok(Self {
            query: LocationQuery::from_parts(text, args.hint.as_deref()),
            plan: EnginePlan {
                geocoders,
                routers: Vec::new(),
                settings,
            },
        })
    }
}

pub(crate) async fn run_geocode_with(
    args: GeocodeArgs,
    factory: &dyn EngineFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_geocode(&config, factory, writer).await
}

pub(crate) async fn execute_geocode(
    config: &GeocodeConfig,
    factory: &dyn EngineFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let engine = factory.build(&config.plan)?;
    let resolution = engine
        .resolve_location_with(&config.query, &CallContext::new())
        .await?;
    write_json(writer, &resolution)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<GeocodeConfig, CliError> {
    let merged = GeocodeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    GeocodeConfig::try_from(merged)
}
