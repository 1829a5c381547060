//! Command-line interface for the Wayfinder geo-resolution engine.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod geocode;
mod providers;
mod route;

pub use error::CliError;

use geocode::{GeocodeArgs, run_geocode_with};
use providers::{EngineFactory, HttpEngineFactory};
use route::{RouteArgs, run_route_with};

const ARG_GEOCODE_TEXT: &str = "text";
const ARG_GEOCODE_HINT: &str = "hint";
const ARG_GEOCODERS: &str = "geocoders";
const ARG_ROUTE_FROM: &str = "from";
const ARG_ROUTE_TO: &str = "to";
const ARG_ROUTE_VEHICLE: &str = "vehicle";
const ARG_ROUTERS: &str = "routers";
const ARG_GRAPHHOPPER_KEY: &str = "graphhopper-key";
const ARG_GRAPHHOPPER_URL: &str = "graphhopper-url";
const ARG_NOMINATIM_URL: &str = "nominatim-url";
const ARG_OSRM_URL: &str = "osrm-url";
const ARG_MAX_ATTEMPTS: &str = "max-attempts";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ENV_GEOCODE_TEXT: &str = "WAYFINDER_CMDS_GEOCODE_TEXT";
const ENV_GEOCODE_GRAPHHOPPER_KEY: &str = "WAYFINDER_CMDS_GEOCODE_GRAPHHOPPER_KEY";
const ENV_ROUTE_FROM: &str = "WAYFINDER_CMDS_ROUTE_FROM";
const ENV_ROUTE_TO: &str = "WAYFINDER_CMDS_ROUTE_TO";
const ENV_ROUTE_GRAPHHOPPER_KEY: &str = "WAYFINDER_CMDS_ROUTE_GRAPHHOPPER_KEY";

/// Run the Wayfinder CLI with the current process arguments and environment.
///
/// The resolution is printed to stdout as pretty JSON.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::StartRuntime)?;
    let mut stdout = std::io::stdout().lock();
    runtime.block_on(dispatch(cli.command, &HttpEngineFactory, &mut stdout))
}

async fn dispatch(
    command: Command,
    factory: &dyn EngineFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Geocode(args) => run_geocode_with(args, factory, writer).await,
        Command::Route(args) => run_route_with(args, factory, writer).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wayfinder",
    about = "Geocode places and compute road routes with provider fallback",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a place name to a coordinate.
    Geocode(GeocodeArgs),
    /// Compute distance and duration between two coordinates.
    Route(RouteArgs),
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseResolution)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
