//! Error types emitted by the Wayfinder CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use thiserror::Error;
use wayfinder_core::{Operation, ParseVehicleProfileError, ResolveError};
use wayfinder_providers::ProviderBuildError;
use wayfinder_resolver::EngineBuildError;

/// Errors emitted by the Wayfinder CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A provider list named a provider this build does not know.
    #[error("unknown provider {name:?} in --{field} (expected graphhopper, nominatim, osrm or estimate)")]
    UnknownProvider { field: &'static str, name: String },
    /// A provider list named a provider lacking the required capability.
    #[error("{provider} cannot serve {operation} requests (--{field})")]
    UnsupportedProvider {
        field: &'static str,
        provider: &'static str,
        operation: Operation,
    },
    /// A provider list was present but named nothing.
    #[error("--{field} must name at least one provider")]
    EmptyProviderList { field: &'static str },
    /// A coordinate argument did not parse as `LAT,LON`.
    #[error("invalid --{field} coordinate {value:?}: {reason}")]
    InvalidCoordinate {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// The vehicle profile was not recognised.
    #[error(transparent)]
    InvalidVehicle(#[from] ParseVehicleProfileError),
    /// Constructing an HTTP provider failed.
    #[error("failed to build {provider} provider: {source}")]
    BuildProvider {
        provider: &'static str,
        #[source]
        source: ProviderBuildError,
    },
    /// Assembling the engine from the selected providers failed.
    #[error(transparent)]
    BuildEngine(#[from] EngineBuildError),
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    StartRuntime(#[source] std::io::Error),
    /// Every provider failed, or the query was rejected.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Serialising the resolution failed.
    #[error("failed to serialise resolution: {0}")]
    SerialiseResolution(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
