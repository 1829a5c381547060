//! Provider selection and engine assembly shared by the CLI commands.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use wayfinder_core::Operation;
use wayfinder_providers::{
    GRAPHHOPPER, GRAPHHOPPER_BASE_URL, GREAT_CIRCLE, GraphHopperProvider, GreatCircleEstimator,
    HttpProviderConfig, NOMINATIM, NOMINATIM_BASE_URL, NominatimProvider, OSRM, OSRM_BASE_URL,
    OsrmProvider, ProviderBuildError,
};
use wayfinder_resolver::{Engine, EngineBuilder, EngineConfig, RetryPolicy};

use crate::{ARG_GRAPHHOPPER_KEY, CliError};

/// Providers the CLI knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProviderKind {
    GraphHopper,
    Nominatim,
    Osrm,
    GreatCircle,
}

impl ProviderKind {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::GraphHopper => GRAPHHOPPER,
            Self::Nominatim => NOMINATIM,
            Self::Osrm => OSRM,
            Self::GreatCircle => GREAT_CIRCLE,
        }
    }

    const fn supports(self, operation: Operation) -> bool {
        match operation {
            Operation::Geocode => matches!(self, Self::GraphHopper | Self::Nominatim),
            Operation::Route => !matches!(self, Self::Nominatim),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graphhopper" => Ok(Self::GraphHopper),
            "nominatim" => Ok(Self::Nominatim),
            "osrm" => Ok(Self::Osrm),
            "estimate" | "great-circle" => Ok(Self::GreatCircle),
            _ => Err(()),
        }
    }
}

/// Parse a comma-separated provider list given for `field`.
pub(crate) fn parse_provider_list(
    raw: &str,
    field: &'static str,
    operation: Operation,
) -> Result<Vec<ProviderKind>, CliError> {
    let mut kinds = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let kind = ProviderKind::from_str(name).map_err(|()| CliError::UnknownProvider {
            field,
            name: name.to_owned(),
        })?;
        if !kind.supports(operation) {
            return Err(CliError::UnsupportedProvider {
                field,
                provider: kind.name(),
                operation,
            });
        }
        kinds.push(kind);
    }
    if kinds.is_empty() {
        return Err(CliError::EmptyProviderList { field });
    }
    Ok(kinds)
}

/// Geocoders used when none are configured.
pub(crate) fn default_geocoders(has_graphhopper_key: bool) -> Vec<ProviderKind> {
    if has_graphhopper_key {
        vec![ProviderKind::GraphHopper, ProviderKind::Nominatim]
    } else {
        vec![ProviderKind::Nominatim]
    }
}

/// Routers used when none are configured.
pub(crate) fn default_routers(has_graphhopper_key: bool) -> Vec<ProviderKind> {
    let mut routers = vec![ProviderKind::Osrm, ProviderKind::GreatCircle];
    if has_graphhopper_key {
        routers.insert(0, ProviderKind::GraphHopper);
    }
    routers
}

/// Endpoint overrides and engine tuning merged from every configuration
/// layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProviderSettings {
    pub(crate) graphhopper_key: Option<String>,
    pub(crate) graphhopper_url: Option<String>,
    pub(crate) nominatim_url: Option<String>,
    pub(crate) osrm_url: Option<String>,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) timeout_secs: Option<u64>,
}

impl ProviderSettings {
    pub(crate) fn has_graphhopper_key(&self) -> bool {
        self.graphhopper_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Fail early when GraphHopper is selected without a key.
    pub(crate) fn require_graphhopper_key(
        &self,
        selected: &[ProviderKind],
        env: &'static str,
    ) -> Result<(), CliError> {
        if selected.contains(&ProviderKind::GraphHopper) && !self.has_graphhopper_key() {
            return Err(CliError::MissingArgument {
                field: ARG_GRAPHHOPPER_KEY,
                env,
            });
        }
        Ok(())
    }

    fn http_config(&self, kind: ProviderKind) -> HttpProviderConfig {
        let (url, default_url) = match kind {
            ProviderKind::GraphHopper => (&self.graphhopper_url, GRAPHHOPPER_BASE_URL),
            ProviderKind::Nominatim => (&self.nominatim_url, NOMINATIM_BASE_URL),
            ProviderKind::Osrm | ProviderKind::GreatCircle => (&self.osrm_url, OSRM_BASE_URL),
        };
        let config = HttpProviderConfig::new(url.as_deref().unwrap_or(default_url));
        match (kind, self.graphhopper_key.as_deref()) {
            (ProviderKind::GraphHopper, Some(key)) => config.with_credential(key),
            _ => config,
        }
    }

    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(attempts) = self.max_attempts {
            config = config.with_retry(RetryPolicy::default().with_max_attempts(attempts));
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_default_deadline(Duration::from_secs(secs));
        }
        config
    }
}

/// Everything needed to assemble an engine for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EnginePlan {
    pub(crate) geocoders: Vec<ProviderKind>,
    pub(crate) routers: Vec<ProviderKind>,
    pub(crate) settings: ProviderSettings,
}

/// Builds an engine for the current invocation.
pub(crate) trait EngineFactory {
    fn build(&self, plan: &EnginePlan) -> Result<Engine, CliError>;
}

/// Factory constructing the real HTTP adapters.
pub(crate) struct HttpEngineFactory;

impl EngineFactory for HttpEngineFactory {
    fn build(&self, plan: &EnginePlan) -> Result<Engine, CliError> {
        let settings = &plan.settings;
        let mut builder = EngineBuilder::new(settings.engine_config());
        let mut graphhopper = None;

        for &kind in &plan.geocoders {
            builder = match kind {
                ProviderKind::GraphHopper => {
                    builder.with_shared_geocoder(shared_graphhopper(&mut graphhopper, settings)?)
                }
                ProviderKind::Nominatim => builder.with_geocoder(
                    NominatimProvider::with_config(&settings.http_config(kind))
                        .map_err(build_error(kind))?,
                ),
                ProviderKind::Osrm | ProviderKind::GreatCircle => {
                    return Err(unsupported(kind, Operation::Geocode));
                }
            };
        }

        for &kind in &plan.routers {
            builder = match kind {
                ProviderKind::GraphHopper => {
                    builder.with_shared_router(shared_graphhopper(&mut graphhopper, settings)?)
                }
                ProviderKind::Osrm => builder.with_router(
                    OsrmProvider::with_config(&settings.http_config(kind))
                        .map_err(build_error(kind))?,
                ),
                ProviderKind::GreatCircle => builder.with_router(GreatCircleEstimator::default()),
                ProviderKind::Nominatim => return Err(unsupported(kind, Operation::Route)),
            };
        }

        let engine = builder.build()?;
        log::debug!(
            "engine ready: geocoders {:?}, routers {:?}",
            engine.geocoder_names(),
            engine.router_names()
        );
        Ok(engine)
    }
}

/// One GraphHopper client serves both operations.
fn shared_graphhopper(
    slot: &mut Option<Arc<GraphHopperProvider>>,
    settings: &ProviderSettings,
) -> Result<Arc<GraphHopperProvider>, CliError> {
    if let Some(existing) = slot {
        return Ok(Arc::clone(existing));
    }
    let provider = GraphHopperProvider::with_config(&settings.http_config(ProviderKind::GraphHopper))
        .map_err(build_error(ProviderKind::GraphHopper))?;
    let shared = Arc::new(provider);
    *slot = Some(Arc::clone(&shared));
    Ok(shared)
}

fn build_error(kind: ProviderKind) -> impl FnOnce(ProviderBuildError) -> CliError {
    move |source| CliError::BuildProvider {
        provider: kind.name(),
        source,
    }
}

const fn unsupported(kind: ProviderKind, operation: Operation) -> CliError {
    CliError::UnsupportedProvider {
        field: match operation {
            Operation::Geocode => crate::ARG_GEOCODERS,
            Operation::Route => crate::ARG_ROUTERS,
        },
        provider: kind.name(),
        operation,
    }
}
