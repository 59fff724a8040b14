//! Optimise command implementation for the Itinera CLI.

use std::io::{BufReader, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveTime;
use clap::Parser;
use itinera_core::time::parse_clock_time;
use itinera_core::{
    CacheConfig, Itinerary, ItineraryOptimizer, OptimizerConfig, Preferences, TransportMode,
    TravelTimeProvider,
};
use itinera_data::routing::{
    HttpTravelTimeProvider, HttpTravelTimeProviderConfig, StraightLineTravelTimeProvider,
};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::fs::{file_is_file, open_utf8_file, write_utf8_file};
use crate::{
    ARG_CACHE_TTL_SECS, ARG_ITINERARY, ARG_OSRM_BASE_URL, ARG_OUTPUT, ARG_PREFERENCES,
    ARG_REQUEST_TIMEOUT_SECS, ARG_START_TIME, ARG_TRANSPORT_MODE, CliError, ENV_ITINERARY,
};

/// CLI arguments for the `optimize` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Reorder the activities of every day in an itinerary to cut \
                 travel time while honouring opening hours, preferred times \
                 and priorities. Travel times come from an OSRM instance when \
                 a base URL is configured and from straight-line estimates \
                 otherwise.",
    about = "Optimise the daily routes of an itinerary"
)]
#[ortho_config(prefix = "ITINERA")]
pub(crate) struct OptimizeArgs {
    /// Path to a JSON file containing the itinerary.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) itinerary_path: Option<Utf8PathBuf>,
    /// Path to a JSON file containing traveller preferences.
    #[arg(long = ARG_PREFERENCES, value_name = "path")]
    #[serde(default)]
    pub(crate) preferences: Option<Utf8PathBuf>,
    /// Transport mode for every leg; overrides the preferences file.
    #[arg(long = ARG_TRANSPORT_MODE, value_name = "mode")]
    #[serde(default)]
    pub(crate) transport_mode: Option<TransportMode>,
    /// Day start time as `HH:MM`; overrides the preferences file.
    #[arg(long = ARG_START_TIME, value_name = "HH:MM")]
    #[serde(default)]
    pub(crate) start_time: Option<String>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// How long fetched travel-time matrices stay valid.
    #[arg(long = ARG_CACHE_TTL_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) cache_ttl_secs: Option<u64>,
    /// Upper bound on a single routing request.
    #[arg(long = ARG_REQUEST_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) request_timeout_secs: Option<u64>,
    /// Write the optimised itinerary here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl OptimizeArgs {
    pub(crate) fn into_config(self) -> Result<OptimizeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        OptimizeConfig::try_from(merged)
    }
}

/// Where travel times come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RoutingBackend {
    /// OSRM Table API at `base_url`.
    Osrm { base_url: String },
    /// Great-circle estimates.
    StraightLine,
}

/// Resolved `optimize` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptimizeConfig {
    pub(crate) itinerary_path: Utf8PathBuf,
    pub(crate) preferences_path: Option<Utf8PathBuf>,
    pub(crate) transport_mode: Option<TransportMode>,
    pub(crate) start_time: Option<NaiveTime>,
    pub(crate) routing: RoutingBackend,
    pub(crate) cache_ttl: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl OptimizeConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.itinerary_path, ARG_ITINERARY)?;
        if let Some(path) = &self.preferences_path {
            Self::require_existing(path, ARG_PREFERENCES)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Core optimiser settings for this run.
    pub(crate) fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig::default()
            .with_cache_ttl(self.cache_ttl)
            .with_request_timeout(self.request_timeout)
    }

    /// Preferences from the file, with CLI values taking precedence.
    pub(crate) fn apply_overrides(&self, preferences: Preferences) -> Preferences {
        Preferences {
            transport_mode: self.transport_mode.or(preferences.transport_mode),
            start_time: self.start_time.or(preferences.start_time),
        }
    }
}

fn seconds_or(
    value: Option<u64>,
    default: Duration,
    field: &'static str,
) -> Result<Duration, CliError> {
    match value {
        None => Ok(default),
        Some(0) => Err(CliError::ZeroDuration { field }),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}

impl TryFrom<OptimizeArgs> for OptimizeConfig {
    type Error = CliError;

    fn try_from(args: OptimizeArgs) -> Result<Self, Self::Error> {
        let itinerary_path = args.itinerary_path.ok_or(CliError::MissingArgument {
            field: ARG_ITINERARY,
            env: ENV_ITINERARY,
        })?;
        let start_time = args
            .start_time
            .as_deref()
            .map(parse_clock_time)
            .transpose()
            .map_err(|source| CliError::InvalidTime {
                field: ARG_START_TIME,
                source,
            })?;

        let cache_defaults = CacheConfig::default();
        let cache_ttl = seconds_or(args.cache_ttl_secs, cache_defaults.ttl, ARG_CACHE_TTL_SECS)?;
        let request_timeout = seconds_or(
            args.request_timeout_secs,
            cache_defaults.request_timeout,
            ARG_REQUEST_TIMEOUT_SECS,
        )?;
        let routing = args
            .osrm_base_url
            .map_or(RoutingBackend::StraightLine, |base_url| RoutingBackend::Osrm {
                base_url,
            });

        Ok(Self {
            itinerary_path,
            preferences_path: args.preferences,
            transport_mode: args.transport_mode,
            start_time,
            routing,
            cache_ttl,
            request_timeout,
            output: args.output,
        })
    }
}

/// Builds the travel-time provider for the current invocation.
pub(crate) trait ProviderFactory {
    fn build(&self, config: &OptimizeConfig) -> Result<Box<dyn TravelTimeProvider>, CliError>;
}

pub(crate) struct DefaultProviderFactory;

impl ProviderFactory for DefaultProviderFactory {
    fn build(&self, config: &OptimizeConfig) -> Result<Box<dyn TravelTimeProvider>, CliError> {
        match &config.routing {
            RoutingBackend::Osrm { base_url } => {
                let provider_config = HttpTravelTimeProviderConfig::new(base_url.clone())
                    .with_timeout(config.request_timeout);
                let provider =
                    HttpTravelTimeProvider::with_config(provider_config).map_err(|source| {
                        CliError::BuildTravelTimeProvider {
                            base_url: base_url.clone(),
                            source,
                        }
                    })?;
                info!("routing through OSRM at {base_url}");
                Ok(Box::new(provider))
            }
            RoutingBackend::StraightLine => {
                info!("no OSRM base URL configured; estimating travel from straight-line distance");
                Ok(Box::new(StraightLineTravelTimeProvider::default()))
            }
        }
    }
}

pub(crate) fn run_optimize(args: OptimizeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_optimize_with(args, &DefaultProviderFactory, &mut stdout)
}

pub(crate) fn run_optimize_with(
    args: OptimizeArgs,
    factory: &dyn ProviderFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_optimize_config(args)?;
    let optimised = execute_optimize(&config, factory)?;
    let mut payload =
        serde_json::to_string_pretty(&optimised).map_err(CliError::SerialiseOutput)?;
    payload.push('\n');

    if let Some(path) = &config.output {
        write_utf8_file(path, payload.as_bytes()).map_err(CliError::WriteOutput)?;
        info!("wrote optimised itinerary to {path}");
        return Ok(());
    }
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)
}

fn resolve_optimize_config(args: OptimizeArgs) -> Result<OptimizeConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_optimize(
    config: &OptimizeConfig,
    factory: &dyn ProviderFactory,
) -> Result<Itinerary, CliError> {
    let itinerary: Itinerary = load_json(&config.itinerary_path, ARG_ITINERARY)?;
    let file_preferences: Preferences = config
        .preferences_path
        .as_deref()
        .map(|path| load_json(path, ARG_PREFERENCES))
        .transpose()?
        .unwrap_or_default();
    let preferences = config.apply_overrides(file_preferences);

    let provider = factory.build(config)?;
    let optimizer = ItineraryOptimizer::with_provider(provider, config.optimizer_config());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    info!("optimising {} days", itinerary.days.len());
    Ok(runtime.block_on(optimizer.optimize_itinerary(&itinerary, &preferences)))
}

/// Loads a JSON document from disk; `field` names the flag in errors.
pub(crate) fn load_json<T: DeserializeOwned>(
    path: &Utf8Path,
    field: &'static str,
) -> Result<T, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenInput {
        field,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        field,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<OptimizeConfig, CliError> {
    let merged = OptimizeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    OptimizeConfig::try_from(merged)
}
