//! Command-line interface for the Itinera route engine.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod optimize;

pub use error::CliError;

use optimize::{OptimizeArgs, run_optimize};

const ARG_ITINERARY: &str = "itinerary";
const ARG_PREFERENCES: &str = "preferences";
const ARG_TRANSPORT_MODE: &str = "transport-mode";
const ARG_START_TIME: &str = "start-time";
const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
const ARG_CACHE_TTL_SECS: &str = "cache-ttl-secs";
const ARG_REQUEST_TIMEOUT_SECS: &str = "request-timeout-secs";
const ARG_OUTPUT: &str = "output";
const ENV_ITINERARY: &str = "ITINERA_CMDS_OPTIMIZE_ITINERARY_PATH";

/// Run the Itinera CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, inputs
/// cannot be read, or the result cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Optimize(args) => run_optimize(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "itinera",
    about = "Route optimisation for day-by-day travel itineraries",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reorder and schedule the activities of each itinerary day.
    Optimize(OptimizeArgs),
}

#[cfg(test)]
mod tests;
