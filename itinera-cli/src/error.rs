//! Failures of the `itinera` command.
//!
//! Variants box nothing large: every helper returns `Result<_, CliError>`
//! and `clippy::result_large_err` is denied across the workspace.

use std::sync::Arc;

use camino::Utf8PathBuf;
use itinera_core::TimeParseError;
use itinera_data::routing::ProviderBuildError;
use thiserror::Error;

/// Everything that can stop `itinera optimize` before output is written.
#[derive(Debug, Error)]
pub enum CliError {
    /// Command-line parsing failed; `main` lets Clap print and exit.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Merging flags, `ITINERA_*` variables and config files failed.
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// No layer supplied a required value.
    #[error("no {field} given; pass it on the command line or set {env}")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// The configured start time is not `HH:MM`.
    #[error("invalid {field}: {source}")]
    InvalidTime {
        /// Flag name.
        field: &'static str,
        /// Parse failure.
        #[source]
        source: TimeParseError,
    },
    /// A duration option was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Flag name.
        field: &'static str,
    },
    /// An input path points at nothing.
    #[error("{field} {path:?} not found")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// An input path names a directory or other non-file.
    #[error("{field} {path:?} is not a regular file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Checking an input path failed.
    #[error("cannot inspect {field} {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// Opening an input JSON file failed.
    #[error("failed to open {field} at {path:?}: {source}")]
    OpenInput {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// An input JSON file could not be decoded.
    #[error("failed to parse {field} JSON at {path:?}: {source}")]
    ParseInput {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The OSRM client could not be built.
    #[error("cannot reach routing service at {base_url:?}: {source}")]
    BuildTravelTimeProvider {
        /// Base URL the client was built for.
        base_url: String,
        /// Underlying failure.
        #[source]
        source: ProviderBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Serialising the optimised itinerary failed.
    #[error("failed to serialise optimised itinerary: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the optimised itinerary failed.
    #[error("failed to write optimised itinerary: {0}")]
    WriteOutput(#[source] std::io::Error),
}
