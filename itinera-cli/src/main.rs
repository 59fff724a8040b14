//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use env_logger::Env;
use itinera_cli::CliError;
use log::error;

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    match itinera_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}
