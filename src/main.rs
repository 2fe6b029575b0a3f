use std::process::ExitCode;

use bindzone::cli::args::Args;
use clap::Parser;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();

    // Construct the configuration.
    let config = match args.load_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("bindzone couldn't be configured: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = bindzone::log::launch(&config.logging) {
        eprintln!("bindzone couldn't set up logging: {error}");
        return ExitCode::FAILURE;
    }

    match args.execute(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
