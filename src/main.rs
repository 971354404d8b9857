//! Flowsmith CLI entry point.

use clap::Parser;

use flowsmith::cli::{handle_error, Cli, Commands};
use flowsmith::infrastructure::config::ConfigLoader;
use flowsmith::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => flowsmith::cli::commands::init::execute(args, cli.json).await,
        Commands::Run(args) => {
            flowsmith::cli::commands::run::execute(args, &config, cli.json).await
        }
        Commands::Status => flowsmith::cli::commands::status::execute(&config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
