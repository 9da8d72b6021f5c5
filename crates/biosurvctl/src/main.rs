//! biosurvctl entry point

use clap::Parser;
use tracing::debug;

use biosurv_common::{logging, BiosurvConfig};
use biosurvctl::cli::Cli;
use biosurvctl::commands;
use biosurvctl::context::AppContext;
use biosurvctl::errors::{exit_code_for, EXIT_CONFIG};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match BiosurvConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if cli.verbose {
        config.log.level = "debug".to_string();
    }
    logging::init(&config.log);
    debug!("biosurvctl {} starting", biosurvctl::cli::VERSION);

    let ctx = AppContext::new(config);
    if let Err(e) = commands::run(&ctx, cli.command).await {
        if cli.verbose {
            eprintln!("error: {:#}", e);
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code_for(&e));
    }
}
