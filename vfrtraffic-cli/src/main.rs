//! VFRTraffic CLI - Command-line interface
//!
//! Runs airport traffic simulations and inspects ground networks.
//!
//! # Commands
//!
//! - `init`  - write the default configuration file
//! - `run`   - fast-forward a traffic simulation
//! - `route` - find a taxi route through a ground network
//! - `check` - validate a ground network file

mod commands;
mod error;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vfrtraffic::config::Config;

use commands::{check, init, route, run};

#[derive(Parser)]
#[command(name = "vfrtraffic")]
#[command(version = vfrtraffic::VERSION)]
#[command(about = "Simulate VFR traffic pattern operations at an airport", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init(init::InitArgs),

    /// Run a traffic simulation
    Run(run::RunArgs),

    /// Find a taxi route through a ground network
    Route(route::RouteArgs),

    /// Validate a ground network file
    Check(check::CheckArgs),
}

fn main() {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Run(args) => args.config.clone(),
        _ => None,
    };
    init_logging(log_level(cli.verbose, config_path));

    let result = match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Run(args) => run::run(args),
        Commands::Route(args) => route::run(args),
        Commands::Check(args) => check::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}

/// Log level from `-v` flags, falling back to the config file.
fn log_level(verbose: u8, config_path: Option<PathBuf>) -> String {
    match verbose {
        0 => {
            let config = match config_path {
                Some(path) => Config::load_from(&path),
                None => Config::load(),
            };
            config
                .map(|c| c.logging.level)
                .unwrap_or_else(|_| vfrtraffic::config::DEFAULT_LOG_LEVEL.to_string())
        }
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Console logging on stderr so command output on stdout stays clean.
fn init_logging(level: String) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
