//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use vfrtraffic::config::ConfigError;
use vfrtraffic::ground::LoadError;
use vfrtraffic::traffic::TrafficError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(ConfigError),
    /// Invalid command-line arguments
    InvalidArgument(String),
    /// Ground network could not be loaded
    Network(LoadError),
    /// Airport activation or traffic generation failed
    Traffic(TrafficError),
    /// Config file already exists and `--force` was not given
    AlreadyExists(PathBuf),
    /// Failed to install the Ctrl+C handler
    SignalHandler(String),
    /// Failed to write JSON output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value in the config file, or regenerate it with:");
                eprintln!("  vfrtraffic init --force");
            }
            CliError::AlreadyExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with defaults.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Network(e) => write!(f, "Ground network error: {}", e),
            CliError::Traffic(e) => write!(f, "Traffic error: {}", e),
            CliError::AlreadyExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Network(e) => Some(e),
            CliError::Traffic(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        CliError::Network(e)
    }
}

impl From<TrafficError> for CliError {
    fn from(e: TrafficError) -> Self {
        CliError::Traffic(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
