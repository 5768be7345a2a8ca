//! Init command - write the default configuration file.

use std::path::{Path, PathBuf};

use clap::Args;
use vfrtraffic::config::{self, Config};

use crate::error::CliError;

/// Arguments for `vfrtraffic init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,

    /// Write to this path instead of ~/.vfrtraffic/config.ini
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Run the init command.
pub fn run(args: InitArgs) -> Result<(), CliError> {
    let path = match args.path {
        Some(path) => path,
        None => config::default_path()?,
    };
    write_default(&path, args.force)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to set the airport, runway, wind and traffic mix.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

/// Write the default config, refusing to overwrite unless forced.
fn write_default(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    Config::default().save_to(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_default_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vfr").join("config.ini");

        write_default(&path, false).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_write_default_respects_force() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[wind]\nspeed_kt = 20\n").unwrap();

        assert!(matches!(
            write_default(&path, false),
            Err(CliError::AlreadyExists(_))
        ));
        assert_eq!(Config::load_from(&path).unwrap().wind.speed_kt, 20.0);

        write_default(&path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
