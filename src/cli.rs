//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::config::StaticConfig;
use crate::errors::{PresenceError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

/// Presence Tracker - log how present you were each hour
#[derive(Parser, Debug)]
#[command(name = "presence-tracker")]
#[command(version)]
#[command(about = "Hourly presence tracker backend", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

/// Write the default configuration as TOML.
pub fn generate_config(output_path: Option<&str>, force: bool) -> Result<String> {
    let path = output_path.unwrap_or(DEFAULT_SAMPLE_PATH);

    if std::path::Path::new(path).exists() && !force {
        return Err(PresenceError::file_operation(format!(
            "{} already exists, use --force to overwrite",
            path
        )));
    }

    StaticConfig::default()
        .save_to_file(path)
        .map_err(|e| PresenceError::file_operation(format!("Failed to write {}: {}", path, e)))?;
    Ok(path.to_string())
}
