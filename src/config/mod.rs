mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that participate in config resolution.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
}

/// Final resolved configuration: CLI arguments overridden by TOML values
/// where present.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
}

impl AppConfig {
    pub fn resolve(cli: CliConfig, file: Option<FileConfig>) -> Result<AppConfig> {
        let file = file.unwrap_or_default();

        let logging_level = match file.logging_level {
            Some(value) => match RequestsLoggingLevel::from_str(&value, true) {
                Ok(level) => level,
                Err(_) => bail!("Invalid logging_level in config file: {}", value),
            },
            None => cli.logging_level,
        };

        Ok(AppConfig {
            db_path: file.db_path.map(PathBuf::from).unwrap_or(cli.db_path),
            port: file.port.unwrap_or(cli.port),
            logging_level,
        })
    }
}
