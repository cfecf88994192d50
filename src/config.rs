use std::fmt;
use std::fmt::Display;
use std::fs::File;
use std::path::Path;

use common::types::config::Config;
use common::types::errors::InvalidConfigError;
use log::info;

use crate::bootstrap_config::BootstrapConfig;

/// Reads the YAML config, applies the command line overrides and validates the result.
pub(super) fn load_config(bootstrap_config: &BootstrapConfig) -> Result<Config, ConfigError> {
    let path = Path::new(&bootstrap_config.config_file);

    let config_file = File::open(path)?;
    let mut config: Config = serde_yml::from_reader(config_file)?;

    if let Some(input_path) = &bootstrap_config.input {
        let Config::Version1 { input, .. } = &mut config;
        input.path = input_path.clone();
    }

    config.validate()?;

    info!(target: "main", "Config read successfully from '{}'", path.display());

    Ok(config)
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    IO(#[from] std::io::Error),
    Yaml(#[from] serde_yml::Error),
    Invalid(#[from] InvalidConfigError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err: &dyn Display = match self {
            ConfigError::IO(err) => err,
            ConfigError::Yaml(err) => err,
            ConfigError::Invalid(err) => err,
        };
        write!(f, "{}", err)
    }
}
