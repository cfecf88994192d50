pub mod bootstrap_config;
mod config;
mod output;
mod pipeline;

use std::fmt::{Display, Formatter};

use bootstrap_config::BootstrapConfig;
use clustering::density::ClusterError;
use clustering::tuning::TuningError;
use common::types::errors::InvalidConfigError;
use common::util::logging;
use efficiency::EfficiencyError;
use ingest::IngestError;
use log::{error, info};
use polars::error::PolarsError;

use crate::config::load_config;
use crate::pipeline::run_pipeline;

fn main() {
    if let Err(err) = run() {
        error!(target: "main", "{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), VanpoolError> {
    let bootstrap_config = BootstrapConfig::read();

    logging::initialize_logging(bootstrap_config.log_level.clone().into());
    print_startup_message();

    let config = load_config(&bootstrap_config)?;

    run_pipeline(config, bootstrap_config.tune)
}

fn print_startup_message() {
    info!(target: "main", "vanpool {}: estimating shared ride efficiency from taxi trips", env!("CARGO_PKG_VERSION"));
}

#[derive(thiserror::Error, Debug)]
pub enum VanpoolError {
    Config(#[from] config::ConfigError),
    InvalidConfig(#[from] InvalidConfigError),
    Ingest(#[from] IngestError),
    Tuning(#[from] TuningError),
    Cluster(#[from] ClusterError),
    Efficiency(#[from] EfficiencyError),
    Polars(#[from] PolarsError),
}

impl Display for VanpoolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err: &dyn Display = match self {
            VanpoolError::Config(err) => err,
            VanpoolError::InvalidConfig(err) => err,
            VanpoolError::Ingest(err) => err,
            VanpoolError::Tuning(err) => err,
            VanpoolError::Cluster(err) => err,
            VanpoolError::Efficiency(err) => err,
            VanpoolError::Polars(err) => err,
        };
        let prefix = match self {
            VanpoolError::Config(_) => "Reading config file",
            VanpoolError::InvalidConfig(_) => "Checking configuration",
            VanpoolError::Ingest(_) => "Reading trips",
            VanpoolError::Tuning(_) => "Tuning time_scale",
            VanpoolError::Cluster(_) => "Clustering passengers",
            VanpoolError::Efficiency(_) => "Evaluating efficiency",
            VanpoolError::Polars(_) => "Writing results",
        };
        write!(f, "{}: {}", prefix, err)
    }
}
