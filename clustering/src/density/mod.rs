use std::fmt;
use std::fmt::Display;

use common::types::config::AlgorithmConfig;
use linfa::traits::Transformer;
use linfa::ParamGuard;
use ndarray::ArrayView2;

pub mod dbscan;
pub mod hdbscan;

use hdbscan::{Hdbscan, HdbscanError};

/// A density based clustering algorithm run on one pool of passengers. Returns one local label
/// per row of `points`, `None` meaning noise. Labels only have to be consistent within one call.
pub trait DensityClusterer: Send + Sync {
    fn cluster(
        &self,
        points: ArrayView2<f64>,
        min_cluster_size: usize,
    ) -> Result<Vec<Option<usize>>, ClusterError>;

    fn name(&self) -> &'static str;
}

pub fn from_config(config: &AlgorithmConfig) -> Box<dyn DensityClusterer> {
    match config {
        AlgorithmConfig::Hdbscan { min_samples, allow_single_cluster } => Box::new(HdbscanClusterer {
            min_samples: *min_samples,
            allow_single_cluster: *allow_single_cluster,
        }),
        AlgorithmConfig::Dbscan { tolerance } => Box::new(DbscanClusterer { tolerance: *tolerance }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HdbscanClusterer {
    pub min_samples: Option<usize>,
    pub allow_single_cluster: bool,
}

impl Default for HdbscanClusterer {
    fn default() -> Self {
        Self { min_samples: None, allow_single_cluster: true }
    }
}

impl DensityClusterer for HdbscanClusterer {
    fn cluster(
        &self,
        points: ArrayView2<f64>,
        min_cluster_size: usize,
    ) -> Result<Vec<Option<usize>>, ClusterError> {
        let mut params = Hdbscan::params(min_cluster_size)
            .allow_single_cluster(self.allow_single_cluster);
        if let Some(min_samples) = self.min_samples {
            params = params.min_samples(min_samples);
        }

        let labels = params.check()?.transform(&points)?;
        Ok(labels.to_vec())
    }

    fn name(&self) -> &'static str {
        "hdbscan"
    }
}

/// DBSCAN with `min_points` set to the active min_cluster_size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbscanClusterer {
    pub tolerance: f64,
}

impl DensityClusterer for DbscanClusterer {
    fn cluster(
        &self,
        points: ArrayView2<f64>,
        min_cluster_size: usize,
    ) -> Result<Vec<Option<usize>>, ClusterError> {
        Ok(dbscan::cluster(points, min_cluster_size, self.tolerance)?)
    }

    fn name(&self) -> &'static str {
        "dbscan"
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClusterError {
    Hdbscan(#[from] HdbscanError),
    Dbscan(#[from] linfa_clustering::DbscanParamsError),
}

impl Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            ClusterError::Hdbscan(err) => err,
            ClusterError::Dbscan(err) => err,
        };
        write!(f, "{}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_from_config() {
        let hdbscan = from_config(&AlgorithmConfig::default());
        let dbscan = from_config(&AlgorithmConfig::Dbscan { tolerance: 0.5 });

        assert_eq!(hdbscan.name(), "hdbscan");
        assert_eq!(dbscan.name(), "dbscan");
    }

    #[test]
    fn test_clusterers_agree_on_an_obvious_group() {
        let mut points = Array2::zeros((6, 2));
        for i in 0..6 {
            points[[i, 0]] = 0.01 * i as f64;
        }

        for clusterer in [from_config(&AlgorithmConfig::default()), from_config(&AlgorithmConfig::Dbscan { tolerance: 0.5 })] {
            let labels = clusterer.cluster(points.view(), 6).unwrap();
            assert!(labels.iter().all(|&label| label == Some(0)), "{}", clusterer.name());
        }
    }

    #[test]
    fn test_invalid_min_cluster_size() {
        let points = Array2::zeros((3, 2));
        let result = HdbscanClusterer::default().cluster(points.view(), 1);
        assert!(matches!(result, Err(ClusterError::Hdbscan(HdbscanError::InvalidMinClusterSize(1)))));
    }
}
