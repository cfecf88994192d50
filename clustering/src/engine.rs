use std::collections::BTreeMap;

use common::types::config::{validate_min_cluster_size_sequence, ClusteringConfig};
use common::types::errors::InvalidConfigError;
use log::{debug, info};
use rayon::prelude::*;

use crate::density::{self, ClusterError, DensityClusterer};
use crate::features::{feature_matrix, PassengerInstance};
use crate::merge::{merge_windows, Labeling};
use crate::windows::TimeWindow;

/// A group of passengers accepted as a cluster, with the threshold it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedCluster {
    pub members: Vec<usize>,
    pub min_cluster_size: usize,
}

/// The result of clustering one window. `members` and `noise` hold passenger indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClustering {
    pub window_index: usize,
    pub clusters: Vec<CommittedCluster>,
    pub noise: Vec<usize>,
}

// The passengers not yet committed to a cluster, and the position in the threshold sequence
// they are clustered at next.
enum RelaxationState {
    Pool { pool: Vec<usize>, step: usize },
    Done { noise: Vec<usize> },
}

/// Runs the progressive relaxation: every window is clustered with the strictest
/// min_cluster_size first, accepted clusters are taken out of the pool and the rest is clustered
/// again with the next, looser threshold.
pub struct ClusterEngine {
    clusterer: Box<dyn DensityClusterer>,
    thresholds: Vec<usize>,
    max_cluster_size: Option<usize>,
}

impl ClusterEngine {
    pub fn new(
        clusterer: Box<dyn DensityClusterer>,
        thresholds: Vec<usize>,
        max_cluster_size: Option<usize>,
    ) -> Result<Self, InvalidConfigError> {
        validate_min_cluster_size_sequence(&thresholds)?;
        if let Some(max_cluster_size) = max_cluster_size {
            if max_cluster_size < thresholds[0] {
                return Err(InvalidConfigError::MaxClusterSizeTooSmall {
                    max_cluster_size,
                    min_cluster_size: thresholds[0],
                });
            }
        }
        Ok(Self { clusterer, thresholds, max_cluster_size })
    }

    pub fn from_config(config: &ClusteringConfig) -> Result<Self, InvalidConfigError> {
        config.algorithm.validate()?;
        Self::new(
            density::from_config(&config.algorithm),
            config.min_cluster_size_sequence.clone(),
            config.max_cluster_size,
        )
    }

    pub fn thresholds(&self) -> &[usize] {
        &self.thresholds
    }

    pub fn cluster_window(
        &self,
        window: &TimeWindow,
        passengers: &[PassengerInstance],
    ) -> Result<WindowClustering, ClusterError> {
        let mut clusters = Vec::new();

        let mut state = if window.len() < 2 {
            debug!(target: "engine", "Window {} has {} passengers, nothing to cluster", window.index, window.len());
            RelaxationState::Done { noise: window.members.clone() }
        } else {
            RelaxationState::Pool { pool: window.members.clone(), step: 0 }
        };

        let noise = loop {
            state = match state {
                RelaxationState::Done { noise } => break noise,
                RelaxationState::Pool { pool, step } if step >= self.thresholds.len() || pool.is_empty() => {
                    RelaxationState::Done { noise: pool }
                }
                RelaxationState::Pool { pool, step } => {
                    let threshold = self.thresholds[step];
                    let pool = if pool.len() < threshold {
                        pool
                    } else {
                        self.relax(window.index, passengers, pool, threshold, &mut clusters)?
                    };
                    RelaxationState::Pool { pool, step: step + 1 }
                }
            };
        };

        Ok(WindowClustering { window_index: window.index, clusters, noise })
    }

    /// Clusters the pool at one threshold, commits the acceptable clusters and returns what is
    /// left for the next threshold.
    fn relax(
        &self,
        window_index: usize,
        passengers: &[PassengerInstance],
        pool: Vec<usize>,
        threshold: usize,
        clusters: &mut Vec<CommittedCluster>,
    ) -> Result<Vec<usize>, ClusterError> {
        let points = feature_matrix(passengers, &pool);
        let labels = self.clusterer.cluster(points.view(), threshold)?;

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut remaining = Vec::new();
        for (&passenger, label) in pool.iter().zip(labels) {
            match label {
                Some(label) => groups.entry(label).or_default().push(passenger),
                None => remaining.push(passenger),
            }
        }

        let min_size = threshold.max(2);
        for (_, members) in groups {
            if members.len() < min_size {
                remaining.extend(members);
            } else if self.max_cluster_size.is_some_and(|max| members.len() > max) {
                debug!(
                    target: "engine",
                    "Window {}: discarding supercluster of {} passengers at min_cluster_size {}",
                    window_index, members.len(), threshold,
                );
                remaining.extend(members);
            } else {
                clusters.push(CommittedCluster { members, min_cluster_size: threshold });
            }
        }

        remaining.sort_unstable();
        Ok(remaining)
    }

    pub fn run(
        &self,
        windows: &[TimeWindow],
        passengers: &[PassengerInstance],
    ) -> Result<Labeling, ClusterError> {
        self.run_with(windows, passengers, |_| {})
    }

    /// Clusters all windows in parallel. `on_window_done` is called once per finished window, in
    /// no particular order. The result does not depend on the number of threads.
    pub fn run_with<F>(
        &self,
        windows: &[TimeWindow],
        passengers: &[PassengerInstance],
        on_window_done: F,
    ) -> Result<Labeling, ClusterError>
    where
        F: Fn(&WindowClustering) + Sync,
    {
        let results = windows.par_iter()
            .map(|window| {
                let result = self.cluster_window(window, passengers)?;
                on_window_done(&result);
                Ok(result)
            })
            .collect::<Result<Vec<_>, ClusterError>>()?;

        let labeling = merge_windows(results, passengers.len());

        info!(
            target: "engine",
            "Clustered {} passengers in {} windows into {} clusters with {} ({} passengers left as noise)",
            passengers.len(), windows.len(), labeling.clusters.len(), self.clusterer.name(), labeling.noise_count(),
        );

        Ok(labeling)
    }
}
