use std::collections::BTreeMap;

use common::types::{label_to_i64, ClusterId};
use polars::df;
use polars::error::PolarsError;
use polars::frame::DataFrame;

use crate::engine::WindowClustering;
use crate::features::PassengerInstance;

/// A cluster with its global id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: ClusterId,
    pub window: usize,
    pub min_cluster_size: usize,
    pub members: Vec<usize>,
}

/// Global cluster labels for every passenger instance. `clusters[i].id == ClusterId(i)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeling {
    pub labels: Vec<Option<ClusterId>>,
    pub clusters: Vec<Cluster>,
}

/// Gives every window its own block of labels. Blocks follow the window order, so the labels of
/// window `w` start after all clusters of windows `0..w`.
pub fn merge_windows(mut windows: Vec<WindowClustering>, passenger_count: usize) -> Labeling {
    windows.sort_by_key(|window| window.window_index);

    let mut labels = vec![None; passenger_count];
    let mut clusters = Vec::with_capacity(windows.iter().map(|w| w.clusters.len()).sum());

    for window in windows {
        for committed in window.clusters {
            let id = ClusterId(clusters.len() as u32);
            for &member in &committed.members {
                labels[member] = Some(id);
            }
            clusters.push(Cluster {
                id,
                window: window.window_index,
                min_cluster_size: committed.min_cluster_size,
                members: committed.members,
            });
        }
    }

    Labeling { labels, clusters }
}

impl Labeling {
    pub fn clustered_count(&self) -> usize {
        self.labels.iter().filter(|label| label.is_some()).count()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.len() - self.clustered_count()
    }

    /// One label per trip: the most frequent label among the trip's passengers, noise only if
    /// all of them are noise. Ties go to the smaller label.
    pub fn trip_labels(&self, passengers: &[PassengerInstance], trip_count: usize) -> Vec<Option<ClusterId>> {
        let mut votes: Vec<BTreeMap<ClusterId, usize>> = vec![BTreeMap::new(); trip_count];
        for (passenger, label) in passengers.iter().zip(&self.labels) {
            if let Some(label) = label {
                *votes[passenger.trip.index()].entry(*label).or_default() += 1;
            }
        }

        votes.into_iter()
            .map(|counts| {
                counts.into_iter()
                    .min_by(|(a_label, a_count), (b_label, b_count)| {
                        b_count.cmp(a_count).then(a_label.cmp(b_label))
                    })
                    .map(|(label, _)| label)
            })
            .collect()
    }

    /// One row per passenger instance with the global label (-1 for noise).
    pub fn to_frame(&self, passengers: &[PassengerInstance]) -> Result<DataFrame, PolarsError> {
        let passenger: Vec<u32> = (0..passengers.len() as u32).collect();
        let trip_id: Vec<u32> = passengers.iter().map(|p| p.trip.0).collect();
        let cluster_label: Vec<i64> = self.labels.iter().map(|&label| label_to_i64(label)).collect();

        df!(
            "passenger" => passenger,
            "trip_id" => trip_id,
            "cluster_label" => cluster_label,
        )
    }
}

pub fn trip_labels_frame(labels: &[Option<ClusterId>]) -> Result<DataFrame, PolarsError> {
    df!(
        "trip_id" => (0..labels.len() as u32).collect::<Vec<_>>(),
        "cluster_label" => labels.iter().map(|&label| label_to_i64(label)).collect::<Vec<_>>(),
    )
}
