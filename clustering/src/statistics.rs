use chrono::NaiveDateTime;
use common::types::trip::Trip;
use common::types::ClusterId;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use polars::df;
use polars::error::PolarsError;
use polars::frame::DataFrame;

use crate::features::PassengerInstance;
use crate::merge::Labeling;

/// How far the members of one cluster are spread out. Distances are in distance units, times in
/// minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpread {
    pub id: ClusterId,
    pub size: usize,
    /// Root mean square distance of the pickups from their centroid.
    pub rmsd_pickup: f64,
    pub rmsd_dropoff: f64,
    /// Sample standard deviation of the pickup times.
    pub std_pickup_minutes: f64,
    /// `None` if fewer than two members have a dropoff time.
    pub std_dropoff_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStatistics {
    pub fraction_clustered: f64,
    pub clusters: Vec<ClusterSpread>,
}

impl ClusterStatistics {
    pub fn compute(labeling: &Labeling, passengers: &[PassengerInstance], trips: &[Trip]) -> Self {
        let fraction_clustered = if labeling.labels.is_empty() {
            0.0
        } else {
            labeling.clustered_count() as f64 / labeling.labels.len() as f64
        };

        let clusters = labeling.clusters.iter()
            .map(|cluster| {
                let members = cluster.members.iter().map(|&m| &passengers[m]).collect_vec();
                let pickup_times = members.iter().map(|p| p.pickup_time).collect_vec();
                let dropoff_times = members.iter()
                    .filter_map(|p| trips[p.trip.index()].dropoff_time)
                    .collect_vec();

                ClusterSpread {
                    id: cluster.id,
                    size: members.len(),
                    rmsd_pickup: rms_distance(members.iter().map(|p| p.pickup())),
                    rmsd_dropoff: rms_distance(members.iter().map(|p| p.dropoff())),
                    std_pickup_minutes: std_minutes(&pickup_times).unwrap_or(0.0),
                    std_dropoff_minutes: std_minutes(&dropoff_times),
                }
            })
            .collect();

        Self { fraction_clustered, clusters }
    }

    pub fn median_time_spread(&self) -> Option<f64> {
        median(self.clusters.iter().map(|c| c.std_pickup_minutes))
    }

    pub fn median_distance_spread(&self) -> Option<f64> {
        median(self.clusters.iter().map(|c| c.rmsd_pickup))
    }

    pub fn median_size(&self) -> Option<f64> {
        median(self.clusters.iter().map(|c| c.size as f64))
    }

    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        df!(
            "cluster_label" => self.clusters.iter().map(|c| c.id.0 as i64).collect_vec(),
            "size" => self.clusters.iter().map(|c| c.size as u32).collect_vec(),
            "rmsd_pickup" => self.clusters.iter().map(|c| c.rmsd_pickup).collect_vec(),
            "rmsd_dropoff" => self.clusters.iter().map(|c| c.rmsd_dropoff).collect_vec(),
            "std_pickup_minutes" => self.clusters.iter().map(|c| c.std_pickup_minutes).collect_vec(),
            "std_dropoff_minutes" => self.clusters.iter().map(|c| c.std_dropoff_minutes).collect_vec(),
        )
    }
}

fn rms_distance(points: impl Iterator<Item = (f64, f64)> + Clone) -> f64 {
    let count = points.clone().count();
    if count == 0 {
        return 0.0;
    }
    let (sum_x, sum_y) = points.clone().fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (center_x, center_y) = (sum_x / count as f64, sum_y / count as f64);

    let squared: f64 = points
        .map(|(x, y)| (x - center_x).powi(2) + (y - center_y).powi(2))
        .sum();
    (squared / count as f64).sqrt()
}

fn std_minutes(times: &[NaiveDateTime]) -> Option<f64> {
    let first = *times.first()?;
    if times.len() < 2 {
        return None;
    }
    let minutes = times.iter()
        .map(|&time| (time - first).num_milliseconds() as f64 / 60_000.0)
        .collect_vec();
    let mean = minutes.iter().sum::<f64>() / minutes.len() as f64;
    let variance = minutes.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / (minutes.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Median of the finite values, the mean of the two middle values for an even count.
fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let sorted = values
        .filter(|value| value.is_finite())
        .map(OrderedFloat)
        .sorted()
        .collect_vec();

    match sorted.len() {
        0 => None,
        len if len % 2 == 1 => Some(sorted[len / 2].0),
        len => Some((sorted[len / 2 - 1].0 + sorted[len / 2].0) / 2.0),
    }
}
