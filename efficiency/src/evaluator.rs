use std::fmt;
use std::fmt::Display;

use clustering::merge::Labeling;
use common::types::config::EfficiencyConfig;
use common::types::errors::InvalidConfigError;
use common::types::ClusterId;
use log::{info, warn};
use polars::df;
use polars::error::PolarsError;
use polars::frame::DataFrame;

/// Number of van trips needed to carry `passengers` with vans of `capacity` seats.
pub fn van_trips(passengers: usize, capacity: usize) -> usize {
    passengers.div_ceil(capacity)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyRecord {
    pub cluster: ClusterId,
    pub window: usize,
    pub min_cluster_size: usize,
    pub passengers: usize,
    pub van_trips: usize,
    /// This cluster's share of the packing ratio, `van_trips / observed_trips`.
    pub packing_ratio: f64,
}

/// Van trips needed for all clusters compared to the taxi trips that were observed.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyReport {
    pub records: Vec<EfficiencyRecord>,
    pub passengers: usize,
    pub van_trips: usize,
    pub observed_trips: usize,
    /// `van_trips / observed_trips`, the efficiency divided by the cost ratio alpha.
    pub packing_ratio: f64,
}

impl EfficiencyReport {
    pub fn efficiency(&self, alpha: f64) -> f64 {
        alpha * self.packing_ratio
    }

    /// Pooling can never need more van trips than there were taxi trips, nor zero van trips
    /// while passengers were clustered.
    pub fn is_degenerate(&self) -> bool {
        !(self.packing_ratio > 0.0 && self.packing_ratio <= 1.0)
    }

    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        df!(
            "cluster_label" => self.records.iter().map(|r| r.cluster.0 as i64).collect::<Vec<_>>(),
            "window" => self.records.iter().map(|r| r.window as u32).collect::<Vec<_>>(),
            "min_cluster_size" => self.records.iter().map(|r| r.min_cluster_size as u32).collect::<Vec<_>>(),
            "passengers" => self.records.iter().map(|r| r.passengers as u32).collect::<Vec<_>>(),
            "van_trips" => self.records.iter().map(|r| r.van_trips as u32).collect::<Vec<_>>(),
            "packing_ratio" => self.records.iter().map(|r| r.packing_ratio).collect::<Vec<_>>(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyEvaluator {
    van_capacity: usize,
}

impl EfficiencyEvaluator {
    pub fn new(van_capacity: usize) -> Result<Self, InvalidConfigError> {
        if van_capacity == 0 {
            return Err(InvalidConfigError::NonPositiveVanCapacity);
        }
        Ok(Self { van_capacity })
    }

    pub fn from_config(config: &EfficiencyConfig) -> Result<Self, InvalidConfigError> {
        Self::new(config.van_capacity)
    }

    pub fn van_capacity(&self) -> usize {
        self.van_capacity
    }

    /// `observed_trips` is the number of taxi trips the passengers came from. Clusters with a
    /// single passenger are not pooled and do not count.
    pub fn evaluate(&self, labeling: &Labeling, observed_trips: usize) -> Result<EfficiencyReport, EfficiencyError> {
        if observed_trips == 0 {
            return Err(EfficiencyError::NoObservedTrips);
        }

        let records: Vec<EfficiencyRecord> = labeling.clusters.iter()
            .filter(|cluster| cluster.members.len() >= 2)
            .map(|cluster| {
                let van_trips = van_trips(cluster.members.len(), self.van_capacity);
                EfficiencyRecord {
                    cluster: cluster.id,
                    window: cluster.window,
                    min_cluster_size: cluster.min_cluster_size,
                    passengers: cluster.members.len(),
                    van_trips,
                    packing_ratio: van_trips as f64 / observed_trips as f64,
                }
            })
            .collect();

        let passengers: usize = records.iter().map(|r| r.passengers).sum();
        let total_van_trips: usize = records.iter().map(|r| r.van_trips).sum();
        let report = EfficiencyReport {
            records,
            passengers,
            van_trips: total_van_trips,
            observed_trips,
            packing_ratio: total_van_trips as f64 / observed_trips as f64,
        };

        if report.is_degenerate() {
            warn!(
                target: "efficiency",
                "Degenerate packing ratio {:.4} ({} van trips for {} observed trips)",
                report.packing_ratio, report.van_trips, report.observed_trips,
            );
        }

        info!(
            target: "efficiency",
            "{} passengers in {} clusters need {} van trips, {} taxi trips observed (packing ratio {:.4})",
            report.passengers, report.records.len(), report.van_trips, report.observed_trips, report.packing_ratio,
        );

        Ok(report)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EfficiencyError {
    NoObservedTrips,
}

impl Display for EfficiencyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EfficiencyError::NoObservedTrips => {
                write!(f, "No taxi trips were observed, the packing ratio is undefined")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clustering::merge::Cluster;

    fn labeling(sizes: &[usize]) -> Labeling {
        let mut labels = Vec::new();
        let mut clusters = Vec::new();
        for (i, &size) in sizes.iter().enumerate() {
            let members: Vec<usize> = (labels.len()..labels.len() + size).collect();
            labels.extend(std::iter::repeat(Some(ClusterId(i as u32))).take(size));
            clusters.push(Cluster { id: ClusterId(i as u32), window: 0, min_cluster_size: 2, members });
        }
        Labeling { labels, clusters }
    }

    #[test]
    fn test_van_trips() {
        assert_eq!(van_trips(1, 6), 1);
        assert_eq!(van_trips(6, 6), 1);
        assert_eq!(van_trips(7, 6), 2);
        assert_eq!(van_trips(12, 6), 2);
        assert_eq!(van_trips(0, 6), 0);
    }

    #[test]
    fn test_seven_passengers_need_two_vans() {
        let evaluator = EfficiencyEvaluator::new(6).unwrap();

        let report = evaluator.evaluate(&labeling(&[7]), 7).unwrap();

        assert_eq!(report.van_trips, 2);
        assert_eq!(report.passengers, 7);
        assert_eq!(report.packing_ratio, 2.0 / 7.0);
        assert!(!report.is_degenerate());
    }

    #[test]
    fn test_aggregate_over_clusters() {
        let evaluator = EfficiencyEvaluator::new(6).unwrap();

        let report = evaluator.evaluate(&labeling(&[2, 6, 13]), 20).unwrap();

        assert_eq!(report.records.iter().map(|r| r.van_trips).collect::<Vec<_>>(), vec![1, 1, 3]);
        assert_eq!(report.records[2].packing_ratio, 3.0 / 20.0);
        let summed: f64 = report.records.iter().map(|r| r.packing_ratio).sum();
        assert!((summed - report.packing_ratio).abs() < 1e-12);
        assert_eq!(report.van_trips, 5);
        assert_eq!(report.packing_ratio, 0.25);
        assert_eq!(report.efficiency(2.0), 0.5);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let evaluator = EfficiencyEvaluator::new(4).unwrap();
        let labeling = labeling(&[3, 5]);

        assert_eq!(evaluator.evaluate(&labeling, 6), evaluator.evaluate(&labeling, 6));
    }

    #[test]
    fn test_no_observed_trips_is_an_error() {
        let evaluator = EfficiencyEvaluator::new(6).unwrap();
        assert_eq!(evaluator.evaluate(&labeling(&[2]), 0), Err(EfficiencyError::NoObservedTrips));
    }

    #[test]
    fn test_more_van_trips_than_taxi_trips_is_only_a_warning() {
        let evaluator = EfficiencyEvaluator::new(6).unwrap();

        let report = evaluator.evaluate(&labeling(&[7]), 1).unwrap();

        assert_eq!(report.van_trips, 2);
        assert_eq!(report.packing_ratio, 2.0);
        assert!(report.is_degenerate());
    }

    #[test]
    fn test_no_clusters_is_degenerate() {
        let report = EfficiencyEvaluator::new(6).unwrap().evaluate(&labeling(&[]), 10).unwrap();
        assert_eq!(report.packing_ratio, 0.0);
        assert!(report.is_degenerate());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(EfficiencyEvaluator::new(0), Err(InvalidConfigError::NonPositiveVanCapacity));
    }

    #[test]
    fn test_records_frame() {
        let report = EfficiencyEvaluator::new(6).unwrap().evaluate(&labeling(&[2, 8]), 10).unwrap();

        let frame = report.to_frame().unwrap();
        assert_eq!(frame.shape(), (2, 6));
        assert_eq!(
            frame.column("packing_ratio").unwrap().f64().unwrap().to_vec(),
            vec![Some(0.1), Some(0.2)],
        );
    }
}
