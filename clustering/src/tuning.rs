use std::fmt;
use std::fmt::Display;

use common::types::config::{ClusteringConfig, TuningConfig};
use common::types::errors::InvalidConfigError;
use common::types::trip::Trip;
use log::{debug, info};
use ordered_float::OrderedFloat;
use polars::df;
use polars::error::PolarsError;
use polars::frame::DataFrame;
use rayon::prelude::*;

use crate::density::ClusterError;
use crate::engine::ClusterEngine;
use crate::features::FeatureTransformer;
use crate::statistics::ClusterStatistics;
use crate::windows::TimeWindower;

/// Result of clustering all trips at one candidate time scale.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEvaluation {
    pub time_scale: f64,
    pub cluster_count: usize,
    pub fraction_clustered: f64,
    pub median_time_spread: Option<f64>,
    pub median_distance_spread: Option<f64>,
    /// Relative distance of the median spreads from their targets, `None` without clusters.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningReport {
    pub evaluations: Vec<CandidateEvaluation>,
    pub best: CandidateEvaluation,
}

impl TuningReport {
    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        let column = |f: fn(&CandidateEvaluation) -> Option<f64>| self.evaluations.iter().map(f).collect::<Vec<_>>();

        df!(
            "time_scale" => self.evaluations.iter().map(|e| e.time_scale).collect::<Vec<_>>(),
            "clusters" => self.evaluations.iter().map(|e| e.cluster_count as u32).collect::<Vec<_>>(),
            "fraction_clustered" => self.evaluations.iter().map(|e| e.fraction_clustered).collect::<Vec<_>>(),
            "median_time_spread" => column(|e| e.median_time_spread),
            "median_distance_spread" => column(|e| e.median_distance_spread),
            "score" => column(|e| e.score),
        )
    }
}

/// Clusters the trips with a single threshold (`tuning.min_cluster_size`) at the given time
/// scale and measures how spread out the resulting clusters are.
pub fn evaluate_candidate(
    trips: &[Trip],
    clustering: &ClusteringConfig,
    tuning: &TuningConfig,
    time_scale: f64,
) -> Result<CandidateEvaluation, TuningError> {
    let transformer = FeatureTransformer::new(time_scale, clustering.coordinate_scale)?;
    let windower = TimeWindower::from_config(clustering)?;
    let engine = ClusterEngine::new(
        crate::density::from_config(&clustering.algorithm),
        vec![tuning.min_cluster_size],
        clustering.max_cluster_size.map(|max| max.max(tuning.min_cluster_size)),
    )?;

    let passengers = transformer.transform(trips);
    let windows = windower.partition(&passengers);
    let labeling = engine.run(&windows, &passengers)?;
    let statistics = ClusterStatistics::compute(&labeling, &passengers, trips);

    let median_time_spread = statistics.median_time_spread();
    let median_distance_spread = statistics.median_distance_spread();
    let score = median_time_spread.zip(median_distance_spread)
        .map(|(time, distance)| {
            (time - tuning.target_time_spread).abs() / tuning.target_time_spread
                + (distance - tuning.target_distance_spread).abs() / tuning.target_distance_spread
        });

    debug!(
        target: "tuning",
        "time_scale {}: {} clusters, median spread {:?} min / {:?} units",
        time_scale, statistics.clusters.len(), median_time_spread, median_distance_spread,
    );

    Ok(CandidateEvaluation {
        time_scale,
        cluster_count: statistics.clusters.len(),
        fraction_clustered: statistics.fraction_clustered,
        median_time_spread,
        median_distance_spread,
        score,
    })
}

/// Evaluates every candidate in parallel and picks the one with the lowest score. Equal scores
/// go to the earlier candidate.
pub fn tune_time_scale(
    trips: &[Trip],
    clustering: &ClusteringConfig,
    tuning: &TuningConfig,
) -> Result<TuningReport, TuningError> {
    tuning.validate()?;

    let evaluations = tuning.candidates.par_iter()
        .map(|&candidate| evaluate_candidate(trips, clustering, tuning, candidate))
        .collect::<Result<Vec<_>, TuningError>>()?;

    let best = evaluations.iter()
        .filter_map(|evaluation| evaluation.score.map(|score| (OrderedFloat(score), evaluation)))
        .min_by_key(|(score, _)| *score)
        .map(|(_, evaluation)| evaluation.clone())
        .ok_or(TuningError::NoClusters)?;

    info!(
        target: "tuning",
        "Selected time_scale {} out of {} candidates (score {:.3})",
        best.time_scale, evaluations.len(), best.score.unwrap_or(f64::NAN),
    );

    Ok(TuningReport { evaluations, best })
}

#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    Config(#[from] InvalidConfigError),
    Cluster(#[from] ClusterError),
    NoClusters,
}

impl Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TuningError::Config(err) => write!(f, "{}", err),
            TuningError::Cluster(err) => write!(f, "{}", err),
            TuningError::NoClusters => write!(f, "No candidate time_scale produced any cluster"),
        }
    }
}
