use clustering::engine::ClusterEngine;
use clustering::features::{FeatureTransformer, PassengerInstance};
use clustering::merge::Labeling;
use clustering::statistics::ClusterStatistics;
use clustering::tuning::{tune_time_scale, TuningReport};
use clustering::windows::TimeWindower;
use common::types::config::{ClusteringConfig, Config, EfficiencyConfig};
use common::types::trip::Trip;
use common::types::ClusterId;
use common::util::logging;
use efficiency::{EfficiencyEvaluator, EfficiencyReport, EfficiencySeries, Region, TimeOfDay};
use ingest::ingest;
use log::info;

use crate::output::write_outputs;
use crate::VanpoolError;

/// Everything one run produces. Written to the output directory by `write_outputs`.
pub struct RunOutput {
    pub time_scale: f64,
    pub passengers: Vec<PassengerInstance>,
    pub labeling: Labeling,
    pub trip_labels: Vec<Option<ClusterId>>,
    pub statistics: ClusterStatistics,
    pub report: EfficiencyReport,
    pub series: Vec<EfficiencySeries>,
    pub tuning: Option<TuningReport>,
}

pub fn run_pipeline(config: Config, tune: bool) -> Result<(), VanpoolError> {
    let Config::Version1 { input, mut clustering, efficiency, tuning, output } = config;

    let trips = logging::run_with_spinner("ingest", "Reading trips", || ingest(&input))?.trips;

    let tuning_report = if tune {
        let report = logging::run_with_spinner("tuning", "Tuning time_scale", || {
            tune_time_scale(&trips, &clustering, &tuning)
        })?;
        clustering.time_scale = report.best.time_scale;
        Some(report)
    } else {
        None
    };

    let run_output = cluster_and_evaluate(&trips, &clustering, &efficiency, tuning_report)?;

    logging::run_with_spinner("output", "Writing results", || {
        write_outputs(&output, &run_output, efficiency.alpha)
    })?;

    Ok(())
}

pub fn cluster_and_evaluate(
    trips: &[Trip],
    clustering: &ClusteringConfig,
    efficiency: &EfficiencyConfig,
    tuning: Option<TuningReport>,
) -> Result<RunOutput, VanpoolError> {
    let passengers = FeatureTransformer::from_config(clustering)?.transform(trips);
    let windows = TimeWindower::from_config(clustering)?.partition(&passengers);
    let engine = ClusterEngine::from_config(clustering)?;

    info!(
        target: "clustering",
        "Clustering {} passengers in {} windows (time_scale {}, min_cluster_size {:?})",
        passengers.len(), windows.len(), clustering.time_scale, engine.thresholds(),
    );

    let labeling = logging::run_with_pb("clustering", "Clustering windows", windows.len() as u64, true, |pb| {
        engine.run_with(&windows, &passengers, |_| pb.inc(1))
    })?;

    let trip_labels = labeling.trip_labels(&passengers, trips.len());
    let statistics = ClusterStatistics::compute(&labeling, &passengers, trips);
    info!(
        target: "clustering",
        "{:.1}% of passengers clustered, median spread {:?} min / {:?} distance units",
        statistics.fraction_clustered * 100.0,
        statistics.median_time_spread(),
        statistics.median_distance_spread(),
    );

    let evaluator = EfficiencyEvaluator::from_config(efficiency)?;
    let report = evaluator.evaluate(&labeling, trips.len())?;

    let time_of_day = TimeOfDay::new(efficiency.time_bucket_minutes)?;
    let mut series = vec![evaluator.evaluate_by(&labeling, &passengers, trips, &time_of_day)];
    if let Some(cell_size) = efficiency.region_cell_size {
        let region = Region::new(cell_size, clustering.coordinate_scale)?;
        series.push(evaluator.evaluate_by(&labeling, &passengers, trips, &region));
    }

    Ok(RunOutput {
        time_scale: clustering.time_scale,
        passengers,
        labeling,
        trip_labels,
        statistics,
        report,
        series,
        tuning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use common::types::trip::Coord;

    fn trip(x: f64, minutes: i64, passenger_count: u32) -> Trip {
        let pickup_time = NaiveDate::from_ymd_opt(2016, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
            + TimeDelta::minutes(minutes);
        Trip {
            pickup: Coord { x, y: 0.0 },
            pickup_time,
            dropoff: Coord { x: x + 5.0, y: 5.0 },
            dropoff_time: Some(pickup_time + TimeDelta::minutes(20)),
            passenger_count,
            fare: None,
        }
    }

    #[test]
    fn test_eight_similar_passengers_need_two_vans() {
        let trips: Vec<Trip> = (0..8).map(|i| trip(0.01 * i as f64, 0, 1)).collect();
        let clustering = ClusteringConfig { coordinate_scale: 1.0, ..ClusteringConfig::default() };

        let output = cluster_and_evaluate(&trips, &clustering, &EfficiencyConfig::default(), None).unwrap();

        assert_eq!(output.report.van_trips, 2);
        assert_eq!(output.report.observed_trips, 8);
        assert_eq!(output.report.packing_ratio, 0.25);
        assert_eq!(output.trip_labels.len(), 8);
        assert_eq!(output.series.len(), 1);
    }

    #[test]
    fn test_region_series_only_with_cell_size() {
        let trips = vec![trip(0.0, 0, 3), trip(0.1, 2, 3)];
        let clustering = ClusteringConfig { coordinate_scale: 1.0, ..ClusteringConfig::default() };
        let efficiency = EfficiencyConfig { region_cell_size: Some(1.0), ..EfficiencyConfig::default() };

        let output = cluster_and_evaluate(&trips, &clustering, &efficiency, None).unwrap();

        assert_eq!(output.series.len(), 2);
        assert_eq!(output.series[1].name, "region");
        assert_eq!(output.passengers.len(), 6);
    }
}
