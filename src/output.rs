use std::path::PathBuf;

use clustering::merge::trip_labels_frame;
use common::types::config::OutputConfig;
use common::util::df::{write_df_to_file, FileType};
use log::debug;
use polars::df;
use polars::error::PolarsError;
use polars::frame::DataFrame;

use crate::pipeline::RunOutput;

pub fn write_outputs(output: &OutputConfig, run: &RunOutput, alpha: Option<f64>) -> Result<(), PolarsError> {
    let write = |name: &str, df: DataFrame| {
        let path = output_path(output, name);
        debug!(target: "output", "Writing {} rows to '{}'", df.height(), path.display());
        write_df_to_file(path, FileType::from(output.format), df)
    };

    write("passenger_labels", run.labeling.to_frame(&run.passengers)?)?;
    write("trip_labels", trip_labels_frame(&run.trip_labels)?)?;
    write("clusters", run.report.to_frame()?)?;
    write("cluster_spread", run.statistics.to_frame()?)?;
    write("summary", summary_frame(run, alpha)?)?;
    for series in &run.series {
        write(&format!("series_{}", series.name), series.to_frame(alpha)?)?;
    }
    if let Some(tuning) = &run.tuning {
        write("tuning", tuning.to_frame()?)?;
    }

    Ok(())
}

fn output_path(output: &OutputConfig, name: &str) -> PathBuf {
    output.directory.join(format!("{}.{}", name, output.format.extension()))
}

/// A single row with the aggregate numbers of the run. `efficiency` is null without an alpha.
fn summary_frame(run: &RunOutput, alpha: Option<f64>) -> Result<DataFrame, PolarsError> {
    let report = &run.report;

    df!(
        "time_scale" => [run.time_scale],
        "passengers" => [run.passengers.len() as u32],
        "clustered_passengers" => [report.passengers as u32],
        "fraction_clustered" => [run.statistics.fraction_clustered],
        "clusters" => [report.records.len() as u32],
        "van_trips" => [report.van_trips as u32],
        "observed_trips" => [report.observed_trips as u32],
        "packing_ratio" => [report.packing_ratio],
        "efficiency" => [alpha.map(|alpha| report.efficiency(alpha))],
        "median_time_spread" => [run.statistics.median_time_spread()],
        "median_distance_spread" => [run.statistics.median_distance_spread()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cluster_and_evaluate;
    use chrono::{NaiveDate, TimeDelta};
    use common::types::config::{ClusteringConfig, EfficiencyConfig, OutputFormat};
    use common::types::trip::{Coord, Trip};

    #[test]
    fn test_writes_all_tables() {
        let start = NaiveDate::from_ymd_opt(2016, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let trips: Vec<Trip> = (0..6)
            .map(|i| Trip {
                pickup: Coord { x: 0.01 * i as f64, y: 0.0 },
                pickup_time: start + TimeDelta::minutes(i),
                dropoff: Coord { x: 5.0, y: 5.0 },
                dropoff_time: None,
                passenger_count: 1,
                fare: Some(10.0),
            })
            .collect();
        let clustering = ClusteringConfig { coordinate_scale: 1.0, ..ClusteringConfig::default() };
        let run = cluster_and_evaluate(&trips, &clustering, &EfficiencyConfig::default(), None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig { directory: dir.path().join("out"), format: OutputFormat::Csv };

        write_outputs(&output, &run, Some(2.0)).unwrap();

        for name in ["passenger_labels", "trip_labels", "clusters", "cluster_spread", "summary", "series_time_of_day"] {
            assert!(output_path(&output, name).exists(), "{} missing", name);
        }
        assert!(!output_path(&output, "tuning").exists());

        let summary = summary_frame(&run, Some(2.0)).unwrap();
        assert_eq!(summary.height(), 1);
        assert_eq!(
            summary.column("efficiency").unwrap().f64().unwrap().get(0),
            Some(2.0 * run.report.packing_ratio),
        );
    }
}
