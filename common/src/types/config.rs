use std::path::PathBuf;

use serde::Deserialize;

use crate::types::errors::InvalidConfigError;

/// The longest time window that may be clustered in one piece.
pub const MAX_WINDOW_MINUTES: u32 = 24 * 60;

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1")]
    Version1 {
        input: InputConfig,
        #[serde(default)]
        clustering: ClusteringConfig,
        #[serde(default)]
        efficiency: EfficiencyConfig,
        #[serde(default)]
        tuning: TuningConfig,
        #[serde(default)]
        output: OutputConfig,
    }
}

impl Config {
    /// Checks every section. Nothing is clustered with a config that fails here.
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        match self {
            Config::Version1 { clustering, efficiency, tuning, .. } => {
                clustering.validate()?;
                efficiency.validate()?;
                tuning.validate()
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: InputFormat,
    #[serde(default)]
    pub columns: ColumnNames,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    #[default]
    Csv,
    Parquet,
}

/// Names of the input columns. `dropoff_time` and `fare` may be absent from the input.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnNames {
    pub pickup_x: String,
    pub pickup_y: String,
    pub pickup_time: String,
    pub dropoff_x: String,
    pub dropoff_y: String,
    pub dropoff_time: String,
    pub passenger_count: String,
    pub fare: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            pickup_x: "pickup_x".into(),
            pickup_y: "pickup_y".into(),
            pickup_time: "pickup_time".into(),
            dropoff_x: "dropoff_x".into(),
            dropoff_y: "dropoff_y".into(),
            dropoff_time: "dropoff_time".into(),
            passenger_count: "passenger_count".into(),
            fare: "fare".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minutes of pickup time that weigh as much as one distance unit.
    pub time_scale: f64,
    /// Input coordinate units per distance unit (5280 turns projected feet into miles).
    pub coordinate_scale: f64,
    pub min_cluster_size_sequence: Vec<usize>,
    /// In minutes.
    pub max_window_duration: u32,
    pub window_start_hour: u32,
    /// Clusters above this size are discarded as superclusters.
    pub max_cluster_size: Option<usize>,
    pub algorithm: AlgorithmConfig,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            time_scale: 25.0,
            coordinate_scale: 5280.0,
            min_cluster_size_sequence: vec![6, 5, 4, 3, 2],
            max_window_duration: MAX_WINDOW_MINUTES,
            window_start_hour: 6,
            max_cluster_size: Some(120),
            algorithm: AlgorithmConfig::default(),
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        if !(self.time_scale > 0.0 && self.time_scale.is_finite()) {
            return Err(InvalidConfigError::NonPositiveTimeScale(self.time_scale));
        }
        if !(self.coordinate_scale > 0.0 && self.coordinate_scale.is_finite()) {
            return Err(InvalidConfigError::NonPositiveCoordinateScale(self.coordinate_scale));
        }
        validate_min_cluster_size_sequence(&self.min_cluster_size_sequence)?;
        if self.max_window_duration == 0 || self.max_window_duration > MAX_WINDOW_MINUTES {
            return Err(InvalidConfigError::WindowDurationOutOfRange(self.max_window_duration));
        }
        if self.window_start_hour > 23 {
            return Err(InvalidConfigError::WindowStartHourOutOfRange(self.window_start_hour));
        }
        if let Some(max_cluster_size) = self.max_cluster_size {
            // the sequence is descending, so the first entry is the largest
            let min_cluster_size = self.min_cluster_size_sequence[0];
            if max_cluster_size < min_cluster_size {
                return Err(InvalidConfigError::MaxClusterSizeTooSmall { max_cluster_size, min_cluster_size });
            }
        }
        self.algorithm.validate()
    }
}

pub fn validate_min_cluster_size_sequence(sequence: &[usize]) -> Result<(), InvalidConfigError> {
    if sequence.is_empty() {
        return Err(InvalidConfigError::EmptyMinClusterSizeSequence);
    }
    if let Some(&too_small) = sequence.iter().find(|&&size| size < 2) {
        return Err(InvalidConfigError::MinClusterSizeTooSmall(too_small));
    }
    if sequence.windows(2).any(|pair| pair[0] <= pair[1]) {
        return Err(InvalidConfigError::MinClusterSizeSequenceNotDescending(sequence.to_vec()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    Hdbscan {
        /// Neighbourhood size for core distances, defaults to the active min_cluster_size.
        #[serde(default)]
        min_samples: Option<usize>,
        /// Lets a window whose points form one single dense group become one cluster.
        #[serde(default = "default_true")]
        allow_single_cluster: bool,
    },
    Dbscan {
        /// Neighbourhood radius in feature space.
        tolerance: f64,
    },
}

fn default_true() -> bool {
    true
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig::Hdbscan { min_samples: None, allow_single_cluster: true }
    }
}

impl AlgorithmConfig {
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        match self {
            AlgorithmConfig::Hdbscan { min_samples: Some(0), .. } => {
                Err(InvalidConfigError::MinSamplesTooSmall(0))
            }
            AlgorithmConfig::Dbscan { tolerance } if !(*tolerance > 0.0 && tolerance.is_finite()) => {
                Err(InvalidConfigError::NonPositiveDbscanTolerance(*tolerance))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EfficiencyConfig {
    pub van_capacity: usize,
    /// Cost of a van trip relative to a taxi trip. Not estimated, only applied when given.
    pub alpha: Option<f64>,
    pub time_bucket_minutes: u32,
    /// Side length of the square pickup regions, in distance units. No region series without it.
    pub region_cell_size: Option<f64>,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self {
            van_capacity: 6,
            alpha: None,
            time_bucket_minutes: 60,
            region_cell_size: None,
        }
    }
}

impl EfficiencyConfig {
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        if self.van_capacity == 0 {
            return Err(InvalidConfigError::NonPositiveVanCapacity);
        }
        if let Some(alpha) = self.alpha {
            if !(alpha > 0.0 && alpha.is_finite()) {
                return Err(InvalidConfigError::NonPositiveAlpha(alpha));
            }
        }
        if self.time_bucket_minutes == 0 || self.time_bucket_minutes > MAX_WINDOW_MINUTES {
            return Err(InvalidConfigError::TimeBucketOutOfRange(self.time_bucket_minutes));
        }
        if let Some(cell_size) = self.region_cell_size {
            if !(cell_size > 0.0 && cell_size.is_finite()) {
                return Err(InvalidConfigError::NonPositiveRegionCellSize(cell_size));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TuningConfig {
    pub candidates: Vec<f64>,
    pub min_cluster_size: usize,
    /// Target standard deviation of pickup times inside a cluster, in minutes.
    pub target_time_spread: f64,
    /// Target RMS pickup distance from the cluster centroid, in distance units.
    pub target_distance_spread: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            candidates: vec![20.0, 22.5, 25.0, 27.5, 30.0],
            min_cluster_size: 6,
            target_time_spread: 5.0,
            target_distance_spread: 0.2,
        }
    }
}

impl TuningConfig {
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        if self.candidates.is_empty() {
            return Err(InvalidConfigError::NoTuningCandidates);
        }
        if let Some(&candidate) = self.candidates.iter().find(|c| !(**c > 0.0 && c.is_finite())) {
            return Err(InvalidConfigError::NonPositiveTuningCandidate(candidate));
        }
        if self.min_cluster_size < 2 {
            return Err(InvalidConfigError::MinClusterSizeTooSmall(self.min_cluster_size));
        }
        for target in [self.target_time_spread, self.target_distance_spread] {
            if !(target > 0.0 && target.is_finite()) {
                return Err(InvalidConfigError::NonPositiveTuningTarget(target));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./output"),
            format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}
