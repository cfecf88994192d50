use std::fmt;
use std::fmt::Formatter;

/// A configuration value that can not be used. These are fatal and reported before any
/// clustering starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidConfigError {
    NonPositiveTimeScale(f64),
    NonPositiveCoordinateScale(f64),
    EmptyMinClusterSizeSequence,
    MinClusterSizeTooSmall(usize),
    MinClusterSizeSequenceNotDescending(Vec<usize>),
    MaxClusterSizeTooSmall { max_cluster_size: usize, min_cluster_size: usize },
    WindowDurationOutOfRange(u32),
    WindowStartHourOutOfRange(u32),
    NonPositiveDbscanTolerance(f64),
    MinSamplesTooSmall(usize),
    NonPositiveVanCapacity,
    NonPositiveAlpha(f64),
    TimeBucketOutOfRange(u32),
    NonPositiveRegionCellSize(f64),
    NoTuningCandidates,
    NonPositiveTuningCandidate(f64),
    NonPositiveTuningTarget(f64),
}

impl fmt::Display for InvalidConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InvalidConfigError::NonPositiveTimeScale(value) => {
                write!(f, "time_scale must be positive, got {value}")
            }
            InvalidConfigError::NonPositiveCoordinateScale(value) => {
                write!(f, "coordinate_scale must be positive, got {value}")
            }
            InvalidConfigError::EmptyMinClusterSizeSequence => {
                write!(f, "min_cluster_size_sequence must not be empty")
            }
            InvalidConfigError::MinClusterSizeTooSmall(value) => {
                write!(f, "min_cluster_size values must be at least 2, got {value}")
            }
            InvalidConfigError::MinClusterSizeSequenceNotDescending(sequence) => {
                write!(f, "min_cluster_size_sequence must be strictly descending, got {sequence:?}")
            }
            InvalidConfigError::MaxClusterSizeTooSmall { max_cluster_size, min_cluster_size } => {
                write!(f, "max_cluster_size ({max_cluster_size}) must not be below the largest min_cluster_size ({min_cluster_size})")
            }
            InvalidConfigError::WindowDurationOutOfRange(minutes) => {
                write!(f, "max_window_duration must be between 1 and 1440 minutes, got {minutes}")
            }
            InvalidConfigError::WindowStartHourOutOfRange(hour) => {
                write!(f, "window_start_hour must be between 0 and 23, got {hour}")
            }
            InvalidConfigError::NonPositiveDbscanTolerance(value) => {
                write!(f, "DBSCAN tolerance must be positive, got {value}")
            }
            InvalidConfigError::MinSamplesTooSmall(value) => {
                write!(f, "HDBSCAN min_samples must be at least 1, got {value}")
            }
            InvalidConfigError::NonPositiveVanCapacity => {
                write!(f, "van_capacity must be at least 1")
            }
            InvalidConfigError::NonPositiveAlpha(value) => {
                write!(f, "alpha must be positive, got {value}")
            }
            InvalidConfigError::TimeBucketOutOfRange(minutes) => {
                write!(f, "time_bucket_minutes must be between 1 and 1440, got {minutes}")
            }
            InvalidConfigError::NonPositiveRegionCellSize(value) => {
                write!(f, "region_cell_size must be positive, got {value}")
            }
            InvalidConfigError::NoTuningCandidates => {
                write!(f, "tuning needs at least one time_scale candidate")
            }
            InvalidConfigError::NonPositiveTuningCandidate(value) => {
                write!(f, "time_scale candidates must be positive, got {value}")
            }
            InvalidConfigError::NonPositiveTuningTarget(value) => {
                write!(f, "tuning targets must be positive, got {value}")
            }
        }
    }
}
