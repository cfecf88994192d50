use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Debug, Display};

use chrono::Timelike;
use clustering::features::PassengerInstance;
use clustering::merge::Labeling;
use common::types::config::MAX_WINDOW_MINUTES;
use common::types::errors::InvalidConfigError;
use common::types::trip::Trip;
use hashbrown::HashMap;
use itertools::Itertools;
use polars::df;
use polars::error::PolarsError;
use polars::frame::DataFrame;

use crate::evaluator::{van_trips, EfficiencyEvaluator};

/// Assigns each trip to a slice, e.g. the hour of the day it started in.
pub trait Slicer {
    type Key: Ord + Clone + Display + Debug + std::hash::Hash;

    fn key(&self, trip: &Trip) -> Self::Key;

    fn name(&self) -> &'static str;
}

/// Buckets of `bucket_minutes` by pickup time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    bucket_minutes: u32,
}

impl TimeOfDay {
    pub fn new(bucket_minutes: u32) -> Result<Self, InvalidConfigError> {
        if bucket_minutes == 0 || bucket_minutes > MAX_WINDOW_MINUTES {
            return Err(InvalidConfigError::TimeBucketOutOfRange(bucket_minutes));
        }
        Ok(Self { bucket_minutes })
    }

    pub fn bucket_minutes(&self) -> u32 {
        self.bucket_minutes
    }
}

/// Minutes after midnight of the start of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBucket(pub u32);

impl Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Slicer for TimeOfDay {
    type Key = TimeBucket;

    fn key(&self, trip: &Trip) -> TimeBucket {
        let minute_of_day = trip.pickup_time.hour() * 60 + trip.pickup_time.minute();
        TimeBucket(minute_of_day / self.bucket_minutes * self.bucket_minutes)
    }

    fn name(&self) -> &'static str {
        "time_of_day"
    }
}

/// Square cells of `cell_size` distance units over the pickup location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    cell_size: f64,
    coordinate_scale: f64,
}

impl Region {
    pub fn new(cell_size: f64, coordinate_scale: f64) -> Result<Self, InvalidConfigError> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(InvalidConfigError::NonPositiveRegionCellSize(cell_size));
        }
        if !(coordinate_scale > 0.0 && coordinate_scale.is_finite()) {
            return Err(InvalidConfigError::NonPositiveCoordinateScale(coordinate_scale));
        }
        Ok(Self { cell_size, coordinate_scale })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub x: i64,
    pub y: i64,
}

impl Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Slicer for Region {
    type Key = GridCell;

    fn key(&self, trip: &Trip) -> GridCell {
        let cell = |coordinate: f64| (coordinate / self.coordinate_scale / self.cell_size).floor() as i64;
        GridCell { x: cell(trip.pickup.x), y: cell(trip.pickup.y) }
    }

    fn name(&self) -> &'static str {
        "region"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceEfficiency {
    pub key: String,
    pub clusters: usize,
    pub passengers: usize,
    pub van_trips: usize,
    pub observed_trips: usize,
    /// `None` for slices without observed trips.
    pub packing_ratio: Option<f64>,
}

/// Packing ratios per slice, ordered by slice key.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencySeries {
    pub name: &'static str,
    pub slices: Vec<SliceEfficiency>,
}

impl EfficiencySeries {
    pub fn to_frame(&self, alpha: Option<f64>) -> Result<DataFrame, PolarsError> {
        let efficiency = self.slices.iter()
            .map(|slice| alpha.zip(slice.packing_ratio).map(|(alpha, ratio)| alpha * ratio))
            .collect_vec();

        df!(
            self.name => self.slices.iter().map(|s| s.key.clone()).collect_vec(),
            "clusters" => self.slices.iter().map(|s| s.clusters as u32).collect_vec(),
            "passengers" => self.slices.iter().map(|s| s.passengers as u32).collect_vec(),
            "van_trips" => self.slices.iter().map(|s| s.van_trips as u32).collect_vec(),
            "observed_trips" => self.slices.iter().map(|s| s.observed_trips as u32).collect_vec(),
            "packing_ratio" => self.slices.iter().map(|s| s.packing_ratio).collect_vec(),
            "efficiency" => efficiency,
        )
    }
}

#[derive(Default)]
struct SliceTotals {
    clusters: usize,
    passengers: usize,
    van_trips: usize,
    observed_trips: usize,
}

impl EfficiencyEvaluator {
    /// Splits the packing ratio by `slicer`. A cluster belongs to the slice most of its members'
    /// trips fall in (ties go to the smallest key), observed trips are counted per slice.
    pub fn evaluate_by<S: Slicer>(
        &self,
        labeling: &Labeling,
        passengers: &[PassengerInstance],
        trips: &[Trip],
        slicer: &S,
    ) -> EfficiencySeries {
        let mut totals: BTreeMap<S::Key, SliceTotals> = BTreeMap::new();

        for trip in trips {
            totals.entry(slicer.key(trip)).or_default().observed_trips += 1;
        }

        for cluster in labeling.clusters.iter().filter(|cluster| cluster.members.len() >= 2) {
            let mut votes: HashMap<S::Key, usize> = HashMap::new();
            for &member in &cluster.members {
                *votes.entry(slicer.key(&trips[passengers[member].trip.index()])).or_default() += 1;
            }

            let Some(key) = votes.into_iter()
                .min_by(|(a_key, a_count), (b_key, b_count)| b_count.cmp(a_count).then(a_key.cmp(b_key)))
                .map(|(key, _)| key)
            else {
                continue;
            };

            let slice = totals.entry(key).or_default();
            slice.clusters += 1;
            slice.passengers += cluster.members.len();
            slice.van_trips += van_trips(cluster.members.len(), self.van_capacity());
        }

        let slices = totals.into_iter()
            .map(|(key, totals)| SliceEfficiency {
                key: key.to_string(),
                clusters: totals.clusters,
                passengers: totals.passengers,
                van_trips: totals.van_trips,
                observed_trips: totals.observed_trips,
                packing_ratio: (totals.observed_trips > 0)
                    .then(|| totals.van_trips as f64 / totals.observed_trips as f64),
            })
            .collect();

        EfficiencySeries { name: slicer.name(), slices }
    }
}
