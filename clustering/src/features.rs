use chrono::NaiveDateTime;
use common::types::config::ClusteringConfig;
use common::types::errors::InvalidConfigError;
use common::types::trip::Trip;
use common::types::TripId;
use log::{debug, warn};
use ndarray::Array2;

/// (x0, y0, scaled t0, x1, y1)
pub const FEATURE_DIMENSION: usize = 5;

/// One passenger's copy of a trip. This is the unit that gets clustered.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerInstance {
    pub trip: TripId,
    pub pickup_time: NaiveDateTime,
    pub features: [f64; FEATURE_DIMENSION],
}

impl PassengerInstance {
    pub fn pickup(&self) -> (f64, f64) {
        (self.features[0], self.features[1])
    }

    pub fn dropoff(&self) -> (f64, f64) {
        (self.features[3], self.features[4])
    }
}

/// Turns trips into feature vectors. Coordinates are divided by `coordinate_scale` to get
/// distance units, pickup times are measured in minutes from the earliest pickup of the batch and
/// divided by `time_scale`, so one unit of scaled time weighs as much as one distance unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureTransformer {
    time_scale: f64,
    coordinate_scale: f64,
}

impl FeatureTransformer {
    pub fn new(time_scale: f64, coordinate_scale: f64) -> Result<Self, InvalidConfigError> {
        if !(time_scale > 0.0 && time_scale.is_finite()) {
            return Err(InvalidConfigError::NonPositiveTimeScale(time_scale));
        }
        if !(coordinate_scale > 0.0 && coordinate_scale.is_finite()) {
            return Err(InvalidConfigError::NonPositiveCoordinateScale(coordinate_scale));
        }
        Ok(Self { time_scale, coordinate_scale })
    }

    pub fn from_config(config: &ClusteringConfig) -> Result<Self, InvalidConfigError> {
        Self::new(config.time_scale, config.coordinate_scale)
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Emits `passenger_count` identical instances per trip, in trip order. Trips violating the
    /// trip invariants are skipped.
    pub fn transform(&self, trips: &[Trip]) -> Vec<PassengerInstance> {
        let Some(origin) = trips.iter()
            .filter(|trip| trip.is_well_formed())
            .map(|trip| trip.pickup_time)
            .min()
        else {
            return vec![];
        };

        let capacity = trips.iter().map(|trip| trip.passenger_count as usize).sum();
        let mut passengers = Vec::with_capacity(capacity);

        for (index, trip) in trips.iter().enumerate() {
            if !trip.is_well_formed() {
                warn!(target: "features", "Skipping malformed trip {}", index);
                continue;
            }

            let minutes = (trip.pickup_time - origin).num_milliseconds() as f64 / 60_000.0;
            let features = [
                trip.pickup.x / self.coordinate_scale,
                trip.pickup.y / self.coordinate_scale,
                minutes / self.time_scale,
                trip.dropoff.x / self.coordinate_scale,
                trip.dropoff.y / self.coordinate_scale,
            ];
            let instance = PassengerInstance {
                trip: TripId(index as u32),
                pickup_time: trip.pickup_time,
                features,
            };

            passengers.extend(std::iter::repeat(instance).take(trip.passenger_count as usize));
        }

        debug!(
            target: "features",
            "Expanded {} trips into {} passenger instances (time scale {} min per distance unit)",
            trips.len(), passengers.len(), self.time_scale,
        );

        passengers
    }
}

/// Stacks the feature vectors of the selected passengers into one row each.
pub fn feature_matrix(passengers: &[PassengerInstance], selection: &[usize]) -> Array2<f64> {
    Array2::from_shape_fn((selection.len(), FEATURE_DIMENSION), |(row, column)| {
        passengers[selection[row]].features[column]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{minutes_after_start, trip};

    #[test]
    fn test_duplicates_per_passenger() {
        let trips = vec![
            trip(1.0, 2.0, 0.0, 3.0, 4.0, 3),
            trip(5.0, 6.0, 10.0, 7.0, 8.0, 1),
        ];
        let transformer = FeatureTransformer::new(25.0, 1.0).unwrap();

        let passengers = transformer.transform(&trips);

        assert_eq!(passengers.len(), 4);
        assert!(passengers[..3].iter().all(|p| p == &passengers[0]));
        assert!(passengers[..3].iter().all(|p| p.trip == TripId(0)));
        assert_eq!(passengers[3].trip, TripId(1));
        assert_eq!(passengers[3].pickup_time, minutes_after_start(10.0));
    }

    #[test]
    fn test_scaling() {
        let trips = vec![
            trip(5280.0, 10560.0, 0.0, 0.0, 5280.0, 1),
            trip(0.0, 0.0, 50.0, 0.0, 0.0, 1),
        ];
        let transformer = FeatureTransformer::new(25.0, 5280.0).unwrap();

        let passengers = transformer.transform(&trips);

        assert_eq!(passengers[0].features, [1.0, 2.0, 0.0, 0.0, 1.0]);
        // 50 minutes after the first pickup at 25 minutes per mile
        assert_eq!(passengers[1].features[2], 2.0);
        assert_eq!(passengers[0].pickup(), (1.0, 2.0));
        assert_eq!(passengers[0].dropoff(), (0.0, 1.0));
    }

    #[test]
    fn test_rejects_malformed_trips() {
        let mut broken = trip(0.0, 0.0, 0.0, 1.0, 1.0, 2);
        broken.passenger_count = 0;
        let mut not_finite = trip(0.0, 0.0, 0.0, 1.0, 1.0, 2);
        not_finite.dropoff.y = f64::NAN;
        let trips = vec![broken, trip(0.0, 0.0, 5.0, 1.0, 1.0, 2), not_finite];

        let passengers = FeatureTransformer::new(25.0, 1.0).unwrap().transform(&trips);

        assert_eq!(passengers.len(), 2);
        assert!(passengers.iter().all(|p| p.trip == TripId(1)));
        // the skipped trip does not define the time origin
        assert_eq!(passengers[0].features[2], 0.0);
    }

    #[test]
    fn test_invalid_scales() {
        assert_eq!(
            FeatureTransformer::new(0.0, 1.0),
            Err(InvalidConfigError::NonPositiveTimeScale(0.0)),
        );
        assert_eq!(
            FeatureTransformer::new(20.0, f64::INFINITY),
            Err(InvalidConfigError::NonPositiveCoordinateScale(f64::INFINITY)),
        );
    }

    #[test]
    fn test_feature_matrix() {
        let trips = vec![
            trip(1.0, 1.0, 0.0, 1.0, 1.0, 1),
            trip(2.0, 2.0, 0.0, 2.0, 2.0, 1),
            trip(3.0, 3.0, 0.0, 3.0, 3.0, 1),
        ];
        let passengers = FeatureTransformer::new(25.0, 1.0).unwrap().transform(&trips);

        let matrix = feature_matrix(&passengers, &[2, 0]);

        assert_eq!(matrix.shape(), &[2, FEATURE_DIMENSION]);
        assert_eq!(matrix[[0, 0]], 3.0);
        assert_eq!(matrix[[1, 4]], 1.0);
    }
}
