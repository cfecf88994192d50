use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

/// Formats accepted for timestamps given as text. Integer values are read as UNIX seconds.
const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A trip row as it comes out of the input table. Every field is optional, since the table may
/// contain nulls or values that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripRecord {
    pub pickup_x: Option<f64>,
    pub pickup_y: Option<f64>,
    pub pickup_time: Option<NaiveDateTime>,
    pub dropoff_x: Option<f64>,
    pub dropoff_y: Option<f64>,
    pub dropoff_time: Option<NaiveDateTime>,
    pub passenger_count: Option<i64>,
    pub fare: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

/// An observed taxi trip. Trips are only created through [`TripRecord::validate`] and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub pickup: Coord,
    pub pickup_time: NaiveDateTime,
    pub dropoff: Coord,
    pub dropoff_time: Option<NaiveDateTime>,
    pub passenger_count: u32,
    pub fare: Option<f64>,
}

impl Trip {
    /// Checks the invariants `validate` establishes. Used as a guard by consumers that accept
    /// trips built by hand.
    pub fn is_well_formed(&self) -> bool {
        self.passenger_count >= 1
            && self.pickup.x.is_finite()
            && self.pickup.y.is_finite()
            && self.dropoff.x.is_finite()
            && self.dropoff.y.is_finite()
            && self.fare.map_or(true, |fare| fare.is_finite() && fare >= 0.0)
    }
}

impl TripRecord {
    /// Turns a raw row into a trip. `row` is the position of the record in the input table and
    /// only used for reporting.
    pub fn validate(self, row: usize) -> Result<Trip, MalformedRecord> {
        let malformed = |reason| MalformedRecord { row, reason };

        let pickup = Coord {
            x: finite(self.pickup_x, "pickup_x").map_err(malformed)?,
            y: finite(self.pickup_y, "pickup_y").map_err(malformed)?,
        };
        let dropoff = Coord {
            x: finite(self.dropoff_x, "dropoff_x").map_err(malformed)?,
            y: finite(self.dropoff_y, "dropoff_y").map_err(malformed)?,
        };
        let pickup_time = self.pickup_time
            .ok_or(malformed(MalformedReason::Missing("pickup_time")))?;

        let passenger_count = match self.passenger_count {
            None => return Err(malformed(MalformedReason::Missing("passenger_count"))),
            Some(count) if count < 1 => {
                return Err(malformed(MalformedReason::NonPositivePassengerCount(count)))
            }
            Some(count) => u32::try_from(count)
                .map_err(|_| malformed(MalformedReason::PassengerCountOutOfRange(count)))?,
        };

        let fare = match self.fare {
            Some(fare) if !fare.is_finite() => {
                return Err(malformed(MalformedReason::NotFinite("fare")))
            }
            Some(fare) if fare < 0.0 => return Err(malformed(MalformedReason::NegativeFare(fare))),
            fare => fare,
        };

        Ok(Trip {
            pickup,
            pickup_time,
            dropoff,
            dropoff_time: self.dropoff_time,
            passenger_count,
            fare,
        })
    }
}

fn finite(value: Option<f64>, field: &'static str) -> Result<f64, MalformedReason> {
    match value {
        None => Err(MalformedReason::Missing(field)),
        Some(value) if !value.is_finite() => Err(MalformedReason::NotFinite(field)),
        Some(value) => Ok(value),
    }
}

/// Parses a timestamp cell. Accepts UNIX seconds or one of the `TIMESTAMP_FORMATS`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc());
    }
    TIMESTAMP_FORMATS.iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    pub row: usize,
    pub reason: MalformedReason,
}

impl Display for MalformedRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed record in row {}: {}", self.row, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MalformedReason {
    Missing(&'static str),
    NotFinite(&'static str),
    NonPositivePassengerCount(i64),
    PassengerCountOutOfRange(i64),
    NegativeFare(f64),
}

impl Display for MalformedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::Missing(field) => write!(f, "missing value for '{field}'"),
            MalformedReason::NotFinite(field) => write!(f, "non-finite value for '{field}'"),
            MalformedReason::NonPositivePassengerCount(count) => {
                write!(f, "passenger count must be at least 1, got {count}")
            }
            MalformedReason::PassengerCountOutOfRange(count) => {
                write!(f, "passenger count {count} is out of range")
            }
            MalformedReason::NegativeFare(fare) => write!(f, "negative fare {fare}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn time(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 6, 1).unwrap()
            .and_hms_opt(hour, minute, 0).unwrap()
    }

    fn complete_record() -> TripRecord {
        TripRecord {
            pickup_x: Some(1.0),
            pickup_y: Some(2.0),
            pickup_time: Some(time(8, 0)),
            dropoff_x: Some(3.0),
            dropoff_y: Some(4.0),
            dropoff_time: Some(time(8, 20)),
            passenger_count: Some(2),
            fare: Some(12.5),
        }
    }

    #[test]
    fn test_validate_complete_record() {
        let trip = complete_record().validate(0).unwrap();
        assert_eq!(trip.pickup, Coord { x: 1.0, y: 2.0 });
        assert_eq!(trip.dropoff, Coord { x: 3.0, y: 4.0 });
        assert_eq!(trip.passenger_count, 2);
        assert_eq!(trip.fare, Some(12.5));
        assert!(trip.is_well_formed());
    }

    #[test]
    fn test_validate_rejects_missing_coordinates() {
        let record = TripRecord { dropoff_y: None, ..complete_record() };
        let err = record.validate(4).unwrap_err();
        assert_eq!(err, MalformedRecord { row: 4, reason: MalformedReason::Missing("dropoff_y") });
    }

    #[test]
    fn test_validate_rejects_missing_time() {
        let record = TripRecord { pickup_time: None, ..complete_record() };
        assert_eq!(record.validate(1).unwrap_err().reason, MalformedReason::Missing("pickup_time"));
    }

    #[test]
    fn test_validate_rejects_non_positive_passenger_count() {
        let record = TripRecord { passenger_count: Some(0), ..complete_record() };
        assert_eq!(
            record.validate(0).unwrap_err().reason,
            MalformedReason::NonPositivePassengerCount(0),
        );
        let record = TripRecord { passenger_count: Some(-3), ..complete_record() };
        assert_eq!(
            record.validate(0).unwrap_err().reason,
            MalformedReason::NonPositivePassengerCount(-3),
        );
    }

    #[test]
    fn test_validate_rejects_nan_coordinates() {
        let record = TripRecord { pickup_x: Some(f64::NAN), ..complete_record() };
        assert_eq!(record.validate(0).unwrap_err().reason, MalformedReason::NotFinite("pickup_x"));
    }

    #[test]
    fn test_validate_keeps_missing_fare_and_dropoff_time() {
        let record = TripRecord { fare: None, dropoff_time: None, ..complete_record() };
        let trip = record.validate(0).unwrap();
        assert_eq!(trip.fare, None);
        assert_eq!(trip.dropoff_time, None);
    }

    #[test]
    fn test_validate_rejects_negative_fare() {
        let record = TripRecord { fare: Some(-1.0), ..complete_record() };
        assert_eq!(record.validate(0).unwrap_err().reason, MalformedReason::NegativeFare(-1.0));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2016-06-01 08:00:00"), Some(time(8, 0)));
        assert_eq!(parse_timestamp("2016-06-01T08:20:00"), Some(time(8, 20)));
        assert_eq!(parse_timestamp(" 2016-06-01 08:20 "), Some(time(8, 20)));
        assert_eq!(parse_timestamp("2016-06-01 08:20:00.000000"), Some(time(8, 20)));
        assert_eq!(parse_timestamp("1464768000"), Some(time(8, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
