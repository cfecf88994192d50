use std::fmt;
use std::fmt::Display;

use common::types::trip::{parse_timestamp, MalformedRecord, Trip, TripRecord};
use log::{debug, warn};
use polars::error::PolarsError;
use polars::frame::DataFrame;

use crate::step1_import::*;

// Only the first few malformed records are logged as warnings, the remaining ones at debug level.
const MAX_REPORTED_RECORDS: usize = 20;

pub struct ValidateStepOutput {
    pub trips: Vec<Trip>,
    pub rejected: Vec<MalformedRecord>,
}

pub fn validate_trips(
    ImportStepOutput { frame, has_dropoff_time, has_fare }: ImportStepOutput
) -> Result<ValidateStepOutput, ValidateError> {
    let height = frame.height();

    let pickup_x = f64_values(&frame, PICKUP_X)?;
    let pickup_y = f64_values(&frame, PICKUP_Y)?;
    let pickup_time = time_values(&frame, PICKUP_TIME)?;
    let dropoff_x = f64_values(&frame, DROPOFF_X)?;
    let dropoff_y = f64_values(&frame, DROPOFF_Y)?;
    let passenger_count: Vec<Option<i64>> = frame.column(PASSENGER_COUNT)?.i64()?.into_iter().collect();
    let dropoff_time = if has_dropoff_time { time_values(&frame, DROPOFF_TIME)? } else { vec![None; height] };
    let fare = if has_fare { f64_values(&frame, FARE)? } else { vec![None; height] };

    let mut trips = Vec::with_capacity(height);
    let mut rejected = Vec::new();

    for row in 0..height {
        let record = TripRecord {
            pickup_x: pickup_x[row],
            pickup_y: pickup_y[row],
            pickup_time: pickup_time[row],
            dropoff_x: dropoff_x[row],
            dropoff_y: dropoff_y[row],
            dropoff_time: dropoff_time[row],
            passenger_count: passenger_count[row],
            fare: fare[row],
        };

        match record.validate(row) {
            Ok(trip) => trips.push(trip),
            Err(malformed) => {
                if rejected.len() < MAX_REPORTED_RECORDS {
                    warn!(target: "validation", "Skipping record: {}", malformed);
                } else {
                    debug!(target: "validation", "Skipping record: {}", malformed);
                }
                rejected.push(malformed);
            }
        }
    }

    if rejected.len() > MAX_REPORTED_RECORDS {
        warn!(
            target: "validation",
            "{} more malformed records were skipped (see debug log)",
            rejected.len() - MAX_REPORTED_RECORDS,
        );
    }

    Ok(ValidateStepOutput { trips, rejected })
}

fn f64_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, PolarsError> {
    Ok(frame.column(name)?.f64()?.into_iter().collect())
}

fn time_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<chrono::NaiveDateTime>>, PolarsError> {
    Ok(frame.column(name)?.str()?.into_iter()
        .map(|value| value.and_then(parse_timestamp))
        .collect())
}

#[derive(thiserror::Error, Debug)]
pub enum ValidateError {
    Polars(#[from] PolarsError),
}

impl Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidateError::Polars(err) => write!(f, "Reading trip columns failed: {err}"),
        }
    }
}
