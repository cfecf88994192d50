use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use common::types::config::ClusteringConfig;
use common::types::trip::{Coord, Trip};

/// 2016-06-01 08:00, the first pickup of most fixtures.
pub(crate) fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 6, 1).unwrap()
        .and_hms_opt(8, 0, 0).unwrap()
}

pub(crate) fn minutes_after_start(minutes: f64) -> NaiveDateTime {
    start_time() + TimeDelta::milliseconds((minutes * 60_000.0) as i64)
}

pub(crate) fn trip(x0: f64, y0: f64, minutes: f64, x1: f64, y1: f64, passengers: u32) -> Trip {
    let pickup_time = minutes_after_start(minutes);
    Trip {
        pickup: Coord { x: x0, y: y0 },
        pickup_time,
        dropoff: Coord { x: x1, y: y1 },
        dropoff_time: Some(pickup_time + TimeDelta::minutes(15)),
        passenger_count: passengers,
        fare: None,
    }
}

/// `count` single passenger trips from around (x, y) to (x + 10, y + 10), all picked up within a
/// few minutes after `minutes`.
pub(crate) fn tight_group(x: f64, y: f64, minutes: f64, count: usize) -> Vec<Trip> {
    (0..count)
        .map(|i| {
            let jitter = 0.01 * i as f64;
            trip(x + jitter, y - jitter, minutes + 0.1 * i as f64, x + 10.0 + jitter, y + 10.0, 1)
        })
        .collect()
}

/// Coordinates are taken as distance units.
pub(crate) fn unit_config() -> ClusteringConfig {
    ClusteringConfig {
        coordinate_scale: 1.0,
        ..ClusteringConfig::default()
    }
}
