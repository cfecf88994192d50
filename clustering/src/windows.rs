use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use common::types::config::{ClusteringConfig, MAX_WINDOW_MINUTES};
use common::types::errors::InvalidConfigError;
use log::{debug, warn};

use crate::features::PassengerInstance;

/// A half-open time interval `[start, end)` and the passengers picked up inside it, by index into
/// the passenger list (ascending).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub index: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub members: Vec<usize>,
}

impl TimeWindow {
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.end
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Pickups further apart than this are most likely a data error.
const MAX_SPAN_DAYS: i64 = 366;

/// Cuts the observation period into consecutive windows of `max_duration`. The first window
/// starts at `start_hour` on the day of the earliest pickup (or the day before, if that pickup
/// happened earlier in the day), so with the default of 24h windows starting at 06:00 a window
/// covers one "operating day".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindower {
    max_duration: TimeDelta,
    start_hour: u32,
}

impl TimeWindower {
    pub fn new(max_duration_minutes: u32, start_hour: u32) -> Result<Self, InvalidConfigError> {
        if max_duration_minutes == 0 || max_duration_minutes > MAX_WINDOW_MINUTES {
            return Err(InvalidConfigError::WindowDurationOutOfRange(max_duration_minutes));
        }
        if start_hour > 23 {
            return Err(InvalidConfigError::WindowStartHourOutOfRange(start_hour));
        }
        Ok(Self {
            max_duration: TimeDelta::minutes(max_duration_minutes as i64),
            start_hour,
        })
    }

    pub fn from_config(config: &ClusteringConfig) -> Result<Self, InvalidConfigError> {
        Self::new(config.max_window_duration, config.window_start_hour)
    }

    fn anchor(&self, earliest: NaiveDateTime) -> NaiveDateTime {
        let start_of_day = NaiveTime::from_hms_opt(self.start_hour, 0, 0)
            .unwrap_or(NaiveTime::MIN);
        let anchor = earliest.date().and_time(start_of_day);
        if anchor > earliest {
            anchor - TimeDelta::days(1)
        } else {
            anchor
        }
    }

    /// Every passenger ends up in exactly one window. Window `i` covers
    /// `[anchor + i * max_duration, anchor + (i + 1) * max_duration)`. Only windows with
    /// passengers are returned, in order, so a gap in the indices is a run of empty windows.
    pub fn partition(&self, passengers: &[PassengerInstance]) -> Vec<TimeWindow> {
        let Some(earliest) = passengers.iter().map(|p| p.pickup_time).min() else {
            return vec![];
        };
        let anchor = self.anchor(earliest);
        let window_seconds = self.max_duration.num_seconds();

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (passenger_index, passenger) in passengers.iter().enumerate() {
            let index = ((passenger.pickup_time - anchor).num_seconds() / window_seconds) as usize;
            members.entry(index).or_default().push(passenger_index);
        }

        let span = members.last_key_value().map_or(0, |(&last, _)| last + 1);
        if span as i64 * window_seconds > MAX_SPAN_DAYS * 24 * 60 * 60 {
            warn!(
                target: "windows",
                "Pickups span {} windows starting at {}, check the input for stray timestamps",
                span, anchor,
            );
        }

        let windows: Vec<TimeWindow> = members.into_iter()
            .map(|(index, members)| {
                let start = anchor + TimeDelta::seconds(index as i64 * window_seconds);
                TimeWindow { index, start, end: start + self.max_duration, members }
            })
            .collect();

        debug!(
            target: "windows",
            "Partitioned {} passengers into {} windows starting at {} ({} empty windows skipped)",
            passengers.len(), windows.len(), anchor, span - windows.len(),
        );

        windows
    }
}
