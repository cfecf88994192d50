pub mod config;
pub mod errors;
pub mod trip;

// a continuous trip id
// "continuous" means that if we ingested n valid trips, all ids are from 0,...,n-1 and every
// number in that range is used. The id doubles as the index into the trip list.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TripId(pub u32);

impl TripId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// A global cluster label. Labels are continuous over the whole run: window 0 owns the first
// block of labels, window 1 the next one and so on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ClusterId(pub u32);

/// Noise is written as -1 wherever labels leave the process as plain integers.
pub const NOISE_LABEL: i64 = -1;

pub fn label_to_i64(label: Option<ClusterId>) -> i64 {
    label.map(|id| id.0 as i64).unwrap_or(NOISE_LABEL)
}
