use std::fmt;
use std::fmt::Display;

use common::types::config::InputConfig;
use common::types::trip::{MalformedRecord, Trip};
use log::info;

use crate::step1_import::{import_trips, ImportError};
use crate::step2_validate::{validate_trips, ValidateError, ValidateStepOutput};

pub mod step1_import;
pub mod step2_validate;

/// Valid trips in input order, plus the rows that were dropped on the way.
pub struct IngestOutput {
    pub trips: Vec<Trip>,
    pub rejected: Vec<MalformedRecord>,
}

pub fn ingest(input: &InputConfig) -> Result<IngestOutput, IngestError> {
    let imported = import_trips(input)?;
    let ValidateStepOutput { trips, rejected } = validate_trips(imported)?;

    info!(
        target: "ingest",
        "Ingested {} trips ({} passengers) from '{}', dropped {} malformed records",
        trips.len(),
        trips.iter().map(|trip| trip.passenger_count as u64).sum::<u64>(),
        input.path.display(),
        rejected.len(),
    );

    Ok(IngestOutput { trips, rejected })
}

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    Import(#[from] ImportError),
    Validate(#[from] ValidateError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            IngestError::Import(err) => err,
            IngestError::Validate(err) => err,
        };
        write!(f, "{}", err)
    }
}
