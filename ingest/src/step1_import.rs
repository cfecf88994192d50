use std::fmt;
use std::fmt::Display;

use common::types::config::{ColumnNames, InputConfig, InputFormat};
use log::debug;
use polars::datatypes::DataType;
use polars::error::PolarsError;
use polars::frame::DataFrame;
use polars::prelude::{col, Expr, LazyCsvReader, LazyFileListReader, LazyFrame, ScanArgsParquet};

// Canonical column names of the imported frame. The configured input names are renamed to these.
pub const PICKUP_X: &str = "pickup_x";
pub const PICKUP_Y: &str = "pickup_y";
pub const PICKUP_TIME: &str = "pickup_time";
pub const DROPOFF_X: &str = "dropoff_x";
pub const DROPOFF_Y: &str = "dropoff_y";
pub const DROPOFF_TIME: &str = "dropoff_time";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const FARE: &str = "fare";

pub struct ImportStepOutput {
    pub frame: DataFrame,
    pub has_dropoff_time: bool,
    pub has_fare: bool,
}

pub fn import_trips(input: &InputConfig) -> Result<ImportStepOutput, ImportError> {
    let frame = match input.format {
        InputFormat::Csv => LazyCsvReader::new(&input.path)
            .with_has_header(true)
            .finish()?,
        InputFormat::Parquet => LazyFrame::scan_parquet(&input.path, ScanArgsParquet::default())?,
    };

    debug!(target: "ingest", "Importing trips from '{}' ({:?})", input.path.display(), input.format);

    select_trip_columns(frame, &input.columns)
}

/// Selects the trip columns under their canonical names and casts them to the types validation
/// expects. Times are read as text, so that both UNIX seconds and formatted timestamps can be
/// parsed later. Values that fail to cast become null and are reported as malformed records.
pub fn select_trip_columns(
    mut frame: LazyFrame,
    columns: &ColumnNames,
) -> Result<ImportStepOutput, ImportError> {
    let schema = frame.collect_schema()?;
    let has_column = |name: &str| schema.get(name).is_some();

    let required = [
        (&columns.pickup_x, PICKUP_X, DataType::Float64),
        (&columns.pickup_y, PICKUP_Y, DataType::Float64),
        (&columns.pickup_time, PICKUP_TIME, DataType::String),
        (&columns.dropoff_x, DROPOFF_X, DataType::Float64),
        (&columns.dropoff_y, DROPOFF_Y, DataType::Float64),
        (&columns.passenger_count, PASSENGER_COUNT, DataType::Int64),
    ];
    let optional = [
        (&columns.dropoff_time, DROPOFF_TIME, DataType::String),
        (&columns.fare, FARE, DataType::Float64),
    ];

    if let Some((missing, _, _)) = required.iter().find(|(name, _, _)| !has_column(name)) {
        return Err(ImportError::MissingColumn(missing.to_string()));
    }

    let has_dropoff_time = has_column(&columns.dropoff_time);
    let has_fare = has_column(&columns.fare);

    let selection: Vec<Expr> = required.into_iter()
        .chain(optional.into_iter().filter(|(name, _, _)| has_column(name)))
        .map(|(name, canonical, dtype)| col(name.as_str()).cast(dtype).alias(canonical))
        .collect();

    let frame = frame
        .select(selection)
        .collect()?;

    Ok(ImportStepOutput { frame, has_dropoff_time, has_fare })
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    Polars(#[from] PolarsError),
    MissingColumn(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImportError::Polars(err) => write!(f, "{}", err),
            ImportError::MissingColumn(name) => write!(f, "Required column '{}' not found in input", name),
        }
    }
}
