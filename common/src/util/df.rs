use polars::error::PolarsError;
use polars::frame::DataFrame;
use polars::io::SerWriter;
use polars::prelude::{CsvWriter, ParquetWriter};
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use crate::types::config::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    CSV,
    PARQUET,
}

impl From<OutputFormat> for FileType {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Csv => FileType::CSV,
            OutputFormat::Parquet => FileType::PARQUET,
        }
    }
}

pub fn write_df_to_file(
    path: PathBuf,
    format: FileType,
    mut df: DataFrame
) -> Result<(), PolarsError> {
    let mut file = prepare_file(&path)?;

    match format {
        FileType::CSV => {
            CsvWriter::new(&mut file).finish(&mut df)?;
        },
        FileType::PARQUET => {
            ParquetWriter::new(&mut file).finish(&mut df)?;
        },
    };

    Ok(())
}

fn prepare_file(
    path: &Path,
) -> Result<File, std::io::Error> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file = File::create(path)?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::prelude::{CsvReadOptions, SerReader};

    #[test]
    fn test_write_csv_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("labels.csv");
        let df = df!(
            "passenger" => [0u32, 1, 2],
            "cluster_label" => [0i64, 0, -1],
        ).unwrap();

        write_df_to_file(path.clone(), FileType::CSV, df.clone()).unwrap();

        let read_back = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path))
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(read_back.shape(), df.shape());
        assert_eq!(
            read_back.column("cluster_label").unwrap().i64().unwrap().to_vec(),
            vec![Some(0), Some(0), Some(-1)],
        );
    }

    #[test]
    fn test_output_format_to_file_type() {
        assert_eq!(FileType::from(OutputFormat::Csv), FileType::CSV);
        assert_eq!(FileType::from(OutputFormat::Parquet), FileType::PARQUET);
    }
}
