use std::path::PathBuf;

use thiserror::Error;

use super::model::SectorCode;

/// Every way the wage pipeline can reject a batch.
///
/// All variants are fatal: the pipeline never recovers from a partially
/// valid input pair.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An input file could not be opened or read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file (ragged rows, bad UTF-8, ...).
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// The file content does not match the layout expected for its extension.
    #[error("Unsupported table layout in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// A column needed downstream is absent from the header.
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Strict date parsing rejected a value.
    #[error("Row {row}: '{value}' is not a valid date")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}, column '{column}': '{value}' is not a valid number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}, column '{column}': '{value}' is not a valid sector code")]
    InvalidSectorCode {
        row: usize,
        column: String,
        value: String,
    },

    /// The classification dictionary maps one code to several descriptions,
    /// which would fan out the join.
    #[error("Classification is not unique for clae3 {code3}: {variants} distinct rows")]
    JoinIntegrity { code3: SectorCode, variants: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
