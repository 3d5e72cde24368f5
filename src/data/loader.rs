use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{PipelineError, Result};
use super::model::{columns, FieldValue, RawTable};
use crate::config::PipelineConfig;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// The two raw tables the pipeline starts from.
#[derive(Debug, Clone)]
pub struct InputTables {
    pub classification: RawTable,
    pub wages: RawTable,
}

/// Load the classification dictionary and the wage series named in `config`,
/// checking the columns each one needs downstream.
pub fn load_inputs(config: &PipelineConfig) -> Result<InputTables> {
    let classification = load_table(&config.classification_path, &columns::CLASSIFICATION)?;
    let wages = load_table(&config.wages_path, &columns::WAGES)?;
    Ok(InputTables {
        classification,
        wages,
    })
}

/// Load one table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated, header row, types inferred per column
/// * `.parquet` – scalar columns (utf8, ints, floats, bool, date32)
/// * `.json`    – `[{ "fecha": "...", "clae3": 11, ... }, ...]`
pub fn load_table(path: &Path, required: &[&str]) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        other => {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("unknown file extension '.{other}'"),
            })
        }
    };
    table.require_columns(required)?;
    if table.is_empty() {
        log::warn!("Table '{}' in {} has no data rows", table.name, path.display());
    }

    log::info!(
        "Loaded table '{}' from {}: {} rows x {} columns",
        table.name,
        path.display(),
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_string()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// The reader is not flexible: a row with a different field count than the
/// header is a malformed file.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_reader(open(path)?);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut text_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        text_rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_column_kind(text_rows.iter().map(|row| row[col].as_str())))
        .collect();
    log::debug!("Inferred column kinds for {}: {kinds:?}", path.display());

    let rows = text_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(cell, kind)| kind.convert(cell))
                .collect()
        })
        .collect();

    Ok(RawTable {
        name: table_name(path),
        headers,
        rows,
    })
}

/// Column dtype, decided from every non-empty cell of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

fn infer_column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut any_value = false;

    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        any_value = true;
        all_int &= cell.parse::<i64>().is_ok();
        all_float &= cell.parse::<f64>().is_ok();
        all_bool &= cell == "true" || cell == "false";
        if !all_int && !all_float && !all_bool {
            return ColumnKind::Text;
        }
    }

    if !any_value {
        ColumnKind::Text
    } else if all_int {
        ColumnKind::Integer
    } else if all_float {
        ColumnKind::Float
    } else if all_bool {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

impl ColumnKind {
    fn convert(self, cell: String) -> FieldValue {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }
        match self {
            ColumnKind::Integer => trimmed
                .parse()
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            ColumnKind::Float => trimmed
                .parse()
                .map(FieldValue::Float)
                .unwrap_or(FieldValue::Null),
            ColumnKind::Bool => FieldValue::Bool(trimmed == "true"),
            ColumnKind::Text => FieldValue::String(cell),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).  The header is the
/// union of all keys in first-seen file order; a key missing from a record is
/// a null cell.
fn load_json(path: &Path) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_reader(std::io::BufReader::new(open(path)?))?;

    let records = root
        .as_array()
        .ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "expected a top-level JSON array".to_string(),
        })?;

    let mut objects = Vec::with_capacity(records.len());
    let mut seen = BTreeSet::new();
    let mut headers = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("row {i} is not a JSON object"),
            })?;
        for key in obj.keys() {
            if seen.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_field).unwrap_or(FieldValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable {
        name: table_name(path),
        headers,
        rows,
    })
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars
/// (`df.write_parquet()`).  Every column becomes one table column.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_field(col, row))
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(RawTable {
        name: table_name(path),
        headers,
        rows,
    })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_field(col: &Arc<dyn Array>, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => FieldValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => FieldValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => FieldValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => FieldValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => FieldValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => FieldValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => FieldValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Null),
        _ => FieldValue::String(arrow::util::display::array_value_to_string(col, row)?),
    };
    Ok(value)
}
