use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};

/// Column names of the CLAE input files.
pub mod columns {
    pub const DATE: &str = "fecha";
    pub const CODE3: &str = "clae3";
    pub const WAGE: &str = "w_median";
    pub const DESC3: &str = "clae3_desc";
    pub const CODE2: &str = "clae2";
    pub const DESC2: &str = "clae2_desc";
    pub const LETTER: &str = "letra";
    pub const LETTER_DESC: &str = "letra_desc";

    /// Projection kept from the classification dictionary, in output order.
    pub const CLASSIFICATION: [&str; 6] = [CODE3, DESC3, CODE2, DESC2, LETTER, LETTER_DESC];
    pub const WAGES: [&str; 3] = [DATE, CODE3, WAGE];
}

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common dataframe dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text form of a descriptive cell; `None` for nulls.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::String(s) if s.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – a loaded file before any domain typing
// ---------------------------------------------------------------------------

/// Header plus rows of inferred cells, as produced by the loader.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Human-readable table name (the file stem), used in error messages.
    pub name: String,
    pub headers: Vec<String>,
    /// Every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<FieldValue>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Fail on the first column of `columns` that the header lacks.
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            self.column_index(column)?;
        }
        Ok(())
    }

    /// All cells of one column, in row order.
    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &FieldValue> + '_> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }
}

// ---------------------------------------------------------------------------
// SectorCode – canonical CLAE code
// ---------------------------------------------------------------------------

/// Canonical representation of a CLAE code (`clae3`, `clae2`).
///
/// Both input tables are normalized to this type before joining, so `"011"`,
/// `11` and `11.0` all compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorCode(pub u32);

impl fmt::Display for SectorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Domain records
// ---------------------------------------------------------------------------

/// One projected row of the CLAE dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClassificationRecord {
    pub code3: SectorCode,
    pub desc3: Option<String>,
    pub code2: Option<SectorCode>,
    pub desc2: Option<String>,
    /// Top-level sector letter (`letra`).
    pub letter: Option<String>,
    pub letter_desc: Option<String>,
}

/// One monthly median-wage observation.
#[derive(Debug, Clone, PartialEq)]
pub struct WageRecord {
    pub date: NaiveDate,
    pub code3: SectorCode,
    pub median_wage: f64,
    /// Every other input column, keyed by header.
    pub extra: BTreeMap<String, FieldValue>,
}

/// A wage row with its classification attached (left join).
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub wage: WageRecord,
    /// `None` when the dictionary has no entry for `wage.code3`.
    pub sector: Option<ClassificationRecord>,
}

impl EnrichedRecord {
    pub fn letter(&self) -> Option<&str> {
        self.sector.as_ref().and_then(|s| s.letter.as_deref())
    }

    pub fn desc3(&self) -> Option<&str> {
        self.sector.as_ref().and_then(|s| s.desc3.as_deref())
    }
}

/// An enriched row with its derived trend features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub record: EnrichedRecord,
    pub year: i32,
    pub month: u32,
    pub month_over_month_change: Option<f64>,
    pub year_over_year_change: Option<f64>,
    /// 1 is the highest wage of the year; ties share their average rank.
    pub rank_within_year: f64,
    pub deviation_from_sector_mean: Option<f64>,
}

impl FeatureRecord {
    pub fn date(&self) -> NaiveDate {
        self.record.wage.date
    }

    pub fn code3(&self) -> SectorCode {
        self.record.wage.code3
    }

    pub fn median_wage(&self) -> f64 {
        self.record.wage.median_wage
    }

    pub fn letter(&self) -> Option<&str> {
        self.record.letter()
    }

    pub fn desc3(&self) -> Option<&str> {
        self.record.desc3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable {
            name: "Mensuales".to_string(),
            headers: vec!["fecha".into(), "clae3".into(), "w_median".into()],
            rows: vec![
                vec![
                    FieldValue::String("2020-01-01".into()),
                    FieldValue::Integer(11),
                    FieldValue::Float(100.0),
                ],
                vec![
                    FieldValue::String("2020-02-01".into()),
                    FieldValue::Integer(11),
                    FieldValue::Null,
                ],
            ],
        }
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let err = table().require_columns(&["fecha", "letra"]).unwrap_err();
        match err {
            PipelineError::MissingColumn { table, column } => {
                assert_eq!(table, "Mensuales");
                assert_eq!(column, "letra");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_column_iterates_in_row_order() {
        let t = table();
        let wages: Vec<_> = t.column("w_median").unwrap().cloned().collect();
        assert_eq!(wages, vec![FieldValue::Float(100.0), FieldValue::Null]);
    }

    #[test]
    fn test_to_text_treats_blank_as_null() {
        assert_eq!(FieldValue::String("  ".into()).to_text(), None);
        assert_eq!(FieldValue::Null.to_text(), None);
        assert_eq!(FieldValue::Integer(7).to_text(), Some("7".to_string()));
    }
}
