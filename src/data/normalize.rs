//! Schema normalization: typed dates, canonical sector codes and the
//! deduplicated projection of the CLAE dictionary.
//!
//! Parsing is strict. One bad value rejects the whole batch; rows are never
//! silently dropped. Row numbers in errors are 1-based data rows (the header
//! is not counted).

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use super::error::{PipelineError, Result};
use super::model::{columns, ClassificationRecord, FieldValue, RawTable, SectorCode, WageRecord};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse every value of `column` into a calendar date.
pub fn normalize_dates(table: &RawTable, column: &str) -> Result<Vec<NaiveDate>> {
    table
        .column(column)?
        .enumerate()
        .map(|(i, value)| {
            parse_date(value).ok_or_else(|| PipelineError::InvalidDate {
                row: i + 1,
                value: value.to_string(),
            })
        })
        .collect()
}

fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    let text = match value {
        FieldValue::Date(d) => return Some(*d),
        FieldValue::String(s) => s.trim(),
        _ => return None,
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        // Month-only values (`2020-01`) mean the first of the month.
        .or_else(|| NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok())
}

/// Normalize one cell to a [`SectorCode`].
///
/// Accepts non-negative integers, integral floats and numeric text; leading
/// zeros are not significant.
pub fn sector_code(value: &FieldValue, row: usize, column: &str) -> Result<SectorCode> {
    let code = match value {
        FieldValue::Integer(i) => u32::try_from(*i).ok(),
        FieldValue::Float(f) => integral_float(*f),
        FieldValue::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_float))
        }
        _ => None,
    };
    code.map(SectorCode)
        .ok_or_else(|| PipelineError::InvalidSectorCode {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn integral_float(f: f64) -> Option<u32> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

fn median_wage(value: &FieldValue, row: usize) -> Result<f64> {
    value
        .as_f64()
        .filter(|w| w.is_finite() && *w >= 0.0)
        .ok_or_else(|| PipelineError::InvalidNumber {
            row,
            column: columns::WAGE.to_string(),
            value: value.to_string(),
        })
}

/// Type the raw wage series: dates, codes and non-negative wages.  Every other
/// column is carried through unchanged.
pub fn wage_table(raw: &RawTable) -> Result<Vec<WageRecord>> {
    let dates = normalize_dates(raw, columns::DATE)?;
    let date_idx = raw.column_index(columns::DATE)?;
    let code_idx = raw.column_index(columns::CODE3)?;
    let wage_idx = raw.column_index(columns::WAGE)?;

    raw.rows
        .iter()
        .zip(dates)
        .enumerate()
        .map(|(i, (row, date))| {
            let extra: BTreeMap<String, FieldValue> = raw
                .headers
                .iter()
                .zip(row)
                .enumerate()
                .filter(|(idx, _)| ![date_idx, code_idx, wage_idx].contains(idx))
                .map(|(_, (h, v))| (h.clone(), v.clone()))
                .collect();

            Ok(WageRecord {
                date,
                code3: sector_code(&row[code_idx], i + 1, columns::CODE3)?,
                median_wage: median_wage(&row[wage_idx], i + 1)?,
                extra,
            })
        })
        .collect()
}

/// Select the six descriptive CLAE columns and drop exact-duplicate rows,
/// keeping first-occurrence order.
///
/// The result has no duplicate full rows but may still hold several rows per
/// `code3`; [`super::join::check_unique_codes`] rejects that case.
pub fn project_classification(table: &RawTable) -> Result<Vec<ClassificationRecord>> {
    let [code3, desc3, code2, desc2, letter, letter_desc] =
        columns::CLASSIFICATION.map(|c| table.column_index(c));
    let (code3, desc3, code2, desc2, letter, letter_desc) =
        (code3?, desc3?, code2?, desc2?, letter?, letter_desc?);

    let mut seen = HashSet::new();
    let mut projected = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        let record = ClassificationRecord {
            code3: sector_code(&row[code3], i + 1, columns::CODE3)?,
            desc3: row[desc3].to_text(),
            code2: match &row[code2] {
                FieldValue::Null => None,
                value => Some(sector_code(value, i + 1, columns::CODE2)?),
            },
            desc2: row[desc2].to_text(),
            letter: row[letter].to_text(),
            letter_desc: row[letter_desc].to_text(),
        };
        if seen.insert(record.clone()) {
            projected.push(record);
        }
    }

    log::debug!(
        "Projected classification '{}': {} rows -> {} distinct",
        table.name,
        table.len(),
        projected.len()
    );
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::String(s.to_string())
    }

    /// Wage row for clae3 11 with the given date cell.
    fn dated(date: &str) -> Vec<FieldValue> {
        vec![
            text(date),
            FieldValue::Integer(11),
            FieldValue::Float(1.0),
            FieldValue::Null,
        ]
    }

    fn wages(rows: Vec<Vec<FieldValue>>) -> RawTable {
        RawTable {
            name: "Mensuales".to_string(),
            headers: vec![
                "fecha".into(),
                "clae3".into(),
                "w_median".into(),
                "region".into(),
            ],
            rows,
        }
    }

    #[test]
    fn test_normalize_dates_accepts_iso_variants() {
        let table = wages(vec![
            dated("2020-01-01"),
            dated("2020-02-01 00:00:00"),
            dated("2020-03"),
        ]);
        let dates = normalize_dates(&table, "fecha").unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_normalize_dates_rejects_whole_batch() {
        let table = wages(vec![dated("2020-01-01"), dated("enero 2020")]);
        match normalize_dates(&table, "fecha").unwrap_err() {
            PipelineError::InvalidDate { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "enero 2020");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sector_code_canonical_forms_agree() {
        let forms = [
            FieldValue::Integer(11),
            FieldValue::Float(11.0),
            text("011"),
            text(" 11 "),
        ];
        for form in &forms {
            assert_eq!(sector_code(form, 1, "clae3").unwrap(), SectorCode(11));
        }
    }

    #[test]
    fn test_sector_code_rejects_fractional_and_negative() {
        assert!(sector_code(&FieldValue::Float(11.5), 1, "clae3").is_err());
        assert!(sector_code(&FieldValue::Integer(-1), 1, "clae3").is_err());
        assert!(sector_code(&FieldValue::Null, 1, "clae3").is_err());
        assert!(sector_code(&text("A"), 1, "clae3").is_err());
    }

    #[test]
    fn test_wage_table_keeps_passthrough_columns() {
        let table = wages(vec![vec![
            text("2020-01-01"),
            text("11"),
            FieldValue::Integer(250),
            text("NOA"),
        ]]);
        let records = wage_table(&table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code3, SectorCode(11));
        assert_eq!(records[0].median_wage, 250.0);
        assert_eq!(records[0].extra.len(), 1);
        assert_eq!(records[0].extra["region"], text("NOA"));
    }

    #[test]
    fn test_wage_table_rejects_negative_and_missing_wage() {
        for bad in [FieldValue::Float(-3.0), FieldValue::Null] {
            let table = wages(vec![vec![
                text("2020-01-01"),
                FieldValue::Integer(11),
                bad,
                FieldValue::Null,
            ]]);
            assert!(matches!(
                wage_table(&table).unwrap_err(),
                PipelineError::InvalidNumber { .. }
            ));
        }
    }

    #[test]
    fn test_project_classification_drops_exact_duplicates() {
        let table = RawTable {
            name: "Clases".to_string(),
            headers: vec![
                "clae6".into(),
                "clae3".into(),
                "clae3_desc".into(),
                "clae2".into(),
                "clae2_desc".into(),
                "letra".into(),
                "letra_desc".into(),
            ],
            rows: vec![
                vec![
                    FieldValue::Integer(11111),
                    FieldValue::Integer(11),
                    text("Cultivos"),
                    FieldValue::Integer(1),
                    text("Agro"),
                    text("A"),
                    text("Agricultura"),
                ],
                vec![
                    FieldValue::Integer(11112),
                    FieldValue::Integer(11),
                    text("Cultivos"),
                    FieldValue::Integer(1),
                    text("Agro"),
                    text("A"),
                    text("Agricultura"),
                ],
                vec![
                    FieldValue::Integer(31100),
                    FieldValue::Integer(311),
                    text("Pesca"),
                    FieldValue::Null,
                    FieldValue::Null,
                    text("A"),
                    text("Agricultura"),
                ],
            ],
        };
        let projected = project_classification(&table).unwrap();
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].code3, SectorCode(11));
        assert_eq!(projected[1].code3, SectorCode(311));
        assert_eq!(projected[1].code2, None);
        assert_eq!(projected[1].desc2, None);
    }
}
