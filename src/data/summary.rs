//! Profile of the merged table: shape, wage statistics, coverage and
//! missing values.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::aggregate::{available_years, quantile};
use super::model::{columns, FeatureRecord, SectorCode};

/// Descriptive statistics of `w_median` (sample standard deviation,
/// linear-interpolated quartiles).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WageStats {
    pub count: usize,
    pub mean: f64,
    /// `None` for fewer than two observations.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl WageStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });

        Some(Self {
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    /// Columns of the merged table: wage columns plus the joined descriptions.
    pub columns: usize,
    pub wage: Option<WageStats>,
    pub years: Vec<i32>,
    pub distinct_sectors: usize,
    /// Rows whose `clae3` has no classification entry.
    pub unmatched_rows: usize,
    /// Null count per merged column, in column order.
    pub missing: Vec<MissingCount>,
}

/// Joined columns, after the wage columns (the shared `clae3` appears once).
const JOINED_COLUMNS: [&str; 5] = [
    columns::DESC3,
    columns::CODE2,
    columns::DESC2,
    columns::LETTER,
    columns::LETTER_DESC,
];

pub fn summarize(wage_headers: &[String], table: &[FeatureRecord]) -> DatasetSummary {
    let wages: Vec<f64> = table.iter().map(FeatureRecord::median_wage).collect();
    let sectors: BTreeSet<SectorCode> = table.iter().map(FeatureRecord::code3).collect();

    let mut missing: Vec<MissingCount> = wage_headers
        .iter()
        .map(|h| MissingCount {
            column: h.clone(),
            // Typed columns are validated non-null by the normalizer.
            count: table
                .iter()
                .filter(|r| r.record.wage.extra.get(h).is_some_and(|v| v.is_null()))
                .count(),
        })
        .collect();

    for column in JOINED_COLUMNS {
        let count = table
            .iter()
            .filter(|r| match &r.record.sector {
                None => true,
                Some(s) => match column {
                    columns::DESC3 => s.desc3.is_none(),
                    columns::CODE2 => s.code2.is_none(),
                    columns::DESC2 => s.desc2.is_none(),
                    columns::LETTER => s.letter.is_none(),
                    _ => s.letter_desc.is_none(),
                },
            })
            .count();
        missing.push(MissingCount {
            column: column.to_string(),
            count,
        });
    }

    DatasetSummary {
        rows: table.len(),
        columns: wage_headers.len() + JOINED_COLUMNS.len(),
        wage: WageStats::from_values(&wages),
        years: available_years(table),
        distinct_sectors: sectors.len(),
        unmatched_rows: table.iter().filter(|r| r.record.sector.is_none()).count(),
        missing,
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merged table: {} rows x {} columns", self.rows, self.columns)?;
        if let Some(w) = &self.wage {
            writeln!(
                f,
                "w_median: count={} mean={:.2} std={} min={:.2} 25%={:.2} 50%={:.2} 75%={:.2} max={:.2}",
                w.count,
                w.mean,
                w.std.map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}")),
                w.min,
                w.q25,
                w.median,
                w.q75,
                w.max
            )?;
        }
        writeln!(f, "Years: {:?}", self.years)?;
        writeln!(
            f,
            "Sectors (clae3): {} distinct, {} unmatched rows",
            self.distinct_sectors, self.unmatched_rows
        )?;
        write!(f, "Missing values:")?;
        for m in &self.missing {
            write!(f, " {}={}", m.column, m.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::derive_features;
    use crate::data::model::{ClassificationRecord, EnrichedRecord, FieldValue, WageRecord};
    use chrono::NaiveDate;

    fn row(code: u32, matched: bool, y: i32, w: f64, region: FieldValue) -> EnrichedRecord {
        EnrichedRecord {
            wage: WageRecord {
                date: NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
                code3: SectorCode(code),
                median_wage: w,
                extra: [("region".to_string(), region)].into_iter().collect(),
            },
            sector: matched.then(|| ClassificationRecord {
                code3: SectorCode(code),
                desc3: Some("Cultivos".to_string()),
                code2: None,
                desc2: Some("Agro".to_string()),
                letter: Some("A".to_string()),
                letter_desc: Some("Agricultura".to_string()),
            }),
        }
    }

    fn headers() -> Vec<String> {
        ["fecha", "clae3", "w_median", "region"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_wage_stats_match_describe() {
        let stats = WageStats::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert!((stats.std.unwrap() - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert_eq!(stats.q25, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q75, 3.25);
        assert!(WageStats::from_values(&[]).is_none());
        assert!(WageStats::from_values(&[5.0]).unwrap().std.is_none());
    }

    #[test]
    fn test_summarize_counts_missing_and_unmatched() {
        let table = derive_features(vec![
            row(11, true, 2019, 100.0, FieldValue::String("NOA".into())),
            row(11, true, 2020, 120.0, FieldValue::Null),
            row(999, false, 2020, 90.0, FieldValue::Null),
        ]);
        let summary = summarize(&headers(), &table);

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.columns, 9);
        assert_eq!(summary.years, vec![2019, 2020]);
        assert_eq!(summary.distinct_sectors, 2);
        assert_eq!(summary.unmatched_rows, 1);

        let missing = |col: &str| {
            summary
                .missing
                .iter()
                .find(|m| m.column == col)
                .map(|m| m.count)
                .unwrap()
        };
        assert_eq!(missing("fecha"), 0);
        assert_eq!(missing("region"), 2);
        assert_eq!(missing("clae3_desc"), 1);
        assert_eq!(missing("clae2"), 3);
        assert!(summary.to_string().contains("3 rows x 9 columns"));
    }
}
