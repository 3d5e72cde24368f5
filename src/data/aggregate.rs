//! Grouped reductions consumed by the charts.
//!
//! Every table is recomputed from the feature table on demand and has a
//! deterministic order, so serializing the same input twice is byte-identical.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{FeatureRecord, SectorCode};

// ---------------------------------------------------------------------------
// Aggregate rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateMean {
    pub date: NaiveDate,
    pub mean_wage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterMean {
    pub letter: String,
    pub mean_wage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorMean {
    pub code3: SectorCode,
    pub desc3: String,
    pub mean_wage: f64,
}

/// Five-number summary of the wages of one letter, for box charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterSpread {
    pub letter: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

/// Running `(sum, count)` per key.
fn group_means<K: Ord>(pairs: impl Iterator<Item = (K, f64)>) -> BTreeMap<K, f64> {
    let mut acc: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (key, value) in pairs {
        let entry = acc.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Mean wage per date, ascending by date.
pub fn mean_by_date(table: &[FeatureRecord]) -> Vec<DateMean> {
    group_means(table.iter().map(|r| (r.date(), r.median_wage())))
        .into_iter()
        .map(|(date, mean_wage)| DateMean { date, mean_wage })
        .collect()
}

/// Mean wage per sector letter, highest first.  Rows without a letter are
/// left out.
pub fn mean_by_letter(table: &[FeatureRecord]) -> Vec<LetterMean> {
    let mut out: Vec<LetterMean> = group_means(
        table
            .iter()
            .filter_map(|r| Some((r.letter()?.to_string(), r.median_wage()))),
    )
    .into_iter()
    .map(|(letter, mean_wage)| LetterMean { letter, mean_wage })
    .collect();
    // Stable sort keeps ties in letter order.
    out.sort_by(|a, b| b.mean_wage.total_cmp(&a.mean_wage));
    out
}

/// The `n` best-paid 3-digit sectors of `year`, highest first.
///
/// Rows without a `desc3` are left out.  Empty when the year has no rows.
pub fn top_n_by_code3(table: &[FeatureRecord], year: i32, n: usize) -> Vec<SectorMean> {
    let mut out: Vec<SectorMean> = group_means(
        table
            .iter()
            .filter(|r| r.year == year)
            .filter_map(|r| Some(((r.code3(), r.desc3()?.to_string()), r.median_wage()))),
    )
    .into_iter()
    .map(|((code3, desc3), mean_wage)| SectorMean {
        code3,
        desc3,
        mean_wage,
    })
    .collect();
    out.sort_by(|a, b| b.mean_wage.total_cmp(&a.mean_wage));
    out.truncate(n);
    out
}

pub fn latest_year(table: &[FeatureRecord]) -> Option<i32> {
    table.iter().map(|r| r.year).max()
}

/// Distinct years, ascending.
pub fn available_years(table: &[FeatureRecord]) -> Vec<i32> {
    let mut years: Vec<i32> = table.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Wage distribution per letter, in letter order.
pub fn spread_by_letter(table: &[FeatureRecord]) -> Vec<LetterSpread> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in table {
        if let Some(letter) = r.letter() {
            groups.entry(letter).or_default().push(r.median_wage());
        }
    }

    groups
        .into_iter()
        .map(|(letter, mut wages)| {
            wages.sort_by(f64::total_cmp);
            LetterSpread {
                letter: letter.to_string(),
                count: wages.len(),
                min: wages[0],
                q1: quantile(&wages, 0.25),
                median: quantile(&wages, 0.5),
                q3: quantile(&wages, 0.75),
                max: wages[wages.len() - 1],
            }
        })
        .collect()
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ---------------------------------------------------------------------------
// Chart bundle
// ---------------------------------------------------------------------------

/// All chart tables for one year selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    /// The year the top-N table was filtered to.
    pub year: Option<i32>,
    pub by_date: Vec<DateMean>,
    pub by_letter: Vec<LetterMean>,
    pub top_sectors: Vec<SectorMean>,
    pub spread_by_letter: Vec<LetterSpread>,
}

impl Aggregates {
    /// `year = None` selects the latest year present in `table`.
    pub fn compute(table: &[FeatureRecord], year: Option<i32>, top_n: usize) -> Self {
        let year = year.or_else(|| latest_year(table));
        Self {
            year,
            by_date: mean_by_date(table),
            by_letter: mean_by_letter(table),
            top_sectors: year
                .map(|y| top_n_by_code3(table, y, top_n))
                .unwrap_or_default(),
            spread_by_letter: spread_by_letter(table),
        }
    }
}
