//! Trend features derived from the enriched wage table.
//!
//! Every function is pure and returns one value per input row, in input
//! order, so the columns can be zipped back onto the table.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use super::model::{EnrichedRecord, FeatureRecord, SectorCode};

/// `(current - previous) / previous`, undefined for a zero base.
fn pct_change(previous: f64, current: f64) -> Option<f64> {
    (previous != 0.0).then(|| (current - previous) / previous)
}

/// Row indices per sector, each group sorted by date (stable for equal dates).
fn indices_by_sector(records: &[EnrichedRecord]) -> BTreeMap<SectorCode, Vec<usize>> {
    let mut groups: BTreeMap<SectorCode, Vec<usize>> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        groups.entry(r.wage.code3).or_default().push(i);
    }
    for idx in groups.values_mut() {
        idx.sort_by_key(|&i| records[i].wage.date);
    }
    groups
}

/// Change against the previous observation of the same sector.  `None` for
/// the first observation of each sector.
pub fn month_over_month_change(records: &[EnrichedRecord]) -> Vec<Option<f64>> {
    let mut out = vec![None; records.len()];
    for idx in indices_by_sector(records).values() {
        for pair in idx.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            out[cur] = pct_change(records[prev].wage.median_wage, records[cur].wage.median_wage);
        }
    }
    out
}

/// Change against the same month of the previous year for the same sector.
///
/// The reference is looked up by calendar key, so a missing month leaves a
/// gap instead of shifting later comparisons.  When a (sector, year, month)
/// key repeats, its first row is the reference.
pub fn year_over_year_change(records: &[EnrichedRecord]) -> Vec<Option<f64>> {
    let mut reference: HashMap<(SectorCode, i32, u32), f64> = HashMap::new();
    for r in records {
        let d = r.wage.date;
        reference
            .entry((r.wage.code3, d.year(), d.month()))
            .or_insert(r.wage.median_wage);
    }

    records
        .iter()
        .map(|r| {
            let d = r.wage.date;
            reference
                .get(&(r.wage.code3, d.year() - 1, d.month()))
                .and_then(|&prev| pct_change(prev, r.wage.median_wage))
        })
        .collect()
}

/// Descending rank of the wage within its calendar year.  Ties get the
/// average of the positions they occupy.
pub fn rank_within_year(records: &[EnrichedRecord]) -> Vec<f64> {
    let mut by_year: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        by_year.entry(r.wage.date.year()).or_default().push(i);
    }

    let mut ranks = vec![0.0; records.len()];
    for mut idx in by_year.into_values() {
        idx.sort_by(|&a, &b| {
            records[b]
                .wage
                .median_wage
                .total_cmp(&records[a].wage.median_wage)
        });

        let mut start = 0;
        while start < idx.len() {
            let wage = records[idx[start]].wage.median_wage;
            let end = start
                + idx[start..]
                    .iter()
                    .take_while(|&&i| records[i].wage.median_wage == wage)
                    .count();
            // Positions start+1 ..= end share their mean.
            let rank = (start + 1 + end) as f64 / 2.0;
            for &i in &idx[start..end] {
                ranks[i] = rank;
            }
            start = end;
        }
    }
    ranks
}

/// Wage minus the mean wage of its (date, letter) group.  Rows without a
/// letter belong to no group and get `None`.
pub fn deviation_from_sector_mean(records: &[EnrichedRecord]) -> Vec<Option<f64>> {
    let mut groups: HashMap<(NaiveDate, &str), (f64, usize)> = HashMap::new();
    for r in records {
        if let Some(letter) = r.letter() {
            let acc = groups.entry((r.wage.date, letter)).or_insert((0.0, 0));
            acc.0 += r.wage.median_wage;
            acc.1 += 1;
        }
    }

    records
        .iter()
        .map(|r| {
            let letter = r.letter()?;
            let (sum, n) = groups.get(&(r.wage.date, letter))?;
            Some(r.wage.median_wage - sum / *n as f64)
        })
        .collect()
}

/// Attach calendar parts and all trend features to every enriched row.
pub fn derive_features(enriched: Vec<EnrichedRecord>) -> Vec<FeatureRecord> {
    let mom = month_over_month_change(&enriched);
    let yoy = year_over_year_change(&enriched);
    let ranks = rank_within_year(&enriched);
    let deviations = deviation_from_sector_mean(&enriched);

    enriched
        .into_iter()
        .zip(mom)
        .zip(yoy)
        .zip(ranks)
        .zip(deviations)
        .map(|((((record, mom), yoy), rank), deviation)| FeatureRecord {
            year: record.wage.date.year(),
            month: record.wage.date.month(),
            month_over_month_change: mom,
            year_over_year_change: yoy,
            rank_within_year: rank,
            deviation_from_sector_mean: deviation,
            record,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

pub const PREVIEW_COLUMNS: [&str; 9] = [
    "fecha",
    "clae3",
    "w_median",
    "anio",
    "mes",
    "var_mensual",
    "var_anual",
    "ranking_anual",
    "desvio_sector",
];

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "<null>".to_string(), |v| format!("{v:.precision$}"))
}

/// The first `n` rows of the feature table as display cells, one cell per
/// [`PREVIEW_COLUMNS`] entry.
pub fn preview(table: &[FeatureRecord], n: usize) -> Vec<[String; 9]> {
    table
        .iter()
        .take(n)
        .map(|r| {
            [
                r.date().to_string(),
                r.code3().to_string(),
                format!("{:.2}", r.median_wage()),
                r.year.to_string(),
                r.month.to_string(),
                fmt_opt(r.month_over_month_change, 4),
                fmt_opt(r.year_over_year_change, 4),
                format!("{:.1}", r.rank_within_year),
                fmt_opt(r.deviation_from_sector_mean, 2),
            ]
        })
        .collect()
}
