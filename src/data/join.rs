use std::collections::HashMap;

use super::error::{PipelineError, Result};
use super::model::{ClassificationRecord, EnrichedRecord, SectorCode, WageRecord};

/// Reject a classification projection that holds more than one row for a
/// `code3`.  Reports the smallest offending code.
pub fn check_unique_codes(classification: &[ClassificationRecord]) -> Result<()> {
    let mut counts: HashMap<SectorCode, usize> = HashMap::new();
    for record in classification {
        *counts.entry(record.code3).or_default() += 1;
    }
    match counts.into_iter().filter(|(_, n)| *n > 1).min() {
        Some((code3, variants)) => Err(PipelineError::JoinIntegrity { code3, variants }),
        None => Ok(()),
    }
}

/// Left outer join of the wage series onto the classification on `code3`.
///
/// The output has exactly one row per wage row, in wage order.
pub fn join(
    wages: &[WageRecord],
    classification: &[ClassificationRecord],
) -> Result<Vec<EnrichedRecord>> {
    check_unique_codes(classification)?;

    let by_code: HashMap<SectorCode, &ClassificationRecord> =
        classification.iter().map(|c| (c.code3, c)).collect();

    let enriched: Vec<EnrichedRecord> = wages
        .iter()
        .map(|wage| EnrichedRecord {
            wage: wage.clone(),
            sector: by_code.get(&wage.code3).map(|c| (*c).clone()),
        })
        .collect();

    let unmatched = enriched.iter().filter(|r| r.sector.is_none()).count();
    if unmatched > 0 {
        log::warn!("{unmatched} wage rows have no classification entry");
    }
    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn sector(code: u32, desc: &str, letter: &str) -> ClassificationRecord {
        ClassificationRecord {
            code3: SectorCode(code),
            desc3: Some(desc.to_string()),
            code2: Some(SectorCode(code / 10)),
            desc2: None,
            letter: Some(letter.to_string()),
            letter_desc: None,
        }
    }

    fn wage(code: u32, month: u32, w: f64) -> WageRecord {
        WageRecord {
            date: NaiveDate::from_ymd_opt(2020, month, 1).unwrap(),
            code3: SectorCode(code),
            median_wage: w,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_join_preserves_row_count_and_order() {
        let classification = vec![sector(11, "Cultivos", "A"), sector(101, "Alimentos", "C")];
        let wages = vec![wage(101, 1, 10.0), wage(11, 1, 5.0), wage(101, 2, 11.0)];

        let enriched = join(&wages, &classification).unwrap();
        assert_eq!(enriched.len(), wages.len());
        for (row, source) in enriched.iter().zip(&wages) {
            assert_eq!(row.wage.code3, source.code3);
        }
        assert_eq!(enriched[0].letter(), Some("C"));
        assert_eq!(enriched[1].desc3(), Some("Cultivos"));
    }

    #[test]
    fn test_unmatched_code_has_null_descriptions() {
        let classification = vec![sector(11, "Cultivos", "A")];
        let wages = vec![wage(999, 1, 10.0)];

        let enriched = join(&wages, &classification).unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].wage.code3, SectorCode(999));
        assert!(enriched[0].sector.is_none());
        assert_eq!(enriched[0].letter(), None);
    }

    #[test]
    fn test_duplicate_code_fails_loudly() {
        let classification = vec![
            sector(11, "Cultivos", "A"),
            sector(11, "Cultivos agricolas", "A"),
            sector(12, "Ganaderia", "A"),
        ];
        let wages = vec![wage(11, 1, 10.0)];

        match join(&wages, &classification).unwrap_err() {
            PipelineError::JoinIntegrity { code3, variants } => {
                assert_eq!(code3, SectorCode(11));
                assert_eq!(variants, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_wages_join_to_empty() {
        let enriched = join(&[], &[sector(11, "Cultivos", "A")]).unwrap();
        assert!(enriched.is_empty());
    }
}
