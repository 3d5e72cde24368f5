use super::aggregate::Aggregates;
use super::error::Result;
use super::features::{derive_features, preview, PREVIEW_COLUMNS};
use super::join::join;
use super::loader::{load_inputs, InputTables};
use super::model::FeatureRecord;
use super::normalize::{project_classification, wage_table};
use super::summary::{summarize, DatasetSummary};
use crate::config::PipelineConfig;

/// Rows of the feature table shown after each run.
pub const PREVIEW_ROWS: usize = 10;

/// Everything one batch run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: Vec<FeatureRecord>,
    pub summary: DatasetSummary,
}

impl PipelineOutput {
    /// Chart tables for `year` (latest when `None`).
    pub fn aggregates(&self, year: Option<i32>, top_n: usize) -> Aggregates {
        Aggregates::compute(&self.features, year, top_n)
    }
}

/// Load both inputs named in `config` and run every stage.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    let inputs = load_inputs(config)?;
    process(&inputs)
}

/// Run the stages after loading: normalize, project, join, derive, summarize.
pub fn process(inputs: &InputTables) -> Result<PipelineOutput> {
    let wages = wage_table(&inputs.wages)?;
    let classification = project_classification(&inputs.classification)?;
    log::info!(
        "Normalized {} wage rows and {} classification entries",
        wages.len(),
        classification.len()
    );

    let enriched = join(&wages, &classification)?;
    let features = derive_features(enriched);
    let summary = summarize(&inputs.wages.headers, &features);
    log::info!(
        "Derived features for {} rows across {} sectors",
        summary.rows,
        summary.distinct_sectors
    );
    log::debug!("{summary}");
    log::info!("Feature preview: {}", PREVIEW_COLUMNS.join(" | "));
    for row in preview(&features, PREVIEW_ROWS) {
        log::info!("  {}", row.join(" | "));
    }

    Ok(PipelineOutput {
        features,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::PipelineError;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const CLASES: &str = "\
clae6,clae6_desc,clae3,clae3_desc,clae2,clae2_desc,letra,letra_desc
11111,Trigo,11,Cultivos temporales,1,Agricultura,A,AGRO
11112,Maiz,11,Cultivos temporales,1,Agricultura,A,AGRO
101011,Frigorificos,101,Carnes,10,Alimentos,C,INDUSTRIA
";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    fn mensuales() -> String {
        let mut out = String::from("fecha,clae3,w_median\n");
        for year in 2019..=2020 {
            for month in 1..=12 {
                let t = ((year - 2019) * 12 + month) as f64;
                out.push_str(&format!("{year}-{month:02}-01,11,{}\n", 100.0 + t));
                out.push_str(&format!("{year}-{month:02}-01,101,{}\n", 200.0 + 2.0 * t));
                out.push_str(&format!("{year}-{month:02}-01,999,{}\n", 50.0));
            }
        }
        out
    }

    fn config(dir: &Path, clases: &str, mensuales: &str) -> PipelineConfig {
        PipelineConfig {
            classification_path: write_file(dir, "Clases.csv", clases),
            wages_path: write_file(dir, "Mensuales.csv", mensuales),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = TempDir::new().unwrap();
        let output = run(&config(dir.path(), CLASES, &mensuales())).unwrap();

        // Row count preserved: the projection is unique per clae3.
        assert_eq!(output.features.len(), 72);
        assert_eq!(output.summary.unmatched_rows, 24);
        assert_eq!(output.summary.years, vec![2019, 2020]);

        let aggregates = output.aggregates(None, 10);
        assert_eq!(aggregates.year, Some(2020));
        assert_eq!(aggregates.by_date.len(), 24);
        assert_eq!(aggregates.top_sectors.len(), 2);
        assert_eq!(aggregates.top_sectors[0].desc3, "Carnes");
        assert!(aggregates.top_sectors.iter().all(|s| s.mean_wage > 0.0));
    }

    #[test]
    fn test_run_feature_preview() {
        let dir = TempDir::new().unwrap();
        let output = run(&config(dir.path(), CLASES, &mensuales())).unwrap();

        let rows = preview(&output.features, PREVIEW_ROWS);
        assert_eq!(rows.len(), PREVIEW_ROWS);
        assert_eq!(
            rows[0],
            [
                "2019-01-01", "11", "101.00", "2019", "1", "<null>", "<null>", "24.0", "0.00",
            ]
            .map(String::from)
        );
        // Second observation of clae3 11: (102 - 101) / 101.
        assert_eq!(rows[3][0], "2019-02-01");
        assert_eq!(rows[3][5], "0.0099");
        // clae3 999 has no letter, so no sector mean.
        assert_eq!(rows[2][8], "<null>");
    }

    #[test]
    fn test_run_is_byte_identical_across_runs() {
        let dir = TempDir::new().unwrap();
        let cfg = config(dir.path(), CLASES, &mensuales());

        let first = serde_json::to_string(&run(&cfg).unwrap().aggregates(Some(2020), 10)).unwrap();
        let second = serde_json::to_string(&run(&cfg).unwrap().aggregates(Some(2020), 10)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_run_rejects_dirty_dictionary() {
        let dir = TempDir::new().unwrap();
        let dirty = format!("{CLASES}11113,Soja,11,Oleaginosas,1,Agricultura,A,AGRO\n");
        let err = run(&config(dir.path(), &dirty, &mensuales())).unwrap_err();
        assert!(matches!(err, PipelineError::JoinIntegrity { .. }));
    }

    #[test]
    fn test_run_rejects_bad_date() {
        let dir = TempDir::new().unwrap();
        let bad = format!("{}2021-13-01,11,100\n", mensuales());
        let err = run(&config(dir.path(), CLASES, &bad)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDate { row: 73, .. }));
    }

    #[test]
    fn test_run_missing_input() {
        let cfg = PipelineConfig {
            classification_path: PathBuf::from("/tmp/does-not-exist-clae/Clases.csv"),
            ..PipelineConfig::default()
        };
        assert!(matches!(run(&cfg).unwrap_err(), PipelineError::Io { .. }));
    }
}
