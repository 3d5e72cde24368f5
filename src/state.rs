use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::color::LetterColors;
use crate::config::PipelineConfig;
use crate::data::aggregate::Aggregates;
use crate::data::pipeline::{self, PipelineOutput};

// ---------------------------------------------------------------------------
// Chart selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Trend,
    ByLetter,
    TopSectors,
    Distribution,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Trend,
        ChartKind::ByLetter,
        ChartKind::TopSectors,
        ChartKind::Distribution,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Trend => "Median wage over time",
            ChartKind::ByLetter => "Mean by sector letter",
            ChartKind::TopSectors => "Top sectors (CLAE3)",
            ChartKind::Distribution => "Distribution by letter",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Input paths and chart parameters.
    pub config: PipelineConfig,

    /// Result of the last successful pipeline run.
    pub output: Option<PipelineOutput>,

    /// Chart tables for the current year selection (cached).
    pub aggregates: Option<Aggregates>,

    pub letter_colors: LetterColors,

    pub chart: ChartKind,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// State for `config`, running the pipeline right away when both input
    /// files are present.
    pub fn with_config(config: PipelineConfig) -> Self {
        let mut state = AppState {
            config,
            ..Default::default()
        };
        if state.config.inputs_exist() {
            state.reload();
        } else {
            state.status_message = Some(format!(
                "Open {} and {} (File menu)",
                state.config.classification_path.display(),
                state.config.wages_path.display()
            ));
        }
        state
    }

    /// Re-run the whole pipeline on the configured inputs.  On failure the
    /// previous output is dropped: a batch is all or nothing.
    pub fn reload(&mut self) {
        match self.run_pipeline() {
            Ok(output) => {
                log::info!(
                    "Pipeline finished: {} rows, years {:?}",
                    output.summary.rows,
                    output.summary.years
                );
                self.set_output(output);
            }
            Err(e) => {
                log::error!("Pipeline failed: {e:#}");
                self.output = None;
                self.aggregates = None;
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn run_pipeline(&self) -> Result<PipelineOutput> {
        pipeline::run(&self.config).with_context(|| {
            format!(
                "processing {} with {}",
                self.config.wages_path.display(),
                self.config.classification_path.display()
            )
        })
    }

    /// Ingest a pipeline result, rebuild colours and chart tables.
    pub fn set_output(&mut self, output: PipelineOutput) {
        self.letter_colors = LetterColors::new(output.features.iter().filter_map(|r| r.letter()));
        // Keep the year selection only if the new data still has it.
        if let Some(year) = self.config.year {
            if !output.summary.years.contains(&year) {
                self.config.year = None;
            }
        }
        self.output = Some(output);
        self.status_message = None;
        self.refresh_aggregates();
    }

    /// Recompute the chart tables after a selection change.
    pub fn refresh_aggregates(&mut self) {
        self.aggregates = self
            .output
            .as_ref()
            .map(|o| o.aggregates(self.config.year, self.config.top_n));
    }

    /// `None` selects the latest year.
    pub fn set_year(&mut self, year: Option<i32>) {
        self.config.year = year;
        self.refresh_aggregates();
    }

    pub fn set_classification_path(&mut self, path: PathBuf) {
        self.config.classification_path = path;
        self.reload_if_ready();
    }

    pub fn set_wages_path(&mut self, path: PathBuf) {
        self.config.wages_path = path;
        self.reload_if_ready();
    }

    fn reload_if_ready(&mut self) {
        if self.config.inputs_exist() {
            self.reload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_inputs(dir: &std::path::Path) -> PipelineConfig {
        let clases = dir.join("Clases.csv");
        let mut f = std::fs::File::create(&clases).unwrap();
        writeln!(f, "clae3,clae3_desc,clae2,clae2_desc,letra,letra_desc").unwrap();
        writeln!(f, "11,Cultivos,1,Agricultura,A,AGRO").unwrap();

        let mensuales = dir.join("Mensuales.csv");
        let mut f = std::fs::File::create(&mensuales).unwrap();
        writeln!(f, "fecha,clae3,w_median").unwrap();
        writeln!(f, "2019-01-01,11,100").unwrap();
        writeln!(f, "2020-01-01,11,150").unwrap();

        PipelineConfig {
            classification_path: clases,
            wages_path: mensuales,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_with_config_runs_pipeline() {
        let dir = TempDir::new().unwrap();
        let state = AppState::with_config(write_inputs(dir.path()));
        assert!(state.output.is_some());
        assert!(state.status_message.is_none());
        assert_eq!(state.aggregates.as_ref().unwrap().year, Some(2020));
    }

    #[test]
    fn test_set_year_recomputes_top_sectors() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::with_config(write_inputs(dir.path()));
        state.set_year(Some(2019));
        let aggregates = state.aggregates.as_ref().unwrap();
        assert_eq!(aggregates.year, Some(2019));
        assert_eq!(aggregates.top_sectors[0].mean_wage, 100.0);
    }

    #[test]
    fn test_failed_reload_clears_output() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::with_config(write_inputs(dir.path()));
        std::fs::write(&state.config.wages_path, "fecha,clae3,w_median\nnope,11,1\n").unwrap();
        state.reload();
        assert!(state.output.is_none());
        assert!(state.status_message.unwrap().contains("not a valid date"));
    }
}
