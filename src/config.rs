//! Configuration for the wage pipeline.

use std::path::PathBuf;

/// Inputs and chart parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// CLAE dictionary (`Clases.csv`).
    pub classification_path: PathBuf,
    /// Monthly median wages by sector (`Mensuales.csv`).
    pub wages_path: PathBuf,
    /// How many sectors the top-N table keeps.
    pub top_n: usize,
    /// Year for the top-N table; `None` means the latest year in the data.
    pub year: Option<i32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classification_path: PathBuf::from("Clases.csv"),
            wages_path: PathBuf::from("Mensuales.csv"),
            top_n: 10,
            year: None,
        }
    }
}

impl PipelineConfig {
    /// Whether both input files exist on disk.
    pub fn inputs_exist(&self) -> bool {
        self.classification_path.is_file() && self.wages_path.is_file()
    }
}
