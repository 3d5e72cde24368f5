mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::ClaeWagesApp;
use config::PipelineConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = PipelineConfig::default();
    log::info!(
        "Starting with inputs {} and {}",
        config.classification_path.display(),
        config.wages_path.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CLAE Wages – Sector Wage Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(ClaeWagesApp::new(config)))),
    )
}
