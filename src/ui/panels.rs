use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::features::{preview, PREVIEW_COLUMNS};
use crate::data::pipeline::PREVIEW_ROWS;
use crate::state::{AppState, ChartKind};

// ---------------------------------------------------------------------------
// Left side panel – chart controls and dataset summary
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Charts");
    ui.separator();

    for kind in ChartKind::ALL {
        if ui.selectable_label(state.chart == kind, kind.label()).clicked() {
            state.chart = kind;
        }
    }
    ui.separator();

    let Some(output) = &state.output else {
        ui.label("No dataset loaded.");
        return;
    };
    let years = output.summary.years.clone();
    let summary = output.summary.clone();
    let feature_rows = preview(&output.features, PREVIEW_ROWS);

    // ---- Year selector for the top-N chart ----
    ui.strong("Year");
    let selected_text = match state.config.year {
        Some(y) => y.to_string(),
        None => "latest".to_string(),
    };
    let mut chosen = None;
    egui::ComboBox::from_id_salt("year")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(state.config.year.is_none(), "latest")
                .clicked()
            {
                chosen = Some(None);
            }
            for y in years.iter().rev() {
                if ui
                    .selectable_label(state.config.year == Some(*y), y.to_string())
                    .clicked()
                {
                    chosen = Some(Some(*y));
                }
            }
        });
    if let Some(year) = chosen {
        state.set_year(year);
    }
    ui.separator();

    // ---- Dataset summary ----
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new(RichText::new("Dataset").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label(format!("{} rows × {} columns", summary.rows, summary.columns));
                    ui.label(format!("{} sectors (CLAE3)", summary.distinct_sectors));
                    if summary.unmatched_rows > 0 {
                        ui.label(
                            RichText::new(format!(
                                "{} rows without classification",
                                summary.unmatched_rows
                            ))
                            .color(Color32::YELLOW),
                        );
                    }
                    if let (Some(first), Some(last)) = (summary.years.first(), summary.years.last())
                    {
                        ui.label(format!("Years {first}–{last}"));
                    }
                });

            if let Some(w) = &summary.wage {
                egui::CollapsingHeader::new(RichText::new("w_median").strong())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        egui::Grid::new("wage_stats").striped(true).show(ui, |ui: &mut Ui| {
                            ui.label("count");
                            ui.label(w.count.to_string());
                            ui.end_row();
                            let rows = [
                                ("mean", w.mean),
                                ("min", w.min),
                                ("25%", w.q25),
                                ("50%", w.median),
                                ("75%", w.q75),
                                ("max", w.max),
                            ];
                            for (name, value) in rows {
                                ui.label(name);
                                ui.label(format!("{value:.2}"));
                                ui.end_row();
                            }
                            if let Some(std) = w.std {
                                ui.label("std");
                                ui.label(format!("{std:.2}"));
                                ui.end_row();
                            }
                        });
                    });
            }

            egui::CollapsingHeader::new(RichText::new("Missing values").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for m in &summary.missing {
                        ui.label(format!("{}: {}", m.column, m.count));
                    }
                });

            egui::CollapsingHeader::new(RichText::new("Features (first rows)").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
                        egui::Grid::new("feature_preview")
                            .striped(true)
                            .show(ui, |ui: &mut Ui| {
                                for column in PREVIEW_COLUMNS {
                                    ui.strong(column);
                                }
                                ui.end_row();
                                for row in &feature_rows {
                                    for cell in row {
                                        ui.label(cell.as_str());
                                    }
                                    ui.end_row();
                                }
                            });
                    });
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open classification (CLAE)…").clicked() {
                if let Some(path) = pick_table("Open CLAE classification") {
                    state.set_classification_path(path);
                }
                ui.close_menu();
            }
            if ui.button("Open monthly wages…").clicked() {
                if let Some(path) = pick_table("Open monthly wages") {
                    state.set_wages_path(path);
                }
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(output) = &state.output {
            ui.label(format!(
                "{} wage rows from {}",
                output.features.len(),
                state.config.wages_path.display()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_table(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file()
}
