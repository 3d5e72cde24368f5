use chrono::Datelike;
use eframe::egui::{Color32, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints,
};

use crate::color::LetterColors;
use crate::data::aggregate::{Aggregates, DateMean, LetterMean, LetterSpread, SectorMean};
use crate::state::{AppState, ChartKind};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the selected chart in the central panel.
pub fn chart_panel(ui: &mut Ui, state: &AppState) {
    let aggregates = match &state.aggregates {
        Some(a) => a,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open the CLAE and wage files to chart them  (File → Open…)");
            });
            return;
        }
    };

    ui.heading(chart_title(state.chart, aggregates));
    match state.chart {
        ChartKind::Trend => trend_plot(ui, &aggregates.by_date),
        ChartKind::ByLetter => letter_plot(ui, &aggregates.by_letter, &state.letter_colors),
        ChartKind::TopSectors => top_sectors_plot(ui, &aggregates.top_sectors),
        ChartKind::Distribution => {
            distribution_plot(ui, &aggregates.spread_by_letter, &state.letter_colors)
        }
    }
}

fn chart_title(chart: ChartKind, aggregates: &Aggregates) -> String {
    match (chart, aggregates.year) {
        (ChartKind::TopSectors, Some(year)) => {
            format!("Top {} best-paid activities – {year}", aggregates.top_sectors.len())
        }
        (ChartKind::TopSectors, None) => "Top activities – no data".to_string(),
        (kind, _) => kind.label().to_string(),
    }
}

/// Fractional year of a monthly date, so the x axis reads as years.
fn fractional_year(d: &DateMean) -> f64 {
    d.date.year() as f64 + (d.date.month0() as f64) / 12.0
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Mean median wage over time.
fn trend_plot(ui: &mut Ui, by_date: &[DateMean]) {
    let points: PlotPoints = by_date
        .iter()
        .map(|d| [fractional_year(d), d.mean_wage])
        .collect();

    Plot::new("trend_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Median wage (ARS)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name("mean median wage")
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );
        });
}

/// Mean wage per letter, already sorted highest first.
fn letter_plot(ui: &mut Ui, by_letter: &[LetterMean], colors: &LetterColors) {
    let bars: Vec<Bar> = by_letter
        .iter()
        .enumerate()
        .map(|(i, l)| {
            Bar::new(i as f64, l.mean_wage)
                .name(&l.letter)
                .fill(colors.color_for(&l.letter))
                .width(0.7)
        })
        .collect();

    Plot::new("letter_plot")
        .x_axis_label("Letter (CLAE), highest first")
        .y_axis_label("Mean median wage (ARS)")
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("mean by letter"));
        });
}

/// Horizontal bars, best-paid sector on top.
fn top_sectors_plot(ui: &mut Ui, top: &[SectorMean]) {
    let n = top.len();
    let bars: Vec<Bar> = top
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Bar::new((n - i) as f64, s.mean_wage)
                .name(format!("{} – {}", s.code3, s.desc3))
                .width(0.7)
        })
        .collect();

    Plot::new("top_sectors_plot")
        .x_axis_label("Mean median wage (ARS)")
        .y_axis_label("Activity (CLAE3), hover for name")
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name("top sectors")
                    .color(Color32::LIGHT_GREEN)
                    .horizontal(),
            );
        });
}

/// Box per letter from the precomputed five-number summary.
fn distribution_plot(ui: &mut Ui, spread: &[LetterSpread], colors: &LetterColors) {
    let boxes: Vec<BoxElem> = spread
        .iter()
        .enumerate()
        .map(|(i, s)| {
            BoxElem::new(i as f64, BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max))
                .name(&s.letter)
                .fill(colors.color_for(&s.letter).gamma_multiply(0.5))
                .box_width(0.6)
        })
        .collect();

    Plot::new("distribution_plot")
        .x_axis_label("Letter (CLAE), alphabetical")
        .y_axis_label("Median wage (ARS)")
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes).name("wage distribution"));
        });
}
