use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: sector letter → Color32
// ---------------------------------------------------------------------------

/// Maps each CLAE letter to a distinct colour, shared by every chart so a
/// sector keeps its colour across views.
#[derive(Debug, Clone, Default)]
pub struct LetterColors {
    mapping: BTreeMap<String, Color32>,
}

impl LetterColors {
    pub fn new<'a>(letters: impl IntoIterator<Item = &'a str>) -> Self {
        let mut sorted: Vec<&str> = letters.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mapping = sorted
            .iter()
            .zip(generate_palette(sorted.len()))
            .map(|(l, c)| (l.to_string(), c))
            .collect();
        LetterColors { mapping }
    }

    /// Grey for letters the map was not built with.
    pub fn color_for(&self, letter: &str) -> Color32 {
        self.mapping.get(letter).copied().unwrap_or(Color32::GRAY)
    }
}
