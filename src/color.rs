use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Air-quality class → Color32
// ---------------------------------------------------------------------------

/// Hues for the classes the bundled models emit, from clean to dangerous air.
const CLASS_HUES: [(&str, f32); 4] = [
    ("good", 130.0),
    ("moderate", 50.0),
    ("poor", 25.0),
    ("hazardous", 0.0),
];

/// Unknown classes stay clear of the traffic-light hues above.
const OTHER_HUE_START: f32 = 180.0;
const OTHER_HUE_SPAN: f32 = 120.0;

/// Colour used for a predicted class in the table and the chart.
///
/// Known classes match case-insensitively. Any other class gets a blue/violet
/// hue derived from its name, so the same label always draws the same way.
pub fn class_color(class: &str) -> Color32 {
    let key = class.trim().to_ascii_lowercase();
    let hue = CLASS_HUES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, hue)| *hue)
        .unwrap_or_else(|| OTHER_HUE_START + (name_hash(&key) % 1000) as f32 / 1000.0 * OTHER_HUE_SPAN);
    hsl_to_color32(Hsl::new(hue, 0.7, 0.45))
}

/// FNV-1a, stable across runs and platforms.
fn name_hash(name: &str) -> u64 {
    name.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}
