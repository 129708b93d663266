//! Colour maps for heatmap cells and superkingdom annotations.

use rustc_hash::FxHashMap;

pub type Rgb = (u8, u8, u8);

/// ColorBrewer Blues, 9 classes (light to dark). Cell colour map.
const BLUES_9: [Rgb; 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

/// Diverging blue-grey-red anchors of the coolwarm map.
const COOLWARM_5: [Rgb; 5] = [
    (59, 76, 192),
    (141, 176, 254),
    (221, 220, 220),
    (244, 154, 123),
    (180, 4, 38),
];

/// Linear interpolation through evenly spaced anchors, `t` clamped to [0, 1].
fn interpolate(anchors: &[Rgb], t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (anchors.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(anchors.len() - 2);
    let frac = scaled - lower as f64;
    let (r0, g0, b0) = anchors[lower];
    let (r1, g1, b1) = anchors[lower + 1];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    (mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Blues colour at position `t` in [0, 1].
pub fn blues(t: f64) -> Rgb {
    interpolate(&BLUES_9, t)
}

/// `n` colours sampled from coolwarm, skipping both extremes.
pub fn coolwarm_palette(n: usize) -> Vec<Rgb> {
    (1..=n)
        .map(|i| interpolate(&COOLWARM_5, i as f64 / (n + 1) as f64))
        .collect()
}

/// Linear mapping from matrix values onto the cell colour map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
}

impl ColorScale {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// Position of `value` in [0, 1]; a flat scale maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span > 0.0 {
            ((value - self.vmin) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn color(&self, value: f64) -> Rgb {
        blues(self.normalize(value))
    }
}

/// One coolwarm colour per distinct label, in first-appearance order.
pub fn label_colors(labels: &[String]) -> Vec<(String, Rgb)> {
    let mut distinct: Vec<&String> = Vec::new();
    for label in labels {
        if !distinct.contains(&label) {
            distinct.push(label);
        }
    }
    let palette = coolwarm_palette(distinct.len());
    distinct
        .into_iter()
        .zip(palette)
        .map(|(label, rgb)| (label.clone(), rgb))
        .collect()
}

/// Colour for each label in `labels`, looked up through [`label_colors`].
pub fn row_colors(labels: &[String]) -> Vec<Rgb> {
    let lut: FxHashMap<String, Rgb> = label_colors(labels).into_iter().collect();
    labels.iter().map(|label| lut[label]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), BLUES_9[0]);
        assert_eq!(blues(1.0), BLUES_9[8]);
        assert_eq!(blues(-3.0), BLUES_9[0]);
        assert_eq!(blues(0.5), BLUES_9[4]);
    }

    #[test]
    fn test_coolwarm_single_label_is_midpoint() {
        assert_eq!(coolwarm_palette(1), vec![COOLWARM_5[2]]);
        assert_eq!(coolwarm_palette(3)[1], COOLWARM_5[2]);
        assert!(coolwarm_palette(0).is_empty());
    }

    #[test]
    fn test_color_scale() {
        let scale = ColorScale::new(1.0, 3.0);
        assert_eq!(scale.normalize(2.0), 0.5);
        assert_eq!(scale.normalize(10.0), 1.0);
        assert_eq!(ColorScale::new(2.0, 2.0).normalize(2.0), 0.0);
        assert_eq!(scale.color(3.0), BLUES_9[8]);
    }

    #[test]
    fn test_row_colors_follow_first_appearance() {
        let labels: Vec<String> = ["sk__Viruses", "sk__Bacteria", "sk__Viruses"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let legend = label_colors(&labels);
        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0].0, "sk__Viruses");

        let colors = row_colors(&labels);
        assert_eq!(colors[0], colors[2]);
        assert_ne!(colors[0], colors[1]);
    }
}
