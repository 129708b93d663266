//! SVG heatmaps with vector text.

use super::{col_tree_segments, format_tick, row_tree_segments, Geometry, HeatmapLayout, RenderOptions};
use super::{COLORBAR_TITLE, COLORBAR_WIDTH, GAP, LEGEND_ROW};
use crate::font::GLYPH_SIZE;
use crate::palette::Rgb;
use crate::reduce::ReducedMatrix;

/// Vertical slices used to approximate the colour bar gradient.
const COLORBAR_STEPS: u32 = 32;

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Cut `text` to `max_chars`, marking the cut with an ellipsis.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('\u{2026}');
        out
    }
}

fn rgb(c: Rgb) -> String {
    format!("rgb({},{},{})", c.0, c.1, c.2)
}

/// Render a heatmap as an SVG document sized by `geom`.
pub fn render_svg(
    matrix: &ReducedMatrix,
    layout: &HeatmapLayout,
    geom: &Geometry,
    options: &RenderOptions,
) -> String {
    let cell = geom.cell;
    let max_chars = options.max_label_chars.max(1);
    let font_size = GLYPH_SIZE + 2;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
  .label {{ font-family: 'DejaVu Sans Mono', 'Courier New', monospace; font-size: {}px; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
        geom.width, geom.height, geom.width, geom.height, font_size
    ));

    svg.push_str(r#"<g class="cells">"#);
    svg.push('\n');
    for (display_row, &row) in layout.row_order.iter().enumerate() {
        let y = geom.grid_y + display_row as u32 * cell;
        for (display_col, &col) in layout.col_order.iter().enumerate() {
            let x = geom.grid_x + display_col as u32 * cell;
            let value = matrix.get(row, col);
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"><title>{} / {}: {:.3}</title></rect>"#,
                x,
                y,
                cell,
                cell,
                rgb(layout.scale.color(value)),
                escape_xml(&matrix.taxa[row]),
                escape_xml(&matrix.sample_ids[col]),
                value
            ));
            svg.push('\n');
        }
    }
    svg.push_str("</g>\n");

    if let Some(ref colors) = layout.row_colors {
        for (display_row, &c) in colors.iter().enumerate() {
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                geom.annot_x,
                geom.grid_y + display_row as u32 * cell,
                geom.annot_w,
                cell,
                rgb(c)
            ));
            svg.push('\n');
        }
    }

    for (display_row, &row) in layout.row_order.iter().enumerate() {
        let text_y = (geom.grid_y + display_row as u32 * cell) as f64 + cell as f64 / 2.0 + font_size as f64 / 3.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{:.1}" class="label">{}</text>"#,
            geom.row_label_x,
            text_y,
            escape_xml(&truncate(&matrix.taxa[row], max_chars))
        ));
        svg.push('\n');
    }

    for (display_col, &col) in layout.col_order.iter().enumerate() {
        let x = (geom.grid_x + display_col as u32 * cell) as f64 + cell as f64 / 2.0 - font_size as f64 / 3.0;
        let y = geom.col_label_y as f64;
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" class="label" transform="rotate(90 {:.1} {:.1})">{}</text>"#,
            x,
            y,
            x,
            y,
            escape_xml(&truncate(&matrix.sample_ids[col], max_chars))
        ));
        svg.push('\n');
    }

    let segments = layout
        .row_tree
        .iter()
        .flat_map(|tree| row_tree_segments(tree, geom))
        .chain(layout.col_tree.iter().flat_map(|tree| col_tree_segments(tree, geom)));
    for seg in segments {
        svg.push_str(&format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="rgb(64,64,64)" stroke-width="1"/>"#,
            seg.x0, seg.y0, seg.x1, seg.y1
        ));
        svg.push('\n');
    }

    // Colour bar, maximum at the top
    let step_h = geom.colorbar_h as f64 / COLORBAR_STEPS as f64;
    for step in 0..COLORBAR_STEPS {
        let t = 1.0 - (step as f64 + 0.5) / COLORBAR_STEPS as f64;
        let value = layout.scale.vmin + t * (layout.scale.vmax - layout.scale.vmin);
        svg.push_str(&format!(
            r#"<rect x="{}" y="{:.2}" width="{}" height="{:.2}" fill="{}"/>"#,
            geom.colorbar_x,
            geom.colorbar_y as f64 + step as f64 * step_h,
            COLORBAR_WIDTH,
            step_h + 0.5,
            rgb(layout.scale.color(value))
        ));
        svg.push('\n');
    }
    let tick_x = geom.colorbar_x + COLORBAR_WIDTH + GAP;
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" class="label">{}</text>"#,
        tick_x,
        geom.colorbar_y + font_size,
        format_tick(layout.scale.vmax)
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" class="label">{}</text>"#,
        tick_x,
        geom.colorbar_y + geom.colorbar_h,
        format_tick(layout.scale.vmin)
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" class="label">{}</text>"#,
        geom.colorbar_x,
        geom.colorbar_title_y + GLYPH_SIZE,
        COLORBAR_TITLE
    ));
    svg.push('\n');

    for (i, (label, c)) in layout.legend.iter().enumerate() {
        let y = geom.legend_y + i as u32 * LEGEND_ROW;
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/><text x="{}" y="{}" class="label">{}</text>"#,
            geom.colorbar_x,
            y,
            GLYPH_SIZE,
            GLYPH_SIZE,
            rgb(*c),
            geom.colorbar_x + LEGEND_ROW,
            y + GLYPH_SIZE,
            escape_xml(&truncate(label, max_chars))
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}
