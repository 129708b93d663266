//! Raster heatmaps drawn pixel by pixel into an `RgbImage`.

use super::{col_tree_segments, format_tick, row_tree_segments, Geometry, HeatmapLayout, RenderOptions, Segment};
use super::{COLORBAR_TITLE, COLORBAR_WIDTH, GAP, LEGEND_ROW};
use crate::font::{draw_text, draw_text_vertical, GLYPH_SIZE};
use crate::palette::Rgb;
use crate::reduce::ReducedMatrix;
use image::RgbImage;

const WHITE: Rgb = (255, 255, 255);
const BLACK: Rgb = (0, 0, 0);
const LINE: Rgb = (64, 64, 64);

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, rgb: Rgb) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, image::Rgb([rgb.0, rgb.1, rgb.2]));
        }
    }
}

/// Dendrogram segments are always axis-aligned.
fn draw_segment(img: &mut RgbImage, seg: &Segment, rgb: Rgb) {
    let (x0, x1) = (seg.x0.min(seg.x1).round() as u32, seg.x0.max(seg.x1).round() as u32);
    let (y0, y1) = (seg.y0.min(seg.y1).round() as u32, seg.y0.max(seg.y1).round() as u32);
    fill_rect(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1, rgb);
}

/// Draw a heatmap into a new image sized by `geom`.
pub fn render_raster(
    matrix: &ReducedMatrix,
    layout: &HeatmapLayout,
    geom: &Geometry,
    options: &RenderOptions,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(geom.width, geom.height, image::Rgb([WHITE.0, WHITE.1, WHITE.2]));
    let cell = geom.cell;
    let max_chars = options.max_label_chars.max(1);

    // Cells
    for (display_row, &row) in layout.row_order.iter().enumerate() {
        let y = geom.grid_y + display_row as u32 * cell;
        for (display_col, &col) in layout.col_order.iter().enumerate() {
            let x = geom.grid_x + display_col as u32 * cell;
            fill_rect(&mut img, x, y, cell, cell, layout.scale.color(matrix.get(row, col)));
        }

        // Superkingdom annotation bar
        if let Some(ref colors) = layout.row_colors {
            fill_rect(&mut img, geom.annot_x, y, geom.annot_w, cell, colors[display_row]);
        }

        let text_y = y + cell / 2 - GLYPH_SIZE / 2;
        draw_text(&mut img, geom.row_label_x, text_y, &matrix.taxa[row], max_chars, BLACK);
    }

    for (display_col, &col) in layout.col_order.iter().enumerate() {
        let x = geom.grid_x + display_col as u32 * cell + cell / 2 - GLYPH_SIZE / 2;
        draw_text_vertical(&mut img, x, geom.col_label_y, &matrix.sample_ids[col], max_chars, BLACK);
    }

    if let Some(ref tree) = layout.row_tree {
        for seg in row_tree_segments(tree, geom) {
            draw_segment(&mut img, &seg, LINE);
        }
    }
    if let Some(ref tree) = layout.col_tree {
        for seg in col_tree_segments(tree, geom) {
            draw_segment(&mut img, &seg, LINE);
        }
    }

    // Colour bar, maximum at the top
    for dy in 0..geom.colorbar_h {
        let t = 1.0 - dy as f64 / (geom.colorbar_h - 1).max(1) as f64;
        let value = layout.scale.vmin + t * (layout.scale.vmax - layout.scale.vmin);
        fill_rect(&mut img, geom.colorbar_x, geom.colorbar_y + dy, COLORBAR_WIDTH, 1, layout.scale.color(value));
    }
    let tick_x = geom.colorbar_x + COLORBAR_WIDTH + GAP;
    draw_text(&mut img, tick_x, geom.colorbar_y, &format_tick(layout.scale.vmax), max_chars, BLACK);
    draw_text(
        &mut img,
        tick_x,
        geom.colorbar_y + geom.colorbar_h - GLYPH_SIZE,
        &format_tick(layout.scale.vmin),
        max_chars,
        BLACK,
    );
    draw_text(
        &mut img,
        geom.colorbar_x,
        geom.colorbar_title_y,
        COLORBAR_TITLE,
        COLORBAR_TITLE.len(),
        BLACK,
    );

    for (i, (label, rgb)) in layout.legend.iter().enumerate() {
        let y = geom.legend_y + i as u32 * LEGEND_ROW;
        fill_rect(&mut img, geom.colorbar_x, y, GLYPH_SIZE, GLYPH_SIZE, *rgb);
        draw_text(&mut img, geom.colorbar_x + LEGEND_ROW, y, label, max_chars, BLACK);
    }

    img
}
