//! Heatmap rendering.
//!
//! A [`ReducedMatrix`] is first turned into a [`HeatmapLayout`] (row and
//! column order, dendrograms, annotation colours, colour scale) and a
//! [`Geometry`] (pixel boxes for every panel). The raster and SVG back-ends
//! both draw from these two values, so the images they produce line up.

pub mod raster;
pub mod svg;

use crate::cluster::{cluster, Dendrogram, Linkage};
use crate::error::{HeatmapError, Result};
use crate::font::{label_width, GLYPH_SIZE};
use crate::palette::{label_colors, row_colors, ColorScale, Rgb};
use crate::reduce::{ReducedMatrix, RenderMode};
use image::ImageFormat;
use log::{debug, info};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const MARGIN: u32 = 10;
const GAP: u32 = 4;
const COLORBAR_WIDTH: u32 = 12;
const COLORBAR_MIN_HEIGHT: u32 = 64;
/// Room reserved for the colour bar tick labels.
const COLORBAR_LABEL_CHARS: usize = 8;
/// Height of one superkingdom legend entry.
const LEGEND_ROW: u32 = 12;
/// Caption under the colour bar.
pub const COLORBAR_TITLE: &str = "Log10 Number of Reads";

/// Image encoding chosen from the output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Raster(ImageFormat),
}

impl OutputFormat {
    /// `svg`, or any raster extension the `image` crate can encode.
    pub fn from_extension(ext: &str) -> Result<Self> {
        if ext.eq_ignore_ascii_case("svg") {
            return Ok(OutputFormat::Svg);
        }
        ImageFormat::from_extension(ext.to_ascii_lowercase())
            .filter(|format| format.can_write())
            .map(OutputFormat::Raster)
            .ok_or_else(|| {
                HeatmapError::InvalidArgument(format!("unsupported output format '{}'", ext))
            })
    }
}

/// Drawing parameters shared by every heatmap of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Edge length of one heatmap cell in pixels.
    pub cell_size: u32,
    pub linkage: Linkage,
    /// Labels longer than this are truncated.
    pub max_label_chars: usize,
    /// Depth of a dendrogram panel in pixels.
    pub dendrogram_size: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_size: 16,
            linkage: Linkage::Average,
            max_label_chars: 40,
            dendrogram_size: 80,
        }
    }
}

/// Ordering, trees and colours for one heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayout {
    /// Matrix row shown at each display row.
    pub row_order: Vec<usize>,
    /// Matrix column shown at each display column.
    pub col_order: Vec<usize>,
    pub row_tree: Option<Dendrogram>,
    pub col_tree: Option<Dendrogram>,
    /// Annotation colour per display row; clustered mode only.
    pub row_colors: Option<Vec<Rgb>>,
    pub legend: Vec<(String, Rgb)>,
    pub scale: ColorScale,
}

impl HeatmapLayout {
    pub fn new(matrix: &ReducedMatrix, linkage: Linkage) -> Self {
        let (vmin, vmax) = matrix.value_range();
        let scale = ColorScale::new(vmin, vmax);
        let identity = |n: usize| (0..n).collect::<Vec<_>>();

        match matrix.mode {
            RenderMode::Plain => Self {
                row_order: identity(matrix.n_rows()),
                col_order: identity(matrix.n_cols()),
                row_tree: None,
                col_tree: None,
                row_colors: None,
                legend: Vec::new(),
                scale,
            },
            RenderMode::Clustered {
                cluster_rows,
                cluster_columns,
            } => {
                let row_tree = cluster_rows.then(|| cluster(&matrix.values, linkage));
                let col_tree = cluster_columns.then(|| {
                    let columns: Vec<Vec<f64>> =
                        (0..matrix.n_cols()).map(|c| matrix.column(c)).collect();
                    cluster(&columns, linkage)
                });

                let row_order = row_tree
                    .as_ref()
                    .map(|t| t.leaf_order.clone())
                    .unwrap_or_else(|| identity(matrix.n_rows()));
                let col_order = col_tree
                    .as_ref()
                    .map(|t| t.leaf_order.clone())
                    .unwrap_or_else(|| identity(matrix.n_cols()));

                let colors = row_colors(&matrix.superkingdoms);
                Self {
                    row_colors: Some(row_order.iter().map(|&r| colors[r]).collect()),
                    legend: label_colors(&matrix.superkingdoms),
                    row_order,
                    col_order,
                    row_tree,
                    col_tree,
                    scale,
                }
            }
        }
    }
}

/// Pixel placement of every panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cell: u32,
    pub row_tree_x: u32,
    pub row_tree_w: u32,
    pub col_tree_y: u32,
    pub col_tree_h: u32,
    pub annot_x: u32,
    pub annot_w: u32,
    pub grid_x: u32,
    pub grid_y: u32,
    pub grid_w: u32,
    pub grid_h: u32,
    pub row_label_x: u32,
    pub col_label_y: u32,
    pub colorbar_x: u32,
    pub colorbar_y: u32,
    pub colorbar_h: u32,
    pub colorbar_title_y: u32,
    pub legend_y: u32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(matrix: &ReducedMatrix, layout: &HeatmapLayout, options: &RenderOptions) -> Self {
        let cell = options.cell_size.max(GLYPH_SIZE);
        let max_chars = options.max_label_chars.max(1);

        let row_tree_w = if layout.row_tree.is_some() { options.dendrogram_size } else { 0 };
        let col_tree_h = if layout.col_tree.is_some() { options.dendrogram_size } else { 0 };
        let annot_w = if layout.row_colors.is_some() { (cell / 2).max(6) } else { 0 };

        let annot_x = MARGIN + row_tree_w + if row_tree_w > 0 { GAP } else { 0 };
        let grid_x = annot_x + annot_w + if annot_w > 0 { GAP } else { 0 };
        let grid_y = MARGIN + col_tree_h + if col_tree_h > 0 { GAP } else { 0 };
        let grid_w = matrix.n_cols() as u32 * cell;
        let grid_h = matrix.n_rows() as u32 * cell;

        let row_label_w = matrix
            .taxa
            .iter()
            .map(|t| label_width(t, max_chars))
            .max()
            .unwrap_or(0);
        let col_label_h = matrix
            .sample_ids
            .iter()
            .map(|s| label_width(s, max_chars))
            .max()
            .unwrap_or(0);

        let row_label_x = grid_x + grid_w + GAP;
        let col_label_y = grid_y + grid_h + GAP;

        let colorbar_x = row_label_x + row_label_w + 2 * MARGIN;
        let colorbar_y = grid_y;
        let colorbar_h = grid_h.max(COLORBAR_MIN_HEIGHT);
        let colorbar_label_w = COLORBAR_LABEL_CHARS as u32 * GLYPH_SIZE;

        let colorbar_title_y = colorbar_y + colorbar_h + 2 * GAP;
        let colorbar_title_w = label_width(COLORBAR_TITLE, COLORBAR_TITLE.len());
        let legend_y = colorbar_title_y + GLYPH_SIZE + 3 * GAP;
        let legend_w = layout
            .legend
            .iter()
            .map(|(label, _)| LEGEND_ROW + label_width(label, max_chars))
            .max()
            .unwrap_or(0);

        let width = (colorbar_x + COLORBAR_WIDTH + GAP + colorbar_label_w)
            .max(colorbar_x + legend_w)
            .max(colorbar_x + colorbar_title_w)
            + MARGIN;
        let height = (col_label_y + col_label_h)
            .max(legend_y + layout.legend.len() as u32 * LEGEND_ROW)
            + MARGIN;

        Self {
            cell,
            row_tree_x: MARGIN,
            row_tree_w,
            col_tree_y: MARGIN,
            col_tree_h,
            annot_x,
            annot_w,
            grid_x,
            grid_y,
            grid_w,
            grid_h,
            row_label_x,
            col_label_y,
            colorbar_x,
            colorbar_y,
            colorbar_h,
            colorbar_title_y,
            legend_y,
            width,
            height,
        }
    }
}

/// Straight line in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Dendrogram lines in (position, depth) pixels: each child rises from its
/// own height to its parent's, and a connector joins the two children.
fn tree_lines(tree: &Dendrogram, cell: u32, depth_px: u32) -> Vec<(f64, f64, f64, f64)> {
    let coords = tree.node_coordinates();
    let max = tree.max_distance();
    let scale = if max > 0.0 { depth_px as f64 / max } else { 0.0 };
    let pos = |p: f64| (p + 0.5) * cell as f64;

    let mut lines = Vec::with_capacity(tree.merges.len() * 3);
    for (i, merge) in tree.merges.iter().enumerate() {
        let (_, parent_h) = coords[tree.n_leaves + i];
        let parent_depth = parent_h * scale;
        for child in [merge.left, merge.right] {
            let (p, h) = coords[child];
            lines.push((pos(p), h * scale, pos(p), parent_depth));
        }
        let (lp, _) = coords[merge.left];
        let (rp, _) = coords[merge.right];
        lines.push((pos(lp), parent_depth, pos(rp), parent_depth));
    }
    lines
}

/// Row dendrogram, leaves against the annotation bar and root to the left.
pub fn row_tree_segments(tree: &Dendrogram, geom: &Geometry) -> Vec<Segment> {
    let right = (geom.row_tree_x + geom.row_tree_w) as f64;
    let top = geom.grid_y as f64;
    tree_lines(tree, geom.cell, geom.row_tree_w.saturating_sub(GAP))
        .into_iter()
        .map(|(p0, d0, p1, d1)| Segment {
            x0: right - d0,
            y0: top + p0,
            x1: right - d1,
            y1: top + p1,
        })
        .collect()
}

/// Column dendrogram, leaves against the grid and root at the top.
pub fn col_tree_segments(tree: &Dendrogram, geom: &Geometry) -> Vec<Segment> {
    let bottom = (geom.col_tree_y + geom.col_tree_h) as f64;
    let left = geom.grid_x as f64;
    tree_lines(tree, geom.cell, geom.col_tree_h.saturating_sub(GAP))
        .into_iter()
        .map(|(p0, d0, p1, d1)| Segment {
            x0: left + p0,
            y0: bottom - d0,
            x1: left + p1,
            y1: bottom - d1,
        })
        .collect()
}

/// Colour-bar tick text for `value`.
pub fn format_tick(value: f64) -> String {
    format!("{:.2}", value)
}

/// Draw `matrix` and write it to `path` in `format`.
pub fn render_heatmap(
    matrix: &ReducedMatrix,
    options: &RenderOptions,
    format: OutputFormat,
    path: &Path,
) -> Result<()> {
    let layout = HeatmapLayout::new(matrix, options.linkage);
    let geom = Geometry::new(matrix, &layout, options);
    debug!(
        "Heatmap {}x{} cells, image {}x{} px",
        matrix.n_rows(),
        matrix.n_cols(),
        geom.width,
        geom.height
    );

    info!("Saving to {:?}...", path);
    match format {
        OutputFormat::Svg => {
            let content = svg::render_svg(matrix, &layout, &geom, options);
            let mut file = File::create(path)?;
            file.write_all(content.as_bytes())?;
        }
        OutputFormat::Raster(image_format) => {
            let img = raster::render_raster(matrix, &layout, &geom, options);
            img.save_with_format(path, image_format)?;
        }
    }
    Ok(())
}
