//! Abundance heatmaps from metagenomic hit tables.
//!
//! A hit table (virID or PathSeq TSV) is loaded into an [`AbundanceTable`],
//! reduced per (rank, superkingdom) view to the most abundant taxa on a
//! log10 scale, and drawn as a plain or hierarchically clustered heatmap in
//! PNG, SVG or any other raster format the `image` crate can write.

pub mod cluster;
pub mod error;
pub mod font;
pub mod palette;
pub mod reduce;
pub mod render;
pub mod schema;
pub mod table;
pub mod views;

pub use cluster::{Dendrogram, Linkage};
pub use error::{HeatmapError, Result};
pub use reduce::{
    reduce, DomainFilter, EmptyReason, ReducedMatrix, Reduction, RenderMode, SelectionCriteria,
};
pub use render::{render_heatmap, OutputFormat, RenderOptions};
pub use schema::InputFormat;
pub use table::{AbundanceTable, TaxonAnnotation};
pub use views::{HeatmapView, ViewSettings, STANDARD_VIEWS};
