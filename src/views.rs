//! The fixed set of heatmap views and where their outputs go.

use crate::error::Result;
use crate::reduce::{reduce, DomainFilter, Reduction, ReducedMatrix, SelectionCriteria};
use crate::table::AbundanceTable;
use log::{debug, info};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One (rank, superkingdom) combination and the file stem it is written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapView {
    pub name: &'static str,
    pub rank: &'static str,
    pub domain: DomainFilter,
}

/// Every view produced by a run, in output order.
pub const STANDARD_VIEWS: [HeatmapView; 7] = [
    HeatmapView { name: "viral_genera", rank: "genus", domain: DomainFilter::Virus },
    HeatmapView { name: "viral_species", rank: "species", domain: DomainFilter::Virus },
    HeatmapView { name: "viral_family", rank: "family", domain: DomainFilter::Virus },
    HeatmapView { name: "bacterial_genera", rank: "genus", domain: DomainFilter::Bacteria },
    HeatmapView { name: "bacterial_species", rank: "species", domain: DomainFilter::Bacteria },
    HeatmapView { name: "all_genera", rank: "genus", domain: DomainFilter::All },
    HeatmapView { name: "all_species", rank: "species", domain: DomainFilter::All },
];

/// Selection settings shared by all views of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub top_n: usize,
    pub cluster_taxa: bool,
    pub cluster_samples: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            top_n: 50,
            cluster_taxa: true,
            cluster_samples: true,
        }
    }
}

impl HeatmapView {
    pub fn criteria(&self, settings: &ViewSettings) -> SelectionCriteria {
        SelectionCriteria {
            rank: self.rank.to_string(),
            domain: self.domain,
            max_rows: settings.top_n,
            cluster_rows: settings.cluster_taxa,
            cluster_columns: settings.cluster_samples,
        }
    }
}

/// Reduce `table` once per view, in parallel, keeping view order.
pub fn reduce_views(
    table: &AbundanceTable,
    views: &[HeatmapView],
    settings: &ViewSettings,
) -> Vec<(HeatmapView, Reduction)> {
    info!("Generating heatmaps.");
    views
        .par_iter()
        .map(|view| (*view, reduce(table, &view.criteria(settings))))
        .collect()
}

/// `<prefix>_<view>.<extension>`
pub fn output_path(prefix: &str, view: &HeatmapView, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}_{}.{}", prefix, view.name, extension))
}

/// Create the directory part of `prefix` if it does not exist yet.
pub fn prepare_output_dir(prefix: &str) -> Result<()> {
    match Path::new(prefix).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            debug!("Creating output directory {:?}", dir);
            fs::create_dir_all(dir)?;
        }
        _ => {}
    }
    Ok(())
}

/// Export a reduced matrix next to its image.
pub fn write_matrix_tsv(matrix: &ReducedMatrix, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    matrix.write_tsv(&mut writer)?;
    writer.flush()?;
    info!("Matrix saved to {:?}", path);
    Ok(())
}
