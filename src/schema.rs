//! Input schemas and their translation onto the canonical column names.
//!
//! virID and PathSeq hit tables carry the same information under different
//! headers. Each [`InputFormat`] owns a static [`ColumnMapping`] that names the
//! source column for every canonical annotation; the table loader consults it
//! once and the rest of the crate only ever sees canonical fields.

use crate::error::{HeatmapError, Result};
use std::fmt;
use std::str::FromStr;

/// Source column names for the canonical annotation fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Row key; must be unique per table.
    pub taxon: &'static str,
    pub taxon_id: &'static str,
    pub lineage: &'static str,
    /// Taxonomic rank label (canonical name: `level`).
    pub rank: &'static str,
    /// Domain label (canonical name: `superkingdom`).
    pub superkingdom: &'static str,
    /// Format-specific annotation columns that are never samples.
    pub extra: &'static [&'static str],
}

impl ColumnMapping {
    /// Whether `column` is an annotation column under this schema.
    pub fn is_annotation(&self, column: &str) -> bool {
        column == self.taxon
            || column == self.taxon_id
            || column == self.lineage
            || column == self.rank
            || column == self.superkingdom
            || self.extra.contains(&column)
    }
}

const VIRID_COLUMNS: ColumnMapping = ColumnMapping {
    taxon: "taxon",
    taxon_id: "taxonID",
    lineage: "lineage",
    rank: "level",
    superkingdom: "superkingdom",
    extra: &[],
};

const PATHSEQ_COLUMNS: ColumnMapping = ColumnMapping {
    taxon: "name",
    taxon_id: "tax_id",
    lineage: "taxonomy",
    rank: "type",
    superkingdom: "kingdom",
    extra: &["reference_length"],
};

/// Supported hit-table layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    VirId,
    PathSeq,
}

impl InputFormat {
    pub fn columns(self) -> &'static ColumnMapping {
        match self {
            InputFormat::VirId => &VIRID_COLUMNS,
            InputFormat::PathSeq => &PATHSEQ_COLUMNS,
        }
    }
}

impl FromStr for InputFormat {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "virid" => Ok(InputFormat::VirId),
            "pathseq" => Ok(InputFormat::PathSeq),
            _ => Err(HeatmapError::InvalidArgument(format!(
                "input format must be 'pathseq' or 'virID', got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::VirId => write!(f, "virID"),
            InputFormat::PathSeq => write!(f, "pathseq"),
        }
    }
}

/// Remove every occurrence of `suffix` from a sample column name.
pub fn strip_suffix(column: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        column.to_string()
    } else {
        column.replace(suffix, "")
    }
}
