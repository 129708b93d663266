//! Abundance table: taxa x samples plus per-taxon annotations.

use crate::error::{HeatmapError, Result};
use crate::schema::{strip_suffix, InputFormat};
use log::{debug, info};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Annotation fields carried by every taxon row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonAnnotation {
    pub taxon_id: String,
    pub lineage: String,
    /// Taxonomic rank label, e.g. "genus".
    pub rank: String,
    /// Domain label, e.g. "sk__Viruses".
    pub superkingdom: String,
}

/// Immutable abundance matrix keyed by unique taxon name.
///
/// Rows are taxa, columns are samples. Annotation columns have already been
/// split off at load time, so every value in `values` belongs to a sample.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    taxa: Vec<String>,
    annotations: Vec<TaxonAnnotation>,
    sample_ids: Vec<String>,
    /// Row-major, taxa x samples.
    values: Vec<Vec<f64>>,
}

impl AbundanceTable {
    /// Build a table, checking shape, taxon uniqueness and that every
    /// abundance is non-negative. NaN marks a missing cell; infinities are
    /// rejected.
    pub fn new(
        taxa: Vec<String>,
        annotations: Vec<TaxonAnnotation>,
        sample_ids: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if annotations.len() != taxa.len() {
            return Err(HeatmapError::DimensionMismatch {
                expected: taxa.len(),
                actual: annotations.len(),
            });
        }
        if values.len() != taxa.len() {
            return Err(HeatmapError::DimensionMismatch {
                expected: taxa.len(),
                actual: values.len(),
            });
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for (taxon, row) in taxa.iter().zip(&values) {
            if !seen.insert(taxon.as_str()) {
                return Err(HeatmapError::DuplicateTaxon(taxon.clone()));
            }
            if row.len() != sample_ids.len() {
                return Err(HeatmapError::DimensionMismatch {
                    expected: sample_ids.len(),
                    actual: row.len(),
                });
            }
            for (sample, &v) in sample_ids.iter().zip(row) {
                if v.is_infinite() || v < 0.0 {
                    return Err(HeatmapError::InvalidAbundance {
                        value: v.to_string(),
                        taxon: taxon.clone(),
                        sample: sample.clone(),
                    });
                }
            }
        }

        Ok(Self {
            taxa,
            annotations,
            sample_ids,
            values,
        })
    }

    /// Load a hit table from a TSV file.
    pub fn from_tsv<P: AsRef<Path>>(
        path: P,
        format: InputFormat,
        remove_suffix: &str,
    ) -> Result<Self> {
        info!("Importing data from {:?}", path.as_ref());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), format, remove_suffix)
    }

    /// Parse a hit table from any buffered reader.
    ///
    /// The first non-empty line is the header. The taxon, rank and
    /// superkingdom columns of `format` are required; taxon id, lineage and
    /// format-specific extras are optional. Every other column is a sample,
    /// renamed by removing `remove_suffix`. Blank sample cells are missing
    /// and stored as NaN.
    pub fn from_reader<R: BufRead>(
        reader: R,
        format: InputFormat,
        remove_suffix: &str,
    ) -> Result<Self> {
        let mapping = format.columns();
        let mut lines = reader.lines();

        let header_line = loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Err(HeatmapError::EmptyData("input table has no header".to_string())),
            }
        };
        let header: Vec<&str> = header_line.trim_end_matches('\r').split('\t').collect();

        let position = |name: &str| header.iter().position(|&h| h == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| HeatmapError::MissingColumn(name.to_string()))
        };

        let taxon_col = required(mapping.taxon)?;
        let rank_col = required(mapping.rank)?;
        let superkingdom_col = required(mapping.superkingdom)?;
        let taxon_id_col = position(mapping.taxon_id);
        let lineage_col = position(mapping.lineage);

        let sample_cols: Vec<usize> = (0..header.len())
            .filter(|&i| !mapping.is_annotation(header[i]))
            .collect();
        let sample_ids: Vec<String> = sample_cols
            .iter()
            .map(|&i| strip_suffix(header[i], remove_suffix))
            .collect();

        debug!(
            "Detected {} annotation columns and {} sample columns",
            header.len() - sample_cols.len(),
            sample_cols.len()
        );

        let mut taxa = Vec::new();
        let mut annotations = Vec::new();
        let mut values = Vec::new();

        for line in lines {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != header.len() {
                return Err(HeatmapError::DimensionMismatch {
                    expected: header.len(),
                    actual: fields.len(),
                });
            }

            let taxon = fields[taxon_col].to_string();
            let field = |col: Option<usize>| col.map(|c| fields[c].to_string()).unwrap_or_default();

            let mut row = Vec::with_capacity(sample_cols.len());
            for (&col, sample) in sample_cols.iter().zip(&sample_ids) {
                let raw = fields[col].trim();
                let value = if raw.is_empty() {
                    f64::NAN
                } else {
                    raw.parse::<f64>().map_err(|_| HeatmapError::InvalidAbundance {
                        value: raw.to_string(),
                        taxon: taxon.clone(),
                        sample: sample.clone(),
                    })?
                };
                row.push(value);
            }

            annotations.push(TaxonAnnotation {
                taxon_id: field(taxon_id_col),
                lineage: field(lineage_col),
                rank: fields[rank_col].to_string(),
                superkingdom: fields[superkingdom_col].to_string(),
            });
            taxa.push(taxon);
            values.push(row);
        }

        info!("Loaded {} taxa across {} samples", taxa.len(), sample_ids.len());

        Self::new(taxa, annotations, sample_ids, values)
    }

    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.taxa.len()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    #[inline]
    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    #[inline]
    pub fn annotation(&self, row: usize) -> &TaxonAnnotation {
        &self.annotations[row]
    }

    /// Abundances of one taxon across all samples.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row]
    }

    /// Abundance at (`row`, `col`); NaN when the cell is missing.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    #[inline]
    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        self.values[row][col].is_nan()
    }

    /// Arithmetic mean over the cells of a row that are present.
    ///
    /// NaN when the row has no present cell, so such rows rank last.
    pub fn row_mean(&self, row: usize) -> f64 {
        let (sum, count) = self.values[row]
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const VIRID_TSV: &str = "taxonID\ttaxon\tlineage\tlevel\tsuperkingdom\tS1_hits\tS2_hits\n\
        10239\tAlphavirus\tViruses;Togaviridae\tgenus\tsk__Viruses\t10\t0\n\
        2\tEscherichia\tBacteria;Enterobacteriaceae\tgenus\tsk__Bacteria\t3\t\n";

    #[test]
    fn test_partition_and_suffix() {
        let table = AbundanceTable::from_reader(Cursor::new(VIRID_TSV), InputFormat::VirId, "_hits").unwrap();
        assert_eq!(table.n_taxa(), 2);
        assert_eq!(table.sample_ids(), &["S1", "S2"]);
        assert_eq!(table.taxa(), &["Alphavirus", "Escherichia"]);
        assert_eq!(table.annotation(0).rank, "genus");
        assert_eq!(table.annotation(1).superkingdom, "sk__Bacteria");
        assert_eq!(table.annotation(0).lineage, "Viruses;Togaviridae");
        // Blank cell is missing, not zero
        assert_eq!(table.get(1, 0), 3.0);
        assert!(table.is_missing(1, 1));
        assert!(!table.is_missing(0, 1));
    }

    #[test]
    fn test_pathseq_schema() {
        let tsv = "tax_id\ttaxonomy\ttype\tname\tkingdom\treference_length\tA\tB\n\
            1\tx\tspecies\tPhage T4\tViruses\t168903\t4\t8\n";
        let table = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::PathSeq, "").unwrap();
        assert_eq!(table.sample_ids(), &["A", "B"]);
        assert_eq!(table.taxa(), &["Phage T4"]);
        assert_eq!(table.annotation(0).rank, "species");
        assert_eq!(table.annotation(0).superkingdom, "Viruses");
        assert_eq!(table.annotation(0).taxon_id, "1");
    }

    #[test]
    fn test_missing_required_column() {
        let tsv = "taxon\tlevel\tS1\nfoo\tgenus\t1\n";
        let err = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::MissingColumn(ref c) if c == "superkingdom"));
    }

    #[test]
    fn test_duplicate_taxon_rejected() {
        let tsv = "taxon\tlevel\tsuperkingdom\tS1\nfoo\tgenus\tViruses\t1\nfoo\tspecies\tViruses\t2\n";
        let err = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::DuplicateTaxon(ref t) if t == "foo"));
    }

    #[test]
    fn test_negative_abundance_rejected() {
        let tsv = "taxon\tlevel\tsuperkingdom\tS1\nfoo\tgenus\tViruses\t-1\n";
        let err = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidAbundance { .. }));
    }

    #[test]
    fn test_non_numeric_abundance_rejected() {
        let tsv = "taxon\tlevel\tsuperkingdom\tS1\nfoo\tgenus\tViruses\tmany\n";
        let err = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidAbundance { ref value, .. } if value == "many"));
    }

    #[test]
    fn test_short_row_rejected() {
        let tsv = "taxon\tlevel\tsuperkingdom\tS1\tS2\nfoo\tgenus\tViruses\t1\n";
        let err = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::DimensionMismatch { expected: 5, actual: 4 }));
    }

    #[test]
    fn test_row_mean() {
        let table = AbundanceTable::from_reader(Cursor::new(VIRID_TSV), InputFormat::VirId, "").unwrap();
        assert_eq!(table.row_mean(0), 5.0);
        // Missing cell is skipped, not averaged as zero
        assert_eq!(table.row_mean(1), 3.0);
    }

    #[test]
    fn test_infinite_abundance_rejected() {
        let tsv = "taxon\tlevel\tsuperkingdom\tS1\nfoo\tgenus\tViruses\tinf\n";
        let err = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidAbundance { .. }));
    }

    #[test]
    fn test_row_mean_without_samples() {
        let table = AbundanceTable::new(
            vec!["foo".to_string()],
            vec![TaxonAnnotation::default()],
            Vec::new(),
            vec![Vec::new()],
        )
        .unwrap();
        assert!(table.row_mean(0).is_nan());
    }

    #[test]
    fn test_from_tsv_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VIRID_TSV.as_bytes()).unwrap();
        let table = AbundanceTable::from_tsv(file.path(), InputFormat::VirId, "").unwrap();
        assert_eq!(table.sample_ids(), &["S1_hits", "S2_hits"]);
        assert_eq!(table.get(0, 0), 10.0);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let tsv = "taxon\tlevel\tsuperkingdom\tS1\n";
        let table = AbundanceTable::from_reader(Cursor::new(tsv), InputFormat::VirId, "").unwrap();
        assert_eq!(table.n_taxa(), 0);
        assert_eq!(table.n_samples(), 1);
    }

    #[test]
    fn test_empty_input() {
        let err = AbundanceTable::from_reader(Cursor::new(""), InputFormat::VirId, "").unwrap_err();
        assert!(matches!(err, HeatmapError::EmptyData(_)));
    }
}
