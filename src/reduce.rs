//! Selection and transformation of an abundance table into a heatmap matrix.
//!
//! [`reduce`] filters taxa by rank and superkingdom, keeps the top N by mean
//! abundance, log10-scales the values, drops sample columns that carry no
//! signal, and decides how the result should be drawn.

use crate::error::{HeatmapError, Result};
use crate::table::AbundanceTable;
use log::{debug, info};
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Superkingdom labels accepted as viral.
pub const VIRAL_LABELS: [&str; 2] = ["sk__Viruses", "Viruses"];

/// Superkingdom labels accepted as bacterial.
pub const BACTERIAL_LABELS: [&str; 2] = ["sk__Bacteria", "Bacteria"];

/// Superkingdom restriction applied before top-N selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainFilter {
    Virus,
    Bacteria,
    All,
}

impl DomainFilter {
    pub fn matches(self, superkingdom: &str) -> bool {
        match self {
            DomainFilter::Virus => VIRAL_LABELS.contains(&superkingdom),
            DomainFilter::Bacteria => BACTERIAL_LABELS.contains(&superkingdom),
            DomainFilter::All => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DomainFilter::Virus => "Virus",
            DomainFilter::Bacteria => "Bacteria",
            DomainFilter::All => "all",
        }
    }
}

impl FromStr for DomainFilter {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Virus" => Ok(DomainFilter::Virus),
            "Bacteria" => Ok(DomainFilter::Bacteria),
            "all" => Ok(DomainFilter::All),
            _ => Err(HeatmapError::InvalidArgument(format!(
                "Superkingdom value must be 'Virus', 'Bacteria', or 'all'. You entered {}",
                s
            ))),
        }
    }
}

impl fmt::Display for DomainFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to keep from the table and how the result may be clustered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub rank: String,
    pub domain: DomainFilter,
    /// Maximum number of taxa retained.
    pub max_rows: usize,
    pub cluster_rows: bool,
    pub cluster_columns: bool,
}

impl SelectionCriteria {
    /// Criteria with both clustering flags enabled.
    ///
    /// Fails with `InvalidArgument` unless `domain` is "Virus", "Bacteria"
    /// or "all".
    pub fn new(rank: impl Into<String>, domain: &str, max_rows: usize) -> Result<Self> {
        Ok(Self {
            rank: rank.into(),
            domain: domain.parse()?,
            max_rows,
            cluster_rows: true,
            cluster_columns: true,
        })
    }

    pub fn with_clustering(mut self, cluster_rows: bool, cluster_columns: bool) -> Self {
        self.cluster_rows = cluster_rows;
        self.cluster_columns = cluster_columns;
        self
    }
}

/// How a reduced matrix is handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Single row: a plain heatmap, no clustering, no annotation bar.
    Plain,
    /// Two or more rows: clustered heatmap with a superkingdom annotation bar.
    Clustered {
        cluster_rows: bool,
        cluster_columns: bool,
    },
}

/// Log-scaled abundances ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedMatrix {
    /// Row labels, ordered by descending mean abundance.
    pub taxa: Vec<String>,
    /// Per-row superkingdom label, used for annotation colouring.
    pub superkingdoms: Vec<String>,
    /// Retained sample columns, in table order.
    pub sample_ids: Vec<String>,
    /// Row-major log10 values, taxa x samples.
    pub values: Vec<Vec<f64>>,
    pub mode: RenderMode,
}

impl ReducedMatrix {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.taxa.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.sample_ids.len()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    /// Values of one sample column across all rows.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[col]).collect()
    }

    /// Smallest and largest value in the matrix, or `(0, 0)` when it has no cells.
    pub fn value_range(&self) -> (f64, f64) {
        let mut cells = self.values.iter().flatten().copied();
        match cells.next() {
            Some(first) => cells.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))),
            None => (0.0, 0.0),
        }
    }

    /// Write the matrix as TSV: taxon, superkingdom, then one column per sample.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> Result<()> {
        write!(writer, "taxon\tsuperkingdom")?;
        for sample in &self.sample_ids {
            write!(writer, "\t{}", sample)?;
        }
        writeln!(writer)?;

        for (row, taxon) in self.taxa.iter().enumerate() {
            write!(writer, "{}\t{}", taxon, self.superkingdoms[row])?;
            for value in &self.values[row] {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Why a reduction produced nothing to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// No taxon matched the rank and superkingdom filter.
    NoMatchingTaxa,
    /// Taxa matched, but every sample column was all zero after log scaling.
    NoSampleSignal,
}

/// Outcome of [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    Matrix(ReducedMatrix),
    Empty {
        rank: String,
        domain: DomainFilter,
        reason: EmptyReason,
    },
}

impl Reduction {
    pub fn is_empty(&self) -> bool {
        matches!(self, Reduction::Empty { .. })
    }

    pub fn matrix(&self) -> Option<&ReducedMatrix> {
        match self {
            Reduction::Matrix(m) => Some(m),
            Reduction::Empty { .. } => None,
        }
    }

    pub fn into_matrix(self) -> Option<ReducedMatrix> {
        match self {
            Reduction::Matrix(m) => Some(m),
            Reduction::Empty { .. } => None,
        }
    }
}

/// Indices of rows at `rank` whose superkingdom passes `domain`, in table order.
pub fn select_rows(table: &AbundanceTable, rank: &str, domain: DomainFilter) -> Vec<usize> {
    (0..table.n_taxa())
        .filter(|&row| {
            let annotation = table.annotation(row);
            annotation.rank == rank && domain.matches(&annotation.superkingdom)
        })
        .collect()
}

/// Order `rows` by descending mean abundance and keep at most `max_rows`.
///
/// Means skip missing cells. Rows without any present cell rank last, and
/// equal means keep their table order.
pub fn top_by_mean(table: &AbundanceTable, rows: &[usize], max_rows: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = rows.iter().map(|&r| (r, table.row_mean(r))).collect();
    ranked.sort_by(|a, b| {
        let by_mean = match (a.1.is_nan(), b.1.is_nan()) {
            (false, false) => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => Ordering::Equal,
        };
        by_mean.then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(max_rows);
    ranked.into_iter().map(|(r, _)| r).collect()
}

/// Base-10 logarithm with zero and missing (NaN) mapped to exactly zero.
///
/// A missing cell therefore never makes a sample column informative.
#[inline]
pub fn log10_or_zero(value: f64) -> f64 {
    if value == 0.0 || value.is_nan() {
        0.0
    } else {
        value.log10()
    }
}

/// Indices of columns holding at least one non-zero value.
pub fn informative_columns(values: &[Vec<f64>], n_cols: usize) -> Vec<usize> {
    (0..n_cols)
        .filter(|&col| values.iter().any(|row| row[col] != 0.0))
        .collect()
}

/// Reduce `table` to the matrix described by `criteria`.
///
/// Returns `Reduction::Empty` with `NoMatchingTaxa` when no row survives the
/// filter and top-N step, and with `NoSampleSignal` when rows survive but
/// every sample column is zero after log scaling, since a heatmap without
/// columns cannot be drawn.
///
/// Never mutates the table; calling it twice with the same inputs yields
/// identical results.
pub fn reduce(table: &AbundanceTable, criteria: &SelectionCriteria) -> Reduction {
    debug!(
        "Selecting up to {} taxa at rank '{}' for superkingdom '{}'",
        criteria.max_rows, criteria.rank, criteria.domain
    );

    let matching = select_rows(table, &criteria.rank, criteria.domain);
    let rows = top_by_mean(table, &matching, criteria.max_rows);
    debug!("{} taxa matched, {} retained", matching.len(), rows.len());

    if rows.is_empty() {
        info!("The dataframe is of size zero.");
        info!("There may be no taxa of the superkingdom, or no taxa of the given level.");
        info!("level: {}, superkingdom: {}", criteria.rank, criteria.domain);
        return Reduction::Empty {
            rank: criteria.rank.clone(),
            domain: criteria.domain,
            reason: EmptyReason::NoMatchingTaxa,
        };
    }

    let scaled: Vec<Vec<f64>> = rows
        .iter()
        .map(|&r| table.row(r).iter().map(|&v| log10_or_zero(v)).collect())
        .collect();

    let keep = informative_columns(&scaled, table.n_samples());
    debug!(
        "Keeping {} of {} sample columns",
        keep.len(),
        table.n_samples()
    );

    if keep.is_empty() {
        info!(
            "No sample has signal for level: {}, superkingdom: {}",
            criteria.rank, criteria.domain
        );
        return Reduction::Empty {
            rank: criteria.rank.clone(),
            domain: criteria.domain,
            reason: EmptyReason::NoSampleSignal,
        };
    }

    let values: Vec<Vec<f64>> = scaled
        .iter()
        .map(|row| keep.iter().map(|&c| row[c]).collect())
        .collect();

    let mode = if rows.len() == 1 {
        info!("There is only one taxon. Reporting a plain heatmap.");
        RenderMode::Plain
    } else {
        RenderMode::Clustered {
            cluster_rows: criteria.cluster_rows,
            cluster_columns: criteria.cluster_columns,
        }
    };

    Reduction::Matrix(ReducedMatrix {
        taxa: rows.iter().map(|&r| table.taxa()[r].clone()).collect(),
        superkingdoms: rows
            .iter()
            .map(|&r| table.annotation(r).superkingdom.clone())
            .collect(),
        sample_ids: keep.iter().map(|&c| table.sample_ids()[c].clone()).collect(),
        values,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TaxonAnnotation;
    use approx::assert_relative_eq;

    fn taxon(rank: &str, superkingdom: &str) -> TaxonAnnotation {
        TaxonAnnotation {
            rank: rank.to_string(),
            superkingdom: superkingdom.to_string(),
            ..Default::default()
        }
    }

    fn table(rows: &[(&str, &str, &str, &[f64])], samples: &[&str]) -> AbundanceTable {
        AbundanceTable::new(
            rows.iter().map(|r| r.0.to_string()).collect(),
            rows.iter().map(|r| taxon(r.1, r.2)).collect(),
            samples.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.3.to_vec()).collect(),
        )
        .unwrap()
    }

    fn mixed_table() -> AbundanceTable {
        table(
            &[
                ("Alphavirus", "genus", "sk__Viruses", &[10.0, 10.0, 0.0]),
                ("Betavirus", "genus", "Viruses", &[100.0, 100.0, 0.0]),
                ("Gammavirus", "genus", "sk__Viruses", &[1.0, 1.0, 0.0]),
                ("Escherichia", "genus", "sk__Bacteria", &[1000.0, 0.0, 0.0]),
                ("E. coli", "species", "Bacteria", &[50.0, 5.0, 0.0]),
                ("Togaviridae", "family", "sk__Viruses", &[7.0, 0.0, 3.0]),
            ],
            &["S1", "S2", "S3"],
        )
    }

    #[test]
    fn test_domain_parse() {
        assert_eq!("Virus".parse::<DomainFilter>().unwrap(), DomainFilter::Virus);
        assert_eq!("Bacteria".parse::<DomainFilter>().unwrap(), DomainFilter::Bacteria);
        assert_eq!("all".parse::<DomainFilter>().unwrap(), DomainFilter::All);
    }

    #[test]
    fn test_unknown_domain_is_invalid_argument() {
        let err = SelectionCriteria::new("genus", "Fungi", 10).unwrap_err();
        match err {
            HeatmapError::InvalidArgument(msg) => assert!(msg.contains("Fungi")),
            other => panic!("unexpected error: {other}"),
        }
        // Matching is exact, not case-insensitive
        assert!("virus".parse::<DomainFilter>().is_err());
    }

    #[test]
    fn test_domain_synonyms() {
        assert!(DomainFilter::Virus.matches("sk__Viruses"));
        assert!(DomainFilter::Virus.matches("Viruses"));
        assert!(!DomainFilter::Virus.matches("Bacteria"));
        assert!(DomainFilter::Bacteria.matches("sk__Bacteria"));
        assert!(!DomainFilter::Bacteria.matches("Archaea"));
        assert!(DomainFilter::All.matches("Archaea"));
    }

    #[test]
    fn test_filter_respects_rank() {
        let t = mixed_table();
        for domain in [DomainFilter::Virus, DomainFilter::Bacteria, DomainFilter::All] {
            for row in select_rows(&t, "genus", domain) {
                assert_eq!(t.annotation(row).rank, "genus");
            }
        }
        assert_eq!(select_rows(&t, "genus", DomainFilter::Virus), vec![0, 1, 2]);
        assert_eq!(select_rows(&t, "genus", DomainFilter::All), vec![0, 1, 2, 3]);
        assert_eq!(select_rows(&t, "species", DomainFilter::Bacteria), vec![4]);
    }

    #[test]
    fn test_top_n_orders_by_mean() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("genus", "Virus", 2).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.taxa, vec!["Betavirus", "Alphavirus"]);
        assert_eq!(reduced.superkingdoms, vec!["Viruses", "sk__Viruses"]);
    }

    #[test]
    fn test_retained_count_is_min_of_n_and_matches() {
        let t = mixed_table();
        for n in 0..6 {
            let rows = top_by_mean(&t, &select_rows(&t, "genus", DomainFilter::All), n);
            assert_eq!(rows.len(), n.min(4));
        }
    }

    #[test]
    fn test_equal_means_keep_table_order() {
        let t = table(
            &[
                ("a", "genus", "Viruses", &[2.0, 0.0]),
                ("b", "genus", "Viruses", &[0.0, 2.0]),
                ("c", "genus", "Viruses", &[1.0, 1.0]),
                ("d", "genus", "Viruses", &[5.0, 5.0]),
            ],
            &["S1", "S2"],
        );
        let rows = top_by_mean(&t, &[0, 1, 2, 3], 10);
        assert_eq!(rows, vec![3, 0, 1, 2]);
    }

    #[test]
    fn test_missing_cells_skipped_in_ranking() {
        let t = table(
            &[
                ("A", "genus", "sk__Viruses", &[3.0, f64::NAN]),
                ("B", "genus", "sk__Viruses", &[2.0, 2.0]),
                ("C", "genus", "sk__Viruses", &[f64::NAN, f64::NAN]),
            ],
            &["S1", "S2"],
        );
        assert_eq!(top_by_mean(&t, &[0, 1, 2], 3), vec![0, 1, 2]);

        let criteria = SelectionCriteria::new("genus", "Virus", 1).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.taxa, vec!["A"]);
        // The missing S2 cell scales to zero, leaving S2 without signal
        assert_eq!(reduced.sample_ids, vec!["S1"]);
        assert_relative_eq!(reduced.get(0, 0), 3.0f64.log10());
    }

    #[test]
    fn test_log_transform_and_zero() {
        assert_eq!(log10_or_zero(f64::NAN), 0.0);
        assert_eq!(log10_or_zero(0.0), 0.0);
        assert_relative_eq!(log10_or_zero(100.0), 2.0);
        assert_relative_eq!(log10_or_zero(0.1), -1.0);

        let t = mixed_table();
        let criteria = SelectionCriteria::new("family", "Virus", 5).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.sample_ids, vec!["S1", "S3"]);
        assert_relative_eq!(reduced.get(0, 0), 7.0f64.log10());
        assert_relative_eq!(reduced.get(0, 1), 3.0f64.log10());
    }

    #[test]
    fn test_all_zero_column_pruned() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("genus", "Virus", 10).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.sample_ids, vec!["S1", "S2"]);
        for col in 0..reduced.n_cols() {
            assert!(reduced.column(col).iter().any(|&v| v != 0.0));
        }
    }

    #[test]
    fn test_column_of_ones_is_pruned() {
        // log10(1) == 0, so a column of ones carries no signal either
        let t = table(
            &[
                ("a", "genus", "Viruses", &[1.0, 10.0]),
                ("b", "genus", "Viruses", &[1.0, 100.0]),
            ],
            &["S1", "S2"],
        );
        let criteria = SelectionCriteria::new("genus", "all", 10).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.sample_ids, vec!["S2"]);
    }

    #[test]
    fn test_single_row_is_plain() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("species", "Bacteria", 10).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.n_rows(), 1);
        assert_eq!(reduced.mode, RenderMode::Plain);
    }

    #[test]
    fn test_cluster_flags_pass_through() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("genus", "all", 10)
            .unwrap()
            .with_clustering(false, true);
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(
            reduced.mode,
            RenderMode::Clustered {
                cluster_rows: false,
                cluster_columns: true
            }
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let t = table(&[("a", "genus", "Viruses", &[1.0])], &["S1"]);
        let criteria = SelectionCriteria::new("species", "Bacteria", 10).unwrap();
        let result = reduce(&t, &criteria);
        assert!(result.is_empty());
        assert_eq!(
            result,
            Reduction::Empty {
                rank: "species".to_string(),
                domain: DomainFilter::Bacteria,
                reason: EmptyReason::NoMatchingTaxa,
            }
        );
    }

    #[test]
    fn test_zero_rows_requested_is_empty() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("genus", "Virus", 0).unwrap();
        assert!(reduce(&t, &criteria).is_empty());
    }

    #[test]
    fn test_all_columns_silent_is_empty() {
        let t = table(&[("a", "genus", "Viruses", &[0.0, 1.0])], &["S1", "S2"]);
        let criteria = SelectionCriteria::new("genus", "Virus", 10).unwrap();
        match reduce(&t, &criteria) {
            Reduction::Empty { reason, .. } => assert_eq!(reason, EmptyReason::NoSampleSignal),
            other => panic!("expected empty reduction, got {other:?}"),
        }
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("genus", "all", 3).unwrap();
        assert_eq!(reduce(&t, &criteria), reduce(&t, &criteria));
    }

    #[test]
    fn test_value_range_and_tsv() {
        let t = mixed_table();
        let criteria = SelectionCriteria::new("genus", "Virus", 2).unwrap();
        let reduced = reduce(&t, &criteria).into_matrix().unwrap();
        assert_eq!(reduced.value_range(), (1.0, 2.0));

        let mut out = Vec::new();
        reduced.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "taxon\tsuperkingdom\tS1\tS2");
        assert_eq!(lines[1], "Betavirus\tViruses\t2\t2");
        assert_eq!(lines.len(), 3);
    }
}
