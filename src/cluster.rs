//! Agglomerative hierarchical clustering for heatmap rows and columns.

use log::debug;
use rayon::prelude::*;

/// Rule for the distance between two merged clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Nearest members.
    Single,
    /// Farthest members.
    Complete,
    /// Size-weighted mean of member distances (UPGMA).
    #[default]
    Average,
}

/// One agglomeration step.
///
/// Leaves are nodes `0..n`; merge `i` creates node `n + i`. `left < right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

/// Merge history plus the leaf order used to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    pub n_leaves: usize,
    pub merges: Vec<Merge>,
    /// Leaves in left-to-right drawing order.
    pub leaf_order: Vec<usize>,
}

impl Dendrogram {
    /// Largest merge distance, 0 for trees without merges.
    pub fn max_distance(&self) -> f64 {
        self.merges.iter().map(|m| m.distance).fold(0.0, f64::max)
    }

    /// Drawing coordinates for every node: `(position, height)`.
    ///
    /// A leaf sits at its index in `leaf_order` with height 0. An internal
    /// node sits midway between its children at its merge distance.
    pub fn node_coordinates(&self) -> Vec<(f64, f64)> {
        let mut coords = vec![(0.0, 0.0); self.n_leaves + self.merges.len()];
        for (pos, &leaf) in self.leaf_order.iter().enumerate() {
            coords[leaf] = (pos as f64, 0.0);
        }
        for (i, merge) in self.merges.iter().enumerate() {
            let (left_pos, _) = coords[merge.left];
            let (right_pos, _) = coords[merge.right];
            coords[self.n_leaves + i] = ((left_pos + right_pos) / 2.0, merge.distance);
        }
        coords
    }
}

/// Pairwise Euclidean distances between `vectors`.
pub fn euclidean_distances(vectors: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = vectors.len();

    // Upper triangle in parallel
    let pairs: Vec<(usize, usize, f64)> = (0..n)
        .into_par_iter()
        .flat_map(|i| {
            (i + 1..n)
                .map(move |j| {
                    let d = vectors[i]
                        .iter()
                        .zip(&vectors[j])
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>()
                        .sqrt();
                    (i, j, d)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut dist = vec![vec![0.0; n]; n];
    for (i, j, d) in pairs {
        dist[i][j] = d;
        dist[j][i] = d;
    }
    dist
}

/// Cluster `vectors` bottom-up using Euclidean distance and `linkage`.
///
/// Deterministic: when several pairs share the minimum distance, the first in
/// row-major order over the current clusters merges first.
pub fn cluster(vectors: &[Vec<f64>], linkage: Linkage) -> Dendrogram {
    let n = vectors.len();
    if n == 0 {
        return Dendrogram {
            n_leaves: 0,
            merges: Vec::new(),
            leaf_order: Vec::new(),
        };
    }

    debug!("Clustering {} vectors with {:?} linkage", n, linkage);

    let mut dist = euclidean_distances(vectors);
    // Slot i holds the node currently occupying it; merged slots go inactive
    let mut node_of: Vec<usize> = (0..n).collect();
    let mut size_of: Vec<usize> = vec![1; n];
    let mut active: Vec<bool> = vec![true; n];
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..n - 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in (0..n).filter(|&a| active[a]) {
            for b in (a + 1..n).filter(|&b| active[b]) {
                if best.map_or(true, |(_, _, d)| dist[a][b] < d) {
                    best = Some((a, b, dist[a][b]));
                }
            }
        }
        let Some((a, b, distance)) = best else {
            break;
        };

        let (size_a, size_b) = (size_of[a], size_of[b]);
        for k in (0..n).filter(|&k| active[k] && k != a && k != b) {
            let updated = match linkage {
                Linkage::Single => dist[a][k].min(dist[b][k]),
                Linkage::Complete => dist[a][k].max(dist[b][k]),
                Linkage::Average => {
                    (size_a as f64 * dist[a][k] + size_b as f64 * dist[b][k])
                        / (size_a + size_b) as f64
                }
            };
            dist[a][k] = updated;
            dist[k][a] = updated;
        }

        let (left, right) = if node_of[a] < node_of[b] {
            (node_of[a], node_of[b])
        } else {
            (node_of[b], node_of[a])
        };
        merges.push(Merge {
            left,
            right,
            distance,
            size: size_a + size_b,
        });

        node_of[a] = n + step;
        size_of[a] = size_a + size_b;
        active[b] = false;
    }

    let leaf_order = leaf_order(n, &merges);
    debug!("Leaf order: {:?}", leaf_order);

    Dendrogram {
        n_leaves: n,
        merges,
        leaf_order,
    }
}

/// Left-first traversal from the root.
fn leaf_order(n_leaves: usize, merges: &[Merge]) -> Vec<usize> {
    if merges.is_empty() {
        return (0..n_leaves).collect();
    }
    let mut order = Vec::with_capacity(n_leaves);
    let mut stack = vec![n_leaves + merges.len() - 1];
    while let Some(node) = stack.pop() {
        if node < n_leaves {
            order.push(node);
        } else {
            let merge = &merges[node - n_leaves];
            stack.push(merge.right);
            stack.push(merge.left);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.0, 1.0],
            vec![10.0, 11.0],
            vec![5.0, 5.0],
        ]
    }

    #[test]
    fn test_euclidean_distances() {
        let d = euclidean_distances(&[vec![0.0, 0.0], vec![3.0, 4.0]]);
        assert_relative_eq!(d[0][1], 5.0);
        assert_relative_eq!(d[1][0], 5.0);
        assert_eq!(d[0][0], 0.0);
    }

    #[test]
    fn test_near_points_merge_first() {
        let tree = cluster(&points(), Linkage::Average);
        assert_eq!(tree.merges.len(), 4);
        assert_eq!((tree.merges[0].left, tree.merges[0].right), (0, 2));
        assert_relative_eq!(tree.merges[0].distance, 1.0);
        assert_eq!((tree.merges[1].left, tree.merges[1].right), (1, 3));
        assert_eq!(tree.merges.last().unwrap().size, 5);
    }

    #[test]
    fn test_leaf_order_keeps_clusters_adjacent() {
        let tree = cluster(&points(), Linkage::Average);
        let mut order = tree.leaf_order.clone();
        assert_eq!(order.len(), 5);
        let pos = |leaf: usize| tree.leaf_order.iter().position(|&l| l == leaf).unwrap();
        assert_eq!((pos(0) as i64 - pos(2) as i64).abs(), 1);
        assert_eq!((pos(1) as i64 - pos(3) as i64).abs(), 1);
        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_merge_distances_are_monotone() {
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
            let tree = cluster(&points(), linkage);
            for pair in tree.merges.windows(2) {
                assert!(pair[0].distance <= pair[1].distance);
            }
        }
    }

    #[test]
    fn test_single_vs_complete_linkage() {
        let line = vec![vec![0.0], vec![1.0], vec![3.0]];
        let single = cluster(&line, Linkage::Single);
        let complete = cluster(&line, Linkage::Complete);
        assert_relative_eq!(single.merges[1].distance, 2.0);
        assert_relative_eq!(complete.merges[1].distance, 3.0);
        assert_relative_eq!(cluster(&line, Linkage::Average).merges[1].distance, 2.5);
    }

    #[test]
    fn test_trivial_inputs() {
        let empty = cluster(&[], Linkage::Average);
        assert!(empty.leaf_order.is_empty());

        let one = cluster(&[vec![1.0]], Linkage::Average);
        assert!(one.merges.is_empty());
        assert_eq!(one.leaf_order, vec![0]);
        assert_eq!(one.max_distance(), 0.0);
    }

    #[test]
    fn test_node_coordinates() {
        let tree = cluster(&[vec![0.0], vec![2.0]], Linkage::Average);
        let coords = tree.node_coordinates();
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], (0.0, 0.0));
        assert_eq!(coords[1], (1.0, 0.0));
        assert_eq!(coords[2], (0.5, 2.0));
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let identical = vec![vec![1.0, 1.0]; 4];
        let a = cluster(&identical, Linkage::Average);
        let b = cluster(&identical, Linkage::Average);
        assert_eq!(a, b);
        assert_eq!(a.max_distance(), 0.0);
    }
}
