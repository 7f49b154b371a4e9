//! Regression trees for gradient boosting
//!
//! Trees are grown on pre-binned features (histogram split finding) and
//! stored with raw-value thresholds, so inference works on unbinned rows.
//! Traversal goes left when `value <= threshold` (and for NaN).

use serde::{Deserialize, Serialize};

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Node {
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Node::Split { feature, threshold, left, right }
    }

    pub fn leaf(value: f64) -> Self {
        Node::Leaf { value }
    }
}

/// Flat node list, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.traverse(|j| features[j])
    }

    /// Walk from the root using `value_of(feature_index)`
    pub fn traverse(&self, value_of: impl Fn(usize) -> f64) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    let x = value_of(*feature);
                    // NaN fails `x > threshold` and goes left
                    idx = if x > *threshold { *right } else { *left };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

// ============================================================================
// BINNED FEATURES
// ============================================================================

/// Column-major bin indices plus the cut points that define them.
///
/// `bin(v)` is the index of the first cut `>= v`, so `v <= cuts[k]`
/// exactly when `bin(v) <= k`.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    bins: Vec<Vec<u8>>,
    cuts: Vec<Vec<f64>>,
    rows: usize,
}

/// Values sampled per column when choosing cut points
const CUT_SAMPLE_LIMIT: usize = 200_000;

impl BinnedMatrix {
    /// `max_bins` is clamped to [2, 256]
    pub fn from_columns(columns: &[Vec<f64>], max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, 256);
        let rows = columns.first().map_or(0, Vec::len);

        let mut bins = Vec::with_capacity(columns.len());
        let mut cuts = Vec::with_capacity(columns.len());

        for column in columns {
            let column_cuts = quantile_cuts(column, max_bins);
            let column_bins = column
                .iter()
                .map(|&v| bin_of(&column_cuts, v))
                .collect();
            cuts.push(column_cuts);
            bins.push(column_bins);
        }

        Self { bins, cuts, rows }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn features(&self) -> usize {
        self.bins.len()
    }

    pub fn cuts(&self, feature: usize) -> &[f64] {
        &self.cuts[feature]
    }
}

fn bin_of(cuts: &[f64], value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    cuts.partition_point(|&c| c < value) as u8
}

/// At most `max_bins - 1` cut points. Few distinct values cut at midpoints,
/// many distinct values cut at (frequency) quantiles.
fn quantile_cuts(column: &[f64], max_bins: usize) -> Vec<f64> {
    let step = (column.len() / CUT_SAMPLE_LIMIT).max(1);
    let mut sorted: Vec<f64> = column
        .iter()
        .step_by(step)
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut distinct = sorted.clone();
    distinct.dedup();

    if distinct.len() <= 1 {
        return Vec::new();
    }

    if distinct.len() <= max_bins {
        return distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let max = distinct[distinct.len() - 1];
    let mut cuts: Vec<f64> = Vec::with_capacity(max_bins - 1);
    for q in 1..max_bins {
        let candidate = sorted[q * (sorted.len() - 1) / max_bins];
        if candidate < max && cuts.last().map_or(true, |&last| candidate > last) {
            cuts.push(candidate);
        }
    }
    cuts
}

// ============================================================================
// GROWTH
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// Depth-wise tree growth on gradient / hessian statistics
pub struct TreeGrower<'a> {
    data: &'a BinnedMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: GrowthParams,
    nodes: Vec<Node>,
}

impl<'a> TreeGrower<'a> {
    pub fn new(
        data: &'a BinnedMatrix,
        grad: &'a [f64],
        hess: &'a [f64],
        features: &'a [usize],
        params: GrowthParams,
    ) -> Self {
        Self {
            data,
            grad,
            hess,
            features,
            params,
            nodes: Vec::new(),
        }
    }

    /// Grow one tree over `rows`; leaf values already include the learning rate
    pub fn grow(mut self, rows: Vec<u32>) -> Tree {
        self.build(rows, 0);
        Tree::new(self.nodes)
    }

    fn build(&mut self, rows: Vec<u32>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::leaf(0.0));

        let (g, h) = rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            (g + self.grad[r as usize], h + self.hess[r as usize])
        });
        let leaf = Node::leaf(self.leaf_weight(g, h));

        if depth >= self.params.max_depth || rows.len() < 2 {
            self.nodes[id] = leaf;
            return id;
        }

        let Some(split) = self.best_split(&rows, g, h) else {
            self.nodes[id] = leaf;
            return id;
        };

        let bins = &self.data.bins[split.feature];
        let (left_rows, right_rows): (Vec<u32>, Vec<u32>) = rows
            .into_iter()
            .partition(|&r| (bins[r as usize] as usize) <= split.bin);

        let threshold = self.data.cuts[split.feature][split.bin];
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[id] = Node::split(split.feature, threshold, left, right);
        id
    }

    fn leaf_weight(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.lambda) * self.params.learning_rate
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn best_split(&self, rows: &[u32], g: f64, h: f64) -> Option<SplitCandidate> {
        let parent = self.score(g, h);
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.features {
            let cuts = &self.data.cuts[feature];
            if cuts.is_empty() {
                continue;
            }

            let bins = &self.data.bins[feature];
            let mut hist_g = vec![0.0; cuts.len() + 1];
            let mut hist_h = vec![0.0; cuts.len() + 1];
            for &r in rows {
                let b = bins[r as usize] as usize;
                hist_g[b] += self.grad[r as usize];
                hist_h[b] += self.hess[r as usize];
            }

            let (mut gl, mut hl) = (0.0, 0.0);
            for bin in 0..cuts.len() {
                gl += hist_g[bin];
                hl += hist_h[bin];
                let (gr, hr) = (g - gl, h - hl);
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }

                let gain = 0.5 * (self.score(gl, hl) + self.score(gr, hr) - parent)
                    - self.params.gamma;
                if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate { feature, bin, gain });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_traversal() {
        let tree = Tree::new(vec![
            Node::split(0, 50.0, 1, 2),
            Node::leaf(-1.0),
            Node::split(1, 0.5, 3, 4),
            Node::leaf(2.0),
            Node::leaf(3.0),
        ]);

        assert_eq!(tree.predict(&[30.0, 9.0]), -1.0);
        assert_eq!(tree.predict(&[50.0, 9.0]), -1.0);
        assert_eq!(tree.predict(&[60.0, 0.0]), 2.0);
        assert_eq!(tree.predict(&[60.0, 1.0]), 3.0);
        assert_eq!(tree.predict(&[f64::NAN, 1.0]), -1.0);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_bins_respect_cuts() {
        let column = vec![1.0, 2.0, 3.0, 4.0, 2.0];
        let data = BinnedMatrix::from_columns(&[column.clone()], 16);
        let cuts = data.cuts(0);
        assert_eq!(cuts, &[1.5, 2.5, 3.5]);

        for (i, &v) in column.iter().enumerate() {
            let b = data.bins[0][i] as usize;
            for (k, &cut) in cuts.iter().enumerate() {
                assert_eq!(v <= cut, b <= k);
            }
        }
    }

    #[test]
    fn test_quantile_cuts_are_bounded_and_increasing() {
        let column: Vec<f64> = (0..10_000).map(|i| (i % 997) as f64).collect();
        let cuts = quantile_cuts(&column, 32);
        assert!(!cuts.is_empty());
        assert!(cuts.len() <= 31);
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_constant_column_has_no_cuts() {
        let data = BinnedMatrix::from_columns(&[vec![5.0; 10]], 16);
        assert!(data.cuts(0).is_empty());
    }

    #[test]
    fn test_grower_finds_obvious_split() {
        // y = 1 when x > 5, gradients at p = 0.5
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| if v > 5.0 { 1.0 } else { 0.0 }).collect();
        let grad: Vec<f64> = y.iter().map(|&t| 0.5 - t).collect();
        let hess = vec![0.25; 10];

        let data = BinnedMatrix::from_columns(&[x], 64);
        let params = GrowthParams {
            max_depth: 1,
            learning_rate: 1.0,
            lambda: 0.0,
            gamma: 0.0,
            min_child_weight: 0.0,
        };
        let tree = TreeGrower::new(&data, &grad, &hess, &[0], params).grow((0..10).collect());

        match &tree.nodes()[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 5.5);
            }
            other => panic!("expected a split, got {:?}", other),
        }
        assert!(tree.predict(&[9.0]) > 0.0);
        assert!(tree.predict(&[1.0]) < 0.0);
    }
}
