//! Isolation forest (Liu, Ting & Zhou 2008): random axis-aligned partitioning; points
//! that isolate in fewer splits are more anomalous.

use crate::features::FeatureMatrix;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Average path length of an unsuccessful BST search over `n` points; normalizes tree depth.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One tree, stored as a flat arena with the root at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit(data: &FeatureMatrix, rows: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, rows, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        data: &FeatureMatrix,
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        if depth >= height_limit || rows.len() <= 1 {
            self.nodes.push(Node::Leaf { size: rows.len() });
            return id;
        }

        // Only features with a finite, non-zero spread in this node can separate anything.
        let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
            .filter_map(|f| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = data.get(r, f);
                    (lo.min(v), hi.max(v))
                });
                (hi > lo && (hi - lo).is_finite()).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            self.nodes.push(Node::Leaf { size: rows.len() });
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data.get(r, feature) < threshold);

        // Reserve the slot, then fill it once both children have ids.
        self.nodes.push(Node::Leaf { size: 0 });
        let left = self.grow(data, left_rows, depth + 1, height_limit, rng);
        let right = self.grow(data, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth at which `x` lands, plus the expected remaining depth of its leaf.
    pub fn path_length(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Subsample size each tree was grown on
    sample_size: usize,
    n_features: usize,
}

impl IsolationForest {
    /// Caller guarantees at least one row.
    pub fn fit(data: &FeatureMatrix, params: ForestParams, rng: &mut StdRng) -> Self {
        let n = data.nrows();
        let sample_size = params.max_samples.min(n).max(1);
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let rows = sample(rng, n, sample_size).into_vec();
                IsolationTree::fit(data, rows, height_limit, rng)
            })
            .collect();
        Self {
            trees,
            sample_size,
            n_features: data.ncols(),
        }
    }

    /// Negated isolation score `-2^(-E[h(x)] / c(ψ))`, in [-1, 0). Lower is more anomalous.
    pub fn score(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        if norm <= 0.0 {
            return -0.5;
        }
        -(2f64.powf(-mean_path / norm))
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}
