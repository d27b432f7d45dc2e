//! Isolation forest (Liu, Ting & Zhou 2008) over a dense feature matrix.
//!
//! Construction draws from a single seeded `StdRng`, so the same matrix and seed
//! always grow the same trees.

use crate::config::ModelConfig;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl Node {
    fn path_length(&self, sample: ArrayView1<f64>, depth: usize) -> f64 {
        match self {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] < *threshold {
                    left.path_length(sample, depth + 1)
                } else {
                    right.path_length(sample, depth + 1)
                }
            }
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points; normalises
/// depths and credits leaves that stopped splitting early.
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

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(data: ArrayView2<f64>, rows: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: build_node(data, rows, 0, max_depth, rng),
        }
    }
}

fn build_node(
    data: ArrayView2<f64>,
    rows: &mut [usize],
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only columns that still vary inside this node can split it.
    let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|f| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, f]];
                (lo.min(v), hi.max(v))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();
    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(lo..hi);

    let mut split = 0;
    for j in 0..rows.len() {
        if data[[rows[j], feature]] < threshold {
            rows.swap(split, j);
            split += 1;
        }
    }
    if split == 0 || split == rows.len() {
        return Node::Leaf { size: rows.len() };
    }

    let (left_rows, right_rows) = rows.split_at_mut(split);
    let left = Box::new(build_node(data, left_rows, depth + 1, max_depth, rng));
    let right = Box::new(build_node(data, right_rows, depth + 1, max_depth, rng));
    Node::Split {
        feature,
        threshold,
        left,
        right,
    }
}

/// Ensemble of isolation trees fitted on one batch.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Each tree sees `min(max_samples, rows)` rows drawn without replacement and
    /// grows to at most `ceil(log2(sample_size))` levels.
    pub fn fit(data: ArrayView2<f64>, config: &ModelConfig) -> Self {
        let n = data.nrows();
        let sample_size = config.max_samples.clamp(1, n.max(1));
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = if n == 0 {
            Vec::new()
        } else {
            (0..config.n_trees.max(1))
                .map(|_| {
                    let mut rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                    IsolationTree::build(data, &mut rows, max_depth, &mut rng)
                })
                .collect()
        };

        Self { trees, sample_size }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn mean_path_length(&self, sample: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees
            .iter()
            .map(|t| t.root.path_length(sample, 0))
            .sum::<f64>()
            / self.trees.len() as f64
    }

    /// `2^(-E[h(x)] / c(sample_size))`: near 1 for easily isolated rows, at or below
    /// 0.5 for typical ones.
    pub fn score(&self, sample: ArrayView1<f64>) -> f64 {
        let c = average_path_length(self.sample_size);
        if self.trees.is_empty() || c == 0.0 {
            return 0.5;
        }
        2f64.powf(-self.mean_path_length(sample) / c)
    }

    pub fn score_all(&self, data: ArrayView2<f64>) -> Vec<f64> {
        data.outer_iter().map(|row| self.score(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn clustered_with_outliers() -> Array2<f64> {
        let mut rows: Vec<f64> = Vec::new();
        for i in 0..60 {
            let jitter = f64::from(i % 7) * 0.1;
            rows.extend([2.0 + jitter, 2.0 - jitter, 1.0]);
        }
        rows.extend([40.0, -30.0, 9.0]);
        rows.extend([-25.0, 35.0, -7.0]);
        Array2::from_shape_vec((62, 3), rows).unwrap()
    }

    #[test]
    fn c_matches_known_values() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // 2(ln 255 + gamma) - 2*255/256
        assert!((average_path_length(256) - 10.244_770_920_119_917).abs() < 1e-9);
    }

    #[test]
    fn outliers_score_highest() {
        let data = clustered_with_outliers();
        let forest = IsolationForest::fit(data.view(), &ModelConfig::default());
        let scores = forest.score_all(data.view());
        let max_inlier = scores[..60].iter().cloned().fold(f64::MIN, f64::max);
        assert!(scores[60] > max_inlier);
        assert!(scores[61] > max_inlier);
        assert!(scores[60] > 0.6);
    }

    #[test]
    fn same_seed_same_scores() {
        let data = clustered_with_outliers();
        let cfg = ModelConfig::default();
        let a = IsolationForest::fit(data.view(), &cfg).score_all(data.view());
        let b = IsolationForest::fit(data.view(), &cfg).score_all(data.view());
        assert_eq!(a, b);
    }

    #[test]
    fn constant_matrix_never_splits() {
        let data = Array2::from_elem((10, 4), 3.0);
        let forest = IsolationForest::fit(data.view(), &ModelConfig::default());
        let scores = forest.score_all(data.view());
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn two_rows_fit() {
        let data = array![[0.0, 1.0], [5.0, 1.0]];
        let forest = IsolationForest::fit(data.view(), &ModelConfig::default());
        assert_eq!(forest.n_trees(), 100);
        // both isolated after one split: h = 1, c(2) = 1
        assert!((forest.score(data.row(0)) - 0.5).abs() < 1e-12);
    }
}
