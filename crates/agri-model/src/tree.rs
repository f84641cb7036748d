//! CART regression tree with variance-reduction splits.

use agri_types::{ModelError, FEATURE_COUNT};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 14,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct TreeBuilder<'a, R: ?Sized> {
    x: &'a [[f64; FEATURE_COUNT]],
    y: &'a [f64],
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a tree on the rows named by `rows` (duplicates allowed, as produced
    /// by bootstrap sampling). `rows` must be non-empty.
    pub fn fit<R: Rng + ?Sized>(
        x: &[[f64; FEATURE_COUNT]],
        y: &[f64],
        mut rows: Vec<usize>,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.build(&mut rows, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Structural check for trees that did not come from [`fit`], e.g. a
    /// deserialized forest. Children must sit after their parent and inside
    /// the arena, so [`predict`] always terminates.
    ///
    /// [`fit`]: RegressionTree::fit
    /// [`predict`]: RegressionTree::predict
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidConfig {
                message: "tree has no nodes".to_string(),
            });
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelError::InvalidConfig {
                        message: format!("node {idx} splits on unknown feature {feature}"),
                    });
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(ModelError::InvalidConfig {
                            message: format!(
                                "node {idx} points at child {child} outside {}..{}",
                                idx + 1,
                                self.nodes.len()
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
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

impl<'a, R: Rng + ?Sized> TreeBuilder<'a, R> {
    fn build(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let n = rows.len();
        let sum: f64 = rows.iter().map(|&i| self.y[i]).sum();
        let mean = sum / n as f64;

        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let min_leaf = self.params.min_samples_leaf.max(1);
        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * min_leaf
        {
            return node_idx;
        }

        let Some(split) = self.best_split(rows, sum, min_leaf) else {
            return node_idx;
        };

        let mut boundary = 0;
        for j in 0..n {
            if self.x[rows[j]][split.feature] <= split.threshold {
                rows.swap(boundary, j);
                boundary += 1;
            }
        }
        let (left_rows, right_rows) = rows.split_at_mut(boundary);

        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        match self.params.max_features {
            Some(m) if m > 0 && m < FEATURE_COUNT => {
                let mut picked = index::sample(&mut *self.rng, FEATURE_COUNT, m).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..FEATURE_COUNT).collect(),
        }
    }

    /// Best split by sum-of-squares reduction. Maximizing
    /// `sl^2/nl + sr^2/nr` is equivalent to minimizing child SSE.
    fn best_split(
        &mut self,
        rows: &[usize],
        total: f64,
        min_leaf: usize,
    ) -> Option<SplitCandidate> {
        let n = rows.len();
        let parent_score = total * total / n as f64;
        let mut best: Option<SplitCandidate> = None;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in self.candidate_features() {
            column.clear();
            column.extend(rows.iter().map(|&i| (self.x[i][feature], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += column[k - 1].1;
                let (lo, hi) = (column[k - 1].0, column[k].0);
                if k < min_leaf || n - k < min_leaf || lo >= hi {
                    continue;
                }
                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
                let improves = best.as_ref().map_or(score > parent_score, |b| score > b.score);
                if improves {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        // Guard against float noise producing a "split" with no real gain.
        best.filter(|b| b.score - parent_score > 1e-9 * parent_score.abs().max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn row(first: f64) -> [f64; FEATURE_COUNT] {
        let mut r = [0.0; FEATURE_COUNT];
        r[0] = first;
        r
    }

    #[test]
    fn test_fitted_tree_passes_validation() {
        let x: Vec<_> = (0..30).map(|i| row(i as f64)).collect();
        let y: Vec<_> = (0..30).map(|i| (i % 7) as f64).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let tree = RegressionTree::fit(&x, &y, (0..30).collect(), TreeParams::default(), &mut rng);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_corrupt_trees_fail_validation() {
        let empty = RegressionTree { nodes: vec![] };
        let self_loop = RegressionTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 0,
            }],
        };
        let dangling = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 1,
                    right: 5,
                },
                Node::Leaf { value: 1.0 },
            ],
        };
        let bad_feature = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: FEATURE_COUNT,
                    threshold: 1.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 1.0 },
                Node::Leaf { value: 2.0 },
            ],
        };

        for tree in [empty, self_loop, dangling, bad_feature] {
            assert!(matches!(
                tree.validate(),
                Err(ModelError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_step_function_is_learned_exactly() {
        let x: Vec<_> = (0..20).map(|i| row(i as f64)).collect();
        let y: Vec<_> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, &y, (0..20).collect(), TreeParams::default(), &mut rng);

        assert_eq!(tree.predict(&row(3.0)), 1.0);
        assert_eq!(tree.predict(&row(9.4)), 1.0);
        assert_eq!(tree.predict(&row(9.6)), 5.0);
        assert_eq!(tree.predict(&row(100.0)), 5.0);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_constant_target_yields_single_leaf() {
        let x: Vec<_> = (0..10).map(|i| row(i as f64)).collect();
        let y = vec![7.5; 10];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, &y, (0..10).collect(), TreeParams::default(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&row(4.0)), 7.5);
    }

    #[test]
    fn test_depth_limit_is_respected() {
        let x: Vec<_> = (0..64).map(|i| row(i as f64)).collect();
        let y: Vec<_> = (0..64).map(|i| (i * i) as f64).collect();
        let params = TreeParams {
            max_depth: 3,
            ..TreeParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, &y, (0..64).collect(), params, &mut rng);
        assert!(tree.depth() <= 3);
        assert!(tree.leaf_count() <= 8);
    }

    #[test]
    fn test_min_samples_leaf_blocks_tiny_children() {
        let x: Vec<_> = (0..6).map(|i| row(i as f64)).collect();
        let y = vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        let params = TreeParams {
            min_samples_leaf: 2,
            ..TreeParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, &y, (0..6).collect(), params, &mut rng);
        // The outlier cannot be isolated, so it shares a leaf with a neighbour.
        assert_eq!(tree.predict(&row(5.0)), 50.0);
    }
}
