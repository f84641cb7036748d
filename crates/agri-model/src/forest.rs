//! Bagged regression-tree ensemble used as the yield surrogate.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use agri_types::{AgriResult, FeatureVector, ModelError, FEATURE_COUNT};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corpus::TrainingExample;
use crate::tree::{RegressionTree, TreeParams};
use crate::SurrogateModel;

/// Hyperparameters for [`RandomForest::train`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    /// Draw a bootstrap resample per tree; otherwise every tree sees the
    /// whole corpus.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 150,
            max_depth: 14,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidConfig {
                message: "n_trees must be at least 1".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig {
                message: "max_depth must be at least 1".to_string(),
            });
        }
        if let Some(m) = self.max_features {
            if m == 0 || m > FEATURE_COUNT {
                return Err(ModelError::InvalidConfig {
                    message: format!("max_features must be in 1..={FEATURE_COUNT}, got {m}"),
                });
            }
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

/// Random-forest regressor. Immutable once trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    training_samples: usize,
}

impl RandomForest {
    /// Train one tree per config entry in parallel. Tree `t` draws its
    /// bootstrap sample from ChaCha stream `t` of the configured seed, so the
    /// result does not depend on thread scheduling.
    pub fn train(corpus: &[TrainingExample], config: ForestConfig) -> Result<Self, ModelError> {
        config.validate()?;
        if corpus.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }

        info!(
            "Training random forest: {} trees, max depth {}, {} samples",
            config.n_trees,
            config.max_depth,
            corpus.len()
        );

        let x: Vec<[f64; FEATURE_COUNT]> =
            corpus.iter().map(|ex| *ex.features.as_array()).collect();
        let y: Vec<f64> = corpus.iter().map(|ex| ex.yield_kg_per_ha).collect();
        let n = corpus.len();
        let params = config.tree_params();

        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
                rng.set_stream(t as u64);
                let rows: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(&x, &y, rows, params, &mut rng)
            })
            .collect();

        let total_nodes: usize = trees.iter().map(RegressionTree::node_count).sum();
        debug!("Random forest trained with {} nodes in total", total_nodes);

        Ok(Self {
            config,
            trees,
            training_samples: n,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    pub fn save_json(&self, path: &Path) -> AgriResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> AgriResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let forest: Self = serde_json::from_reader(reader)?;
        if forest.trees.is_empty() {
            return Err(ModelError::InvalidConfig {
                message: format!("{} contains no trees", path.display()),
            }
            .into());
        }
        for (t, tree) in forest.trees.iter().enumerate() {
            tree.validate().map_err(|e| ModelError::InvalidConfig {
                message: format!("{} tree {t}: {e}", path.display()),
            })?;
        }
        Ok(forest)
    }
}

impl SurrogateModel for RandomForest {
    fn predict(&self, features: &FeatureVector) -> f64 {
        let row = features.as_array();
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
