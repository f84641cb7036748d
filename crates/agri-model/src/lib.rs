//! # agri-model
//!
//! Synthetic corpus generation, regression-forest training and the
//! compute-once model registry behind the AgriOpt surrogate.

pub mod corpus;
pub mod evaluation;
pub mod forest;
pub mod registry;
pub mod tree;

pub use corpus::{CorpusConfig, CorpusGenerator, StressTerms, TrainingExample, YieldResponse};
pub use evaluation::{evaluate, ModelReport};
pub use forest::{ForestConfig, RandomForest};
pub use registry::{ModelRegistry, RegistryStats};
pub use tree::{RegressionTree, TreeParams};

use std::sync::Arc;

use agri_types::{FeatureVector, ModelError};

/// A trained yield regressor. `predict` must be pure and total over the
/// box-constrained input space.
pub trait SurrogateModel: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> f64;

    /// Human-readable model family name.
    fn name(&self) -> &str;
}

/// Shared read-only handle to a trained model.
pub type SharedModel = Arc<dyn SurrogateModel>;

/// Generate the synthetic corpus and train a forest on it.
pub fn build_surrogate(
    response: YieldResponse,
    corpus: CorpusConfig,
    forest: ForestConfig,
) -> Result<RandomForest, ModelError> {
    let examples = CorpusGenerator::new(response).generate_seeded(corpus);
    RandomForest::train(&examples, forest)
}
