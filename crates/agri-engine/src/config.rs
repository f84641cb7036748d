use std::path::{Path, PathBuf};

use agri_model::{CorpusConfig, ForestConfig, YieldResponse};
use agri_optimizer::{CostSchedule, OptimizerConfig};
use agri_types::{config_error, AgriResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable naming an engine config JSON file.
pub const CONFIG_ENV_VAR: &str = "AGRI_ENGINE_CONFIG";

pub const DEFAULT_MODEL_KEY: &str = "yield-surrogate";

/// Everything needed to build the surrogate and run the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registry key the surrogate is cached under.
    pub model_key: String,
    pub response: YieldResponse,
    pub corpus: CorpusConfig,
    pub forest: ForestConfig,
    pub costs: CostSchedule,
    pub optimizer: OptimizerConfig,
    /// Train the surrogate on first use. When false the model must be
    /// preloaded into the registry, or loaded from `model_path`.
    pub train_on_demand: bool,
    /// Serialized forest to load instead of training.
    pub model_path: Option<PathBuf>,
    /// Fresh samples scored against the trained model; 0 skips evaluation.
    pub holdout_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_key: DEFAULT_MODEL_KEY.to_string(),
            response: YieldResponse::default(),
            corpus: CorpusConfig::default(),
            forest: ForestConfig::default(),
            costs: CostSchedule::default(),
            optimizer: OptimizerConfig::default(),
            train_on_demand: true,
            model_path: None,
            holdout_samples: 0,
        }
    }
}

impl EngineConfig {
    pub fn with_model_key(mut self, key: impl Into<String>) -> Self {
        self.model_key = key.into();
        self
    }

    pub fn with_corpus(mut self, corpus: CorpusConfig) -> Self {
        self.corpus = corpus;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_train_on_demand(mut self, train_on_demand: bool) -> Self {
        self.train_on_demand = train_on_demand;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_holdout_samples(mut self, samples: usize) -> Self {
        self.holdout_samples = samples;
        self
    }

    pub fn from_json_file(path: &Path) -> AgriResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Read the file named by `AGRI_ENGINE_CONFIG`, or fall back to defaults.
    pub fn from_env() -> AgriResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_json_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> AgriResult<()> {
        if self.model_key.trim().is_empty() {
            return Err(config_error!("model_key must not be empty"));
        }
        if self.corpus.samples == 0 && self.model_path.is_none() && self.train_on_demand {
            return Err(config_error!("corpus.samples must be positive when training on demand"));
        }
        self.forest.validate()?;
        self.optimizer.validate()?;
        Ok(())
    }
}
