//! # agri-engine
//!
//! Wires the model registry, the cost model and the local-search optimizer
//! behind one facade that speaks the request/response wire format.

pub mod config;

pub use config::{EngineConfig, CONFIG_ENV_VAR, DEFAULT_MODEL_KEY};

use std::sync::Arc;

use agri_model::{
    build_surrogate, evaluate, CorpusConfig, CorpusGenerator, ModelRegistry, RandomForest,
    SharedModel,
};
use agri_optimizer::{CancellationToken, EconomicCostModel, LocalSearchOptimizer, SearchReport};
use agri_types::{
    AgriResult, InputAdjustment, ModelError, OptimizationRequest, OptimizationRequestWire,
    OptimizationResultWire,
};
use tracing::{info, warn};

/// Optimization service over a shared model registry.
///
/// Cloning is cheap; clones share the registry, so the surrogate is trained
/// at most once no matter how many clones serve requests.
#[derive(Debug, Clone)]
pub struct AgriEngine {
    config: EngineConfig,
    registry: Arc<ModelRegistry>,
}

impl AgriEngine {
    pub fn new(config: EngineConfig, registry: Arc<ModelRegistry>) -> AgriResult<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// The surrogate for `config.model_key`, loading or training it on
    /// first use.
    pub fn surrogate(&self) -> AgriResult<SharedModel> {
        let key = self.config.model_key.as_str();

        if let Some(path) = &self.config.model_path {
            return self.registry.get_or_load(key, || -> AgriResult<SharedModel> {
                let forest = RandomForest::load_json(path)?;
                info!(
                    key,
                    path = %path.display(),
                    trees = forest.tree_count(),
                    "Loaded surrogate from disk"
                );
                let model: SharedModel = Arc::new(forest);
                Ok(model)
            });
        }

        if !self.config.train_on_demand {
            return Ok(self.registry.require(key)?);
        }

        let model = self.registry.get_or_train(key, || {
            let forest = build_surrogate(
                self.config.response,
                self.config.corpus,
                self.config.forest,
            )?;
            self.log_holdout(&forest)?;
            let model: SharedModel = Arc::new(forest);
            Ok(model)
        })?;
        Ok(model)
    }

    fn log_holdout(&self, forest: &RandomForest) -> Result<(), ModelError> {
        if self.config.holdout_samples == 0 {
            return Ok(());
        }
        let holdout = CorpusConfig::default()
            .with_samples(self.config.holdout_samples)
            .with_seed(self.config.corpus.seed.wrapping_add(1));
        let examples = CorpusGenerator::new(self.config.response).generate_seeded(holdout);
        let report = evaluate(forest, &examples)?;
        info!(
            samples = report.samples,
            rmse = report.rmse,
            mae = report.mae,
            r_squared = report.r_squared,
            "Surrogate holdout evaluation"
        );
        Ok(())
    }

    fn optimizer(&self) -> AgriResult<LocalSearchOptimizer> {
        let model = self.surrogate()?;
        let optimizer = LocalSearchOptimizer::new(
            model,
            EconomicCostModel::new(self.config.costs),
            self.config.optimizer.clone(),
        )?;
        Ok(optimizer)
    }

    /// Run a validated domain request to completion.
    pub fn optimize(&self, request: &OptimizationRequest) -> AgriResult<SearchReport> {
        self.run(request, &CancellationToken::new())
    }

    pub fn run(
        &self,
        request: &OptimizationRequest,
        cancel: &CancellationToken,
    ) -> AgriResult<SearchReport> {
        let optimizer = self.optimizer()?;
        let report = optimizer.run(request, cancel);
        info!(
            run_id = %report.id,
            mode = ?request.mode,
            score = report.result.score,
            predicted_yield = report.result.predicted_yield,
            "Optimization complete"
        );
        Ok(report)
    }

    /// Validate a wire request, optimize it and render the wire response.
    pub fn optimize_wire(
        &self,
        wire: OptimizationRequestWire,
    ) -> AgriResult<OptimizationResultWire> {
        let (request, adjustments) = wire.into_request()?;
        for adjustment in &adjustments {
            log_adjustment(adjustment);
        }
        let report = self.optimize(&request)?;
        Ok(OptimizationResultWire::from(&report.result))
    }
}

fn log_adjustment(adjustment: &InputAdjustment) {
    match adjustment {
        InputAdjustment::Clamped {
            feature,
            requested,
            applied,
        } => warn!(%feature, requested, applied, "Fixed parameter clamped to bounds"),
        InputAdjustment::UnknownPestStrategy { label, fallback } => {
            warn!(label = %label, fallback = %fallback, "Unknown pest strategy")
        }
    }
}
