//! Constrained stochastic local search over the feature box.

use std::time::Instant;

use agri_model::SharedModel;
use agri_types::{
    CostBreakdown, Feature, FeatureVector, FixedParams, OptimizationRequest, OptimizationResult,
    OptimizerError,
};
use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::config::OptimizerConfig;
use crate::cost::EconomicCostModel;
use crate::objective::Objective;
use crate::report::{SearchReport, TerminationReason};

/// A scored candidate.
#[derive(Debug, Clone, Copy)]
struct Evaluation {
    predicted_yield: f64,
    cost: CostBreakdown,
    score: f64,
}

/// Searches for the inputs that best satisfy an [`OptimizationRequest`]
/// against a shared, read-only surrogate.
///
/// The optimizer itself holds no per-run state; every call to [`run`]
/// owns its RNG and search points, so one instance may serve concurrent
/// requests.
///
/// [`run`]: LocalSearchOptimizer::run
#[derive(Debug, Clone)]
pub struct LocalSearchOptimizer {
    model: SharedModel,
    cost_model: EconomicCostModel,
    config: OptimizerConfig,
}

impl LocalSearchOptimizer {
    pub fn new(
        model: SharedModel,
        cost_model: EconomicCostModel,
        config: OptimizerConfig,
    ) -> Result<Self, OptimizerError> {
        config.validate()?;
        Ok(Self {
            model,
            cost_model,
            config,
        })
    }

    pub fn with_defaults(model: SharedModel) -> Self {
        Self {
            model,
            cost_model: EconomicCostModel::default(),
            config: OptimizerConfig::default(),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn cost_model(&self) -> &EconomicCostModel {
        &self.cost_model
    }

    /// Configured start point with the request's organic start and fixed
    /// dimensions applied.
    pub fn initial_point(&self, request: &OptimizationRequest) -> FeatureVector {
        let mut start = self.config.start;
        if let Some(organic) = request.organic_start {
            start.set(Feature::OrganicMatter, organic);
        }
        request.fixed_params.apply(&mut start);
        start
    }

    pub fn optimize(&self, request: &OptimizationRequest) -> OptimizationResult {
        self.run(request, &CancellationToken::new()).result
    }

    pub fn run(&self, request: &OptimizationRequest, cancel: &CancellationToken) -> SearchReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let deadline = self.config.max_duration();
        let objective = Objective::from_request(request);
        let fixed = &request.fixed_params;
        let mut rng = ChaCha8Rng::seed_from_u64(request.seed);

        let initial = self.initial_point(request);
        let initial_score = self.evaluate(&initial, request, &objective).score;

        info!(
            "Starting {} search: {} iterations x {} start(s), {} fixed dimension(s), seed {}",
            objective.name(),
            self.config.iterations,
            self.config.restarts + 1,
            fixed.len(),
            request.seed
        );

        let mut best: Option<FeatureVector> = None;
        let mut best_score = f64::NEG_INFINITY;
        let mut trace = Vec::new();
        let mut iterations_run = 0;
        let mut starts_run = 0;
        let mut moves_accepted = 0;
        let mut termination = TerminationReason::BudgetExhausted;

        'starts: for start in 0..=self.config.restarts {
            let mut current = if start == 0 {
                initial
            } else {
                self.restart_point(&initial, fixed, &mut rng)
            };
            let mut current_score = f64::NEG_INFINITY;
            starts_run += 1;

            for step in 0..self.config.iterations {
                if cancel.is_cancelled() {
                    termination = TerminationReason::Cancelled;
                    break 'starts;
                }
                if deadline.is_some_and(|limit| clock.elapsed() >= limit) {
                    termination = TerminationReason::DeadlineReached;
                    break 'starts;
                }

                let candidate = self.mutate(&current, fixed, &mut rng);
                let score = self.evaluate(&candidate, request, &objective).score;

                if score > current_score {
                    current = candidate;
                    current_score = score;
                    moves_accepted += 1;
                    if score > best_score {
                        debug!(
                            "Iteration {}: best score {} -> {}",
                            iterations_run, best_score, score
                        );
                        best_score = score;
                        best = Some(candidate);
                    }
                } else if self
                    .config
                    .acceptance
                    .accept_worse(score - current_score, step, &mut rng)
                {
                    current = candidate;
                    current_score = score;
                    moves_accepted += 1;
                }

                iterations_run += 1;
                if self.config.record_trace {
                    trace.push(best_score);
                }
            }
        }

        let best = best.unwrap_or(initial);
        let final_eval = self.evaluate(&best, request, &objective);

        info!(
            "Search finished after {} iterations ({:?}): predicted yield {:.1} kg/ha, score {:.3}",
            iterations_run, termination, final_eval.predicted_yield, final_eval.score
        );

        SearchReport {
            id: Uuid::new_v4(),
            result: OptimizationResult {
                best,
                predicted_yield: final_eval.predicted_yield,
                cost: final_eval.cost,
                pest_strategy: request.pest_strategy,
                score: final_eval.score,
            },
            initial_score,
            iterations_run,
            starts_run,
            moves_accepted,
            best_score_trace: trace,
            termination,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn evaluate(
        &self,
        candidate: &FeatureVector,
        request: &OptimizationRequest,
        objective: &Objective,
    ) -> Evaluation {
        let predicted_yield = self.model.predict(candidate);
        let cost = self.cost_model.evaluate(
            candidate,
            request.pest_strategy,
            request.price_per_kg,
            predicted_yield,
        );
        Evaluation {
            predicted_yield,
            cost,
            score: objective.score(predicted_yield, &cost),
        }
    }

    fn is_movable(&self, feature: Feature, fixed: &FixedParams) -> bool {
        self.config.step_sizes[feature.index()] > 0.0 && !fixed.is_fixed(feature)
    }

    /// Gaussian perturbation, projection onto the box, then fixed values.
    fn mutate<R: Rng + ?Sized>(
        &self,
        current: &FeatureVector,
        fixed: &FixedParams,
        rng: &mut R,
    ) -> FeatureVector {
        let mut values = *current.as_array();
        for feature in Feature::ALL {
            if !self.is_movable(feature, fixed) {
                continue;
            }
            let z: f64 = rng.sample(StandardNormal);
            values[feature.index()] += z * self.config.step_sizes[feature.index()];
        }
        let mut candidate = FeatureVector::new(values);
        fixed.apply(&mut candidate);
        candidate
    }

    /// Uniform draw over the movable dimensions; the rest keep `base`.
    fn restart_point<R: Rng + ?Sized>(
        &self,
        base: &FeatureVector,
        fixed: &FixedParams,
        rng: &mut R,
    ) -> FeatureVector {
        let mut point = *base;
        for feature in Feature::ALL {
            if self.is_movable(feature, fixed) {
                let bound = feature.bound();
                point.set(feature, rng.gen_range(bound.min..=bound.max));
            }
        }
        fixed.apply(&mut point);
        point
    }
}
