use std::time::Duration;

use agri_types::{Feature, FeatureVector, OptimizerError, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

use crate::acceptance::AcceptancePolicy;

/// Per-dimension Gaussian step sizes, in vector order. Dimensions with a
/// zero step never move.
pub const DEFAULT_STEP_SIZES: [f64; FEATURE_COUNT] =
    [25.0, 10.0, 15.0, 0.1, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Search starting point before fixed dimensions are applied.
pub const DEFAULT_START: [f64; FEATURE_COUNT] =
    [200.0, 60.0, 120.0, 6.5, 2000.0, 27.0, 2.0, 0.7, 0.8];

/// Tuning for [`crate::LocalSearchOptimizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Candidate evaluations per start.
    pub iterations: usize,
    pub step_sizes: [f64; FEATURE_COUNT],
    pub start: FeatureVector,
    pub acceptance: AcceptancePolicy,
    /// Additional starts from random points in the movable dimensions.
    pub restarts: usize,
    /// Wall-clock cap across all starts, checked once per iteration.
    pub max_duration_ms: Option<u64>,
    /// Keep the best-score trace in the run report.
    pub record_trace: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 250,
            step_sizes: DEFAULT_STEP_SIZES,
            start: FeatureVector::new(DEFAULT_START),
            acceptance: AcceptancePolicy::Greedy,
            restarts: 0,
            max_duration_ms: None,
            record_trace: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptancePolicy) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration_ms = Some(max_duration.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn with_step(mut self, feature: Feature, step: f64) -> Self {
        self.step_sizes[feature.index()] = step;
        self
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), OptimizerError> {
        for feature in Feature::ALL {
            let step = self.step_sizes[feature.index()];
            if !step.is_finite() || step < 0.0 {
                return Err(OptimizerError::InvalidConfig {
                    message: format!("step size for {feature} must be finite and >= 0, got {step}"),
                });
            }
        }
        self.acceptance
            .validate()
            .map_err(|message| OptimizerError::InvalidConfig { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_practice() {
        let config = OptimizerConfig::default();
        assert_eq!(config.iterations, 250);
        assert_eq!(config.start.nitrogen(), 200.0);
        assert_eq!(config.start.get(Feature::WaterAccess), 0.8);
        assert_eq!(config.step_sizes[Feature::Rainfall.index()], 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_step_is_rejected() {
        let config = OptimizerConfig::default().with_step(Feature::Nitrogen, -1.0);
        assert!(matches!(
            config.validate(),
            Err(OptimizerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: OptimizerConfig =
            serde_json::from_value(serde_json::json!({ "iterations": 40, "restarts": 2 })).unwrap();
        assert_eq!(config.iterations, 40);
        assert_eq!(config.restarts, 2);
        assert_eq!(config.step_sizes, DEFAULT_STEP_SIZES);
        assert_eq!(config.acceptance, AcceptancePolicy::Greedy);
    }
}
