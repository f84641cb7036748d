use agri_types::{CostBreakdown, OptimizationMode, OptimizationRequest};
use serde::{Deserialize, Serialize};

/// Scoring rule for a search run. Higher scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    /// Negated absolute distance to the target yield.
    YieldTarget { target_yield: f64 },
    /// Net profit.
    ProfitMax,
}

impl Objective {
    pub fn from_request(request: &OptimizationRequest) -> Self {
        match request.mode {
            OptimizationMode::YieldTarget => Objective::YieldTarget {
                target_yield: request.target_yield,
            },
            OptimizationMode::ProfitMax => Objective::ProfitMax,
        }
    }

    pub fn score(&self, predicted_yield: f64, cost: &CostBreakdown) -> f64 {
        match self {
            Objective::YieldTarget { target_yield } => -(predicted_yield - target_yield).abs(),
            Objective::ProfitMax => cost.profit(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Objective::YieldTarget { .. } => "yield_target",
            Objective::ProfitMax => "profit_max",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yield_target_scores_negated_error() {
        let objective = Objective::from_request(&OptimizationRequest::yield_target(8500.0));
        let cost = CostBreakdown::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(objective.score(8000.0, &cost), -500.0);
        assert_eq!(objective.score(9000.0, &cost), -500.0);
        assert_eq!(objective.score(8500.0, &cost), 0.0);
    }

    #[test]
    fn test_profit_mode_scores_profit() {
        let objective = Objective::from_request(&OptimizationRequest::profit_max(6000.0));
        assert_eq!(objective, Objective::ProfitMax);
        let cost = CostBreakdown::new(10.0, 20.0, 30.0, 100.0);
        assert_eq!(objective.score(1.0, &cost), 40.0);
    }
}
