use serde::Serialize;

use crate::feature::FeatureVector;
use crate::pest::PestStrategy;

/// Revenue and cost components for one candidate. All totals are derived
/// in [`CostBreakdown::new`] and cannot be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    chem_cost: f64,
    organic_cost: f64,
    pest_cost: f64,
    total_cost: f64,
    revenue: f64,
    profit: f64,
}

impl CostBreakdown {
    pub fn new(chem_cost: f64, organic_cost: f64, pest_cost: f64, revenue: f64) -> Self {
        let total_cost = chem_cost + organic_cost + pest_cost;
        Self {
            chem_cost,
            organic_cost,
            pest_cost,
            total_cost,
            revenue,
            profit: revenue - total_cost,
        }
    }

    pub fn chem_cost(&self) -> f64 {
        self.chem_cost
    }

    pub fn organic_cost(&self) -> f64 {
        self.organic_cost
    }

    pub fn pest_cost(&self) -> f64 {
        self.pest_cost
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn revenue(&self) -> f64 {
        self.revenue
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }
}

/// Best candidate found by one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub best: FeatureVector,
    pub predicted_yield: f64,
    pub cost: CostBreakdown,
    pub pest_strategy: PestStrategy,
    /// Objective value of `best` (higher is better).
    pub score: f64,
}

impl OptimizationResult {
    pub fn pest_cost(&self) -> f64 {
        self.cost.pest_cost()
    }

    pub fn risk_reduction(&self) -> f64 {
        self.pest_strategy.risk_reduction()
    }
}

/// Response body returned to the API layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResultWire {
    pub n_kg: f64,
    pub p_kg: f64,
    pub k_kg: f64,
    pub organic_ton: f64,
    pub predicted_yield: f64,
    pub pest_cost: f64,
    pub risk_reduction: f64,
    pub cost_breakdown: CostBreakdown,
}

impl From<&OptimizationResult> for OptimizationResultWire {
    fn from(result: &OptimizationResult) -> Self {
        Self {
            n_kg: result.best.nitrogen(),
            p_kg: result.best.phosphorus(),
            k_kg: result.best.potassium(),
            organic_ton: result.best.organic_matter(),
            predicted_yield: result.predicted_yield,
            pest_cost: result.pest_cost(),
            risk_reduction: result.risk_reduction(),
            cost_breakdown: result.cost,
        }
    }
}
