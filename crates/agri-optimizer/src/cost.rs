//! Revenue and input-cost accounting for a candidate.

use agri_types::{CostBreakdown, FeatureVector, PestStrategy};
use serde::{Deserialize, Serialize};

/// Unit prices used by [`EconomicCostModel`]. All amounts are in the same
/// currency as `price_per_kg`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSchedule {
    pub nitrogen_per_kg: f64,
    pub phosphorus_per_kg: f64,
    pub potassium_per_kg: f64,
    pub organic_per_kg: f64,
    pub kg_per_ton: f64,
    /// Seasonal pest-control spend at cost factor 1.0.
    pub base_pest_cost: f64,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            nitrogen_per_kg: 15_000.0,
            phosphorus_per_kg: 20_000.0,
            potassium_per_kg: 18_000.0,
            organic_per_kg: 1_000.0,
            kg_per_ton: 1_000.0,
            base_pest_cost: 2_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EconomicCostModel {
    schedule: CostSchedule,
}

impl EconomicCostModel {
    pub fn new(schedule: CostSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &CostSchedule {
        &self.schedule
    }

    pub fn chem_cost(&self, v: &FeatureVector) -> f64 {
        v.nitrogen() * self.schedule.nitrogen_per_kg
            + v.phosphorus() * self.schedule.phosphorus_per_kg
            + v.potassium() * self.schedule.potassium_per_kg
    }

    pub fn organic_cost(&self, v: &FeatureVector) -> f64 {
        v.organic_matter() * self.schedule.kg_per_ton * self.schedule.organic_per_kg
    }

    pub fn pest_cost(&self, strategy: PestStrategy) -> f64 {
        self.schedule.base_pest_cost * strategy.cost_factor()
    }

    pub fn evaluate(
        &self,
        v: &FeatureVector,
        strategy: PestStrategy,
        price_per_kg: f64,
        predicted_yield: f64,
    ) -> CostBreakdown {
        CostBreakdown::new(
            self.chem_cost(v),
            self.organic_cost(v),
            self.pest_cost(strategy),
            predicted_yield * price_per_kg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_types::Feature;

    fn sample_vector() -> FeatureVector {
        FeatureVector::floor()
            .with(Feature::Nitrogen, 200.0)
            .with(Feature::Phosphorus, 60.0)
            .with(Feature::Potassium, 120.0)
            .with(Feature::OrganicMatter, 2.0)
    }

    #[test]
    fn test_known_breakdown() {
        let model = EconomicCostModel::default();
        let cost = model.evaluate(&sample_vector(), PestStrategy::IPM, 6000.0, 8000.0);

        // 200*15000 + 60*20000 + 120*18000
        assert_eq!(cost.chem_cost(), 6_360_000.0);
        assert_eq!(cost.organic_cost(), 2_000_000.0);
        assert_eq!(cost.pest_cost(), 3_000_000.0);
        assert_eq!(cost.revenue(), 48_000_000.0);
        assert_eq!(cost.total_cost(), 11_360_000.0);
        assert_eq!(cost.profit(), 36_640_000.0);
    }

    #[test]
    fn test_total_is_exact_sum_for_every_strategy() {
        let model = EconomicCostModel::default();
        let v = FeatureVector::new([123.4, 56.7, 89.1, 6.1, 1800.0, 26.0, 3.3, 0.4, 0.9]);
        for strategy in PestStrategy::ALL {
            let cost = model.evaluate(&v, strategy, 5321.5, 7700.25);
            assert_eq!(
                cost.total_cost(),
                cost.chem_cost() + cost.organic_cost() + cost.pest_cost()
            );
            assert_eq!(cost.profit(), cost.revenue() - cost.total_cost());
        }
    }

    #[test]
    fn test_pest_cost_order_and_profit_gap() {
        let model = EconomicCostModel::default();
        let v = sample_vector();
        let costs: Vec<f64> = PestStrategy::ALL.iter().map(|s| model.pest_cost(*s)).collect();
        assert!(costs.windows(2).all(|w| w[0] < w[1]));

        let organic = model.evaluate(&v, PestStrategy::Organic, 6000.0, 8500.0);
        let aggressive = model.evaluate(&v, PestStrategy::Aggressive, 6000.0, 8500.0);
        assert!(organic.profit() > aggressive.profit());
        assert_eq!(organic.profit() - aggressive.profit(), 6_000_000.0);
    }
}
