use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AgriResult;
use crate::validation_error;
use crate::feature::{Feature, FeatureVector};
use crate::pest::PestStrategy;

/// Seed used when a request does not carry one.
pub const DEFAULT_SEED: u64 = 42;

/// Default farm-gate price per kg of harvest.
pub const DEFAULT_PRICE_PER_KG: f64 = 6000.0;

/// What the optimizer is asked to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationMode {
    /// Minimize |predicted yield - target yield|.
    #[serde(rename = "Yield")]
    YieldTarget,
    /// Maximize revenue minus total input cost.
    #[serde(rename = "Profit")]
    ProfitMax,
}

impl Default for OptimizationMode {
    fn default() -> Self {
        Self::YieldTarget
    }
}

/// Dimensions the optimizer must hold at an exact value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FixedParamsFields")]
pub struct FixedParams {
    values: BTreeMap<Feature, f64>,
}

/// Deserialization proxy; every entry goes through [`FixedParams::fix`].
#[derive(Deserialize)]
struct FixedParamsFields {
    #[serde(default)]
    values: BTreeMap<Feature, f64>,
}

impl From<FixedParamsFields> for FixedParams {
    fn from(fields: FixedParamsFields) -> Self {
        let mut fixed = FixedParams::new();
        for (feature, value) in fields.values {
            fixed.fix(feature, value);
        }
        fixed
    }
}

impl FixedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix a dimension. The value is clamped into the feature's bound; the
    /// stored value is returned so callers can report the adjustment.
    pub fn fix(&mut self, feature: Feature, value: f64) -> f64 {
        let clamped = feature.bound().clamp(value);
        self.values.insert(feature, clamped);
        clamped
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.fix(feature, value);
        self
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    pub fn is_fixed(&self, feature: Feature) -> bool {
        self.values.contains_key(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrite every fixed dimension of `vector` with its exact value.
    pub fn apply(&self, vector: &mut FeatureVector) {
        for (feature, value) in self.iter() {
            vector.set(feature, value);
        }
    }
}

/// Validated optimization request consumed by the optimizer core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub target_yield: f64,
    pub mode: OptimizationMode,
    pub fixed_params: FixedParams,
    pub price_per_kg: f64,
    pub pest_strategy: PestStrategy,
    /// Starting organic-matter input when organic matter is not fixed.
    pub organic_start: Option<f64>,
    pub seed: u64,
}

impl OptimizationRequest {
    pub fn new(mode: OptimizationMode, target_yield: f64, price_per_kg: f64) -> Self {
        Self {
            target_yield,
            mode,
            fixed_params: FixedParams::new(),
            price_per_kg,
            pest_strategy: PestStrategy::default(),
            organic_start: None,
            seed: DEFAULT_SEED,
        }
    }

    pub fn yield_target(target_yield: f64) -> Self {
        Self::new(OptimizationMode::YieldTarget, target_yield, DEFAULT_PRICE_PER_KG)
    }

    pub fn profit_max(price_per_kg: f64) -> Self {
        Self::new(OptimizationMode::ProfitMax, 0.0, price_per_kg)
    }

    pub fn with_fixed(mut self, feature: Feature, value: f64) -> Self {
        self.fixed_params.fix(feature, value);
        self
    }

    pub fn with_pest_strategy(mut self, strategy: PestStrategy) -> Self {
        self.pest_strategy = strategy;
        self
    }

    pub fn with_organic_start(mut self, organic_ton: f64) -> Self {
        self.organic_start = Some(organic_ton);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// `fixed_params` object as sent by the API layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedParamsWire {
    pub rain: Option<f64>,
    pub temp: Option<f64>,
    pub texture: Option<f64>,
    pub org_start: Option<f64>,
    pub fixed_org: Option<f64>,
    pub pest_strategy: Option<String>,
}

/// Optimization request as sent by the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequestWire {
    #[serde(default)]
    pub target_yield: Option<f64>,
    #[serde(default)]
    pub optimization_mode: OptimizationMode,
    #[serde(default = "default_price")]
    pub price_per_kg: f64,
    #[serde(default)]
    pub fixed_params: FixedParamsWire,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_price() -> f64 {
    DEFAULT_PRICE_PER_KG
}

/// Something the wire conversion changed instead of rejecting.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAdjustment {
    Clamped {
        feature: Feature,
        requested: f64,
        applied: f64,
    },
    UnknownPestStrategy {
        label: String,
        fallback: PestStrategy,
    },
}

/// Rainfall, temperature and texture are always held fixed; these apply
/// when the caller leaves them out.
pub const DEFAULT_RAINFALL_MM: f64 = 2000.0;
pub const DEFAULT_TEMPERATURE_C: f64 = 27.0;
pub const DEFAULT_SOIL_TEXTURE: f64 = 0.7;

impl OptimizationRequestWire {
    /// Reject inputs the optimizer core assumes away.
    pub fn validate(&self) -> AgriResult<()> {
        if !self.price_per_kg.is_finite() || self.price_per_kg <= 0.0 {
            return Err(validation_error!(
                "price_per_kg must be a positive number, got {}",
                self.price_per_kg
            ));
        }
        match (self.optimization_mode, self.target_yield) {
            (OptimizationMode::YieldTarget, None) => {
                Err(validation_error!("target_yield is required for Yield mode"))
            }
            (_, Some(target)) if !target.is_finite() || target <= 0.0 => Err(validation_error!(
                "target_yield must be a positive number, got {target}"
            )),
            _ => Ok(()),
        }
    }

    /// Validate and convert into the domain request, reporting every value
    /// that was clamped or defaulted.
    pub fn into_request(self) -> AgriResult<(OptimizationRequest, Vec<InputAdjustment>)> {
        self.validate()?;

        let mut adjustments = Vec::new();
        let mut fixed = FixedParams::new();
        let wire = &self.fixed_params;

        let mut fix = |feature: Feature, requested: f64| {
            let applied = fixed.fix(feature, requested);
            if applied != requested {
                adjustments.push(InputAdjustment::Clamped {
                    feature,
                    requested,
                    applied,
                });
            }
        };

        fix(Feature::Rainfall, wire.rain.unwrap_or(DEFAULT_RAINFALL_MM));
        fix(Feature::Temperature, wire.temp.unwrap_or(DEFAULT_TEMPERATURE_C));
        fix(Feature::SoilTexture, wire.texture.unwrap_or(DEFAULT_SOIL_TEXTURE));
        if let Some(org) = wire.fixed_org {
            fix(Feature::OrganicMatter, org);
        }

        let pest_strategy = match wire.pest_strategy.as_deref() {
            None => PestStrategy::default(),
            Some(label) => PestStrategy::from_label(label).unwrap_or_else(|| {
                adjustments.push(InputAdjustment::UnknownPestStrategy {
                    label: label.to_string(),
                    fallback: PestStrategy::default(),
                });
                PestStrategy::default()
            }),
        };

        let organic_start = wire.org_start.map(|requested| {
            let applied = Feature::OrganicMatter.bound().clamp(requested);
            if applied != requested {
                adjustments.push(InputAdjustment::Clamped {
                    feature: Feature::OrganicMatter,
                    requested,
                    applied,
                });
            }
            applied
        });

        let request = OptimizationRequest {
            target_yield: self.target_yield.unwrap_or(0.0),
            mode: self.optimization_mode,
            fixed_params: fixed,
            price_per_kg: self.price_per_kg,
            pest_strategy,
            organic_start,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
        };

        Ok((request, adjustments))
    }
}
