//! Synthetic training corpus drawn from a hand-designed yield response.

use agri_types::{Feature, FeatureVector, FEATURE_COUNT};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::SurrogateModel;

/// One labeled example: inputs and the observed yield in kg/ha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub yield_kg_per_ha: f64,
}

/// Individual multiplicative factors of the response surface.
///
/// Every `stress_*` term lies in [0, 1]; `organic_bonus` is >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressTerms {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    pub temperature: f64,
    pub water: f64,
    pub organic_bonus: f64,
}

impl StressTerms {
    pub fn nutrient_product(&self) -> f64 {
        self.nitrogen * self.phosphorus * self.potassium
    }

    pub fn stress_product(&self) -> f64 {
        self.nutrient_product() * self.ph * self.temperature * self.water
    }
}

/// Parameters of the biological yield response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldResponse {
    /// Yield at zero stress and no organic input (kg/ha).
    pub base_max_yield: f64,
    pub nitrogen_rate: f64,
    pub phosphorus_rate: f64,
    pub potassium_rate: f64,
    pub optimal_ph: f64,
    pub ph_spread: f64,
    pub optimal_temperature: f64,
    pub temperature_spread: f64,
    /// Share of rainfall that reaches the root zone.
    pub rainfall_share: f64,
    /// Irrigation water (mm equivalent) at full water access.
    pub irrigation_capacity_mm: f64,
    pub water_rate: f64,
    /// Available water (mm) below which the crop is fully stressed.
    pub water_threshold_mm: f64,
    /// Yield bonus per ton/ha of organic matter.
    pub organic_bonus_rate: f64,
    /// Standard deviation of biological variability (kg/ha).
    pub noise_std: f64,
}

impl Default for YieldResponse {
    fn default() -> Self {
        Self {
            base_max_yield: 12000.0,
            nitrogen_rate: 0.012,
            phosphorus_rate: 0.04,
            potassium_rate: 0.015,
            optimal_ph: 6.5,
            ph_spread: 1.2,
            optimal_temperature: 27.0,
            temperature_spread: 5.0,
            rainfall_share: 0.4,
            irrigation_capacity_mm: 1000.0,
            water_rate: 0.0015,
            water_threshold_mm: 300.0,
            organic_bonus_rate: 0.015,
            noise_std: 500.0,
        }
    }
}

fn saturating(rate: f64, x: f64) -> f64 {
    1.0 - (-rate * x).exp()
}

fn bell(x: f64, center: f64, spread: f64) -> f64 {
    (-0.5 * ((x - center) / spread).powi(2)).exp()
}

impl YieldResponse {
    pub fn stress_terms(&self, v: &FeatureVector) -> StressTerms {
        let retention = 0.5 + 0.5 * v.get(Feature::SoilTexture);
        let total_water = v.get(Feature::Rainfall) * self.rainfall_share
            + v.get(Feature::WaterAccess) * self.irrigation_capacity_mm;
        let available = total_water * retention;
        let water =
            saturating(self.water_rate, available - self.water_threshold_mm).clamp(0.0, 1.0);

        StressTerms {
            nitrogen: saturating(self.nitrogen_rate, v.nitrogen()),
            phosphorus: saturating(self.phosphorus_rate, v.phosphorus()),
            potassium: saturating(self.potassium_rate, v.potassium()),
            ph: bell(v.get(Feature::SoilPh), self.optimal_ph, self.ph_spread),
            temperature: bell(
                v.get(Feature::Temperature),
                self.optimal_temperature,
                self.temperature_spread,
            ),
            water,
            organic_bonus: 1.0 + v.organic_matter() * self.organic_bonus_rate,
        }
    }

    /// Noise-free yield, floored at zero.
    pub fn expected_yield(&self, v: &FeatureVector) -> f64 {
        let terms = self.stress_terms(v);
        (self.base_max_yield * terms.stress_product() * terms.organic_bonus).max(0.0)
    }

    /// Expected yield perturbed by one Gaussian draw, floored at zero.
    pub fn sample_yield<R: Rng + ?Sized>(&self, v: &FeatureVector, rng: &mut R) -> f64 {
        let terms = self.stress_terms(v);
        let z: f64 = rng.sample(StandardNormal);
        let noisy =
            self.base_max_yield * terms.stress_product() * terms.organic_bonus + z * self.noise_std;
        noisy.max(0.0)
    }
}

/// The noise-free response can stand in for a trained surrogate, e.g. to
/// benchmark the optimizer against ground truth.
impl SurrogateModel for YieldResponse {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.expected_yield(features)
    }

    fn name(&self) -> &str {
        "yield_response"
    }
}

/// Corpus size and seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub samples: usize,
    pub seed: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            samples: 3000,
            seed: 42,
        }
    }
}

impl CorpusConfig {
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Draws feature vectors uniformly over the global box and labels them with
/// [`YieldResponse::sample_yield`].
#[derive(Debug, Clone, Default)]
pub struct CorpusGenerator {
    response: YieldResponse,
}

impl CorpusGenerator {
    pub fn new(response: YieldResponse) -> Self {
        Self { response }
    }

    pub fn response(&self) -> &YieldResponse {
        &self.response
    }

    pub fn sample_features<R: Rng + ?Sized>(rng: &mut R) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            let bound = feature.bound();
            values[feature.index()] = rng.gen_range(bound.min..=bound.max);
        }
        FeatureVector::new(values)
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        sample_count: usize,
        rng: &mut R,
    ) -> Vec<TrainingExample> {
        (0..sample_count)
            .map(|_| {
                let features = Self::sample_features(rng);
                let yield_kg_per_ha = self.response.sample_yield(&features, rng);
                TrainingExample {
                    features,
                    yield_kg_per_ha,
                }
            })
            .collect()
    }

    pub fn generate_seeded(&self, config: CorpusConfig) -> Vec<TrainingExample> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        self.generate(config.samples, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn optimum() -> FeatureVector {
        FeatureVector::new([400.0, 150.0, 300.0, 6.5, 4000.0, 27.0, 10.0, 1.0, 1.0])
    }

    #[test]
    fn test_zero_nutrients_collapse_yield() {
        let response = YieldResponse::default();
        let v = optimum()
            .with(Feature::Nitrogen, 0.0)
            .with(Feature::Phosphorus, 0.0)
            .with(Feature::Potassium, 0.0);

        let terms = response.stress_terms(&v);
        assert_relative_eq!(terms.nutrient_product(), 0.0, epsilon = 1e-12);
        assert!(response.expected_yield(&v) < 1e-6);
    }

    #[test]
    fn test_optimum_approaches_organic_ceiling() {
        let response = YieldResponse::default();
        let v = optimum();
        let terms = response.stress_terms(&v);
        let ceiling = response.base_max_yield * terms.organic_bonus;

        assert_relative_eq!(terms.ph, 1.0);
        assert_relative_eq!(terms.temperature, 1.0);
        let expected = response.expected_yield(&v);
        assert!(expected <= ceiling);
        assert!(expected >= 0.9 * ceiling, "{expected} vs ceiling {ceiling}");
    }

    #[test]
    fn test_stress_terms_stay_in_unit_interval() {
        let response = YieldResponse::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let v = CorpusGenerator::sample_features(&mut rng);
            let t = response.stress_terms(&v);
            for s in [t.nitrogen, t.phosphorus, t.potassium, t.ph, t.temperature, t.water] {
                assert!((0.0..=1.0).contains(&s));
            }
            assert!(t.organic_bonus >= 1.0);
        }
    }

    #[test]
    fn test_dry_sandy_soil_has_no_water() {
        let response = YieldResponse::default();
        let v = optimum()
            .with(Feature::Rainfall, 500.0)
            .with(Feature::WaterAccess, 0.0)
            .with(Feature::SoilTexture, 0.0);
        // 500 * 0.4 * 0.5 = 100mm available, below the 300mm threshold.
        assert_eq!(response.stress_terms(&v).water, 0.0);
    }

    #[test]
    fn test_corpus_is_reproducible_and_in_bounds() {
        let generator = CorpusGenerator::default();
        let config = CorpusConfig::default().with_samples(200).with_seed(11);
        let a = generator.generate_seeded(config);
        let b = generator.generate_seeded(config);

        assert_eq!(a.len(), 200);
        assert_eq!(a, b);
        assert!(a.iter().all(|ex| ex.features.is_within_bounds()));
        assert!(a.iter().all(|ex| ex.yield_kg_per_ha >= 0.0));

        let c = generator.generate_seeded(config.with_seed(12));
        assert_ne!(a, c);
    }
}
