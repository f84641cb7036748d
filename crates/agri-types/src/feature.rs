use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of dimensions in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 9;

/// Closed [min, max] interval for one feature dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        // NaN would survive f64::clamp, so it is pinned to the floor.
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// The nine agronomic input and environment dimensions, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    SoilPh,
    Rainfall,
    Temperature,
    OrganicMatter,
    SoilTexture,
    WaterAccess,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::SoilPh,
        Feature::Rainfall,
        Feature::Temperature,
        Feature::OrganicMatter,
        Feature::SoilTexture,
        Feature::WaterAccess,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Global box bound, shared by the corpus generator and the optimizer.
    pub fn bound(self) -> Bound {
        match self {
            Feature::Nitrogen => Bound::new(0.0, 400.0),
            Feature::Phosphorus => Bound::new(0.0, 150.0),
            Feature::Potassium => Bound::new(0.0, 300.0),
            Feature::SoilPh => Bound::new(4.0, 8.5),
            Feature::Rainfall => Bound::new(500.0, 4000.0),
            Feature::Temperature => Bound::new(15.0, 35.0),
            Feature::OrganicMatter => Bound::new(0.0, 20.0),
            Feature::SoilTexture => Bound::new(0.0, 1.0),
            Feature::WaterAccess => Bound::new(0.0, 1.0),
        }
    }

    /// Unit of measure used in logs and reports.
    pub fn unit(self) -> &'static str {
        match self {
            Feature::Nitrogen | Feature::Phosphorus | Feature::Potassium => "kg/ha",
            Feature::SoilPh => "pH",
            Feature::Rainfall => "mm",
            Feature::Temperature => "C",
            Feature::OrganicMatter => "ton/ha",
            Feature::SoilTexture | Feature::WaterAccess => "index",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feature::Nitrogen => "nitrogen",
            Feature::Phosphorus => "phosphorus",
            Feature::Potassium => "potassium",
            Feature::SoilPh => "soil_ph",
            Feature::Rainfall => "rainfall",
            Feature::Temperature => "temperature",
            Feature::OrganicMatter => "organic_matter",
            Feature::SoilTexture => "soil_texture",
            Feature::WaterAccess => "water_access",
        };
        write!(f, "{}", s)
    }
}

/// A point in the agronomic input space.
///
/// Every constructor and mutator projects onto the global box bounds, so a
/// `FeatureVector` is always in-bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FeatureFields", into = "FeatureFields")]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build from raw values, clamping each into its bound.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        let mut vector = Self { values };
        vector.clamp_to_bounds();
        vector
    }

    /// Lower corner of the box.
    pub fn floor() -> Self {
        Self::new(Feature::ALL.map(|f| f.bound().min))
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Set one dimension, clamping into its bound. Returns the stored value.
    pub fn set(&mut self, feature: Feature, value: f64) -> f64 {
        let clamped = feature.bound().clamp(value);
        self.values[feature.index()] = clamped;
        clamped
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn clamp_to_bounds(&mut self) {
        for feature in Feature::ALL {
            let i = feature.index();
            self.values[i] = feature.bound().clamp(self.values[i]);
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        Feature::ALL
            .iter()
            .all(|f| f.bound().contains(self.values[f.index()]))
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn nitrogen(&self) -> f64 {
        self.get(Feature::Nitrogen)
    }

    pub fn phosphorus(&self) -> f64 {
        self.get(Feature::Phosphorus)
    }

    pub fn potassium(&self) -> f64 {
        self.get(Feature::Potassium)
    }

    pub fn organic_matter(&self) -> f64 {
        self.get(Feature::OrganicMatter)
    }
}

/// Named-field serde representation of [`FeatureVector`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FeatureFields {
    n_kg: f64,
    p_kg: f64,
    k_kg: f64,
    soil_ph: f64,
    rainfall_mm: f64,
    temperature_c: f64,
    organic_ton: f64,
    soil_texture: f64,
    water_access: f64,
}

impl From<FeatureFields> for FeatureVector {
    fn from(f: FeatureFields) -> Self {
        FeatureVector::new([
            f.n_kg,
            f.p_kg,
            f.k_kg,
            f.soil_ph,
            f.rainfall_mm,
            f.temperature_c,
            f.organic_ton,
            f.soil_texture,
            f.water_access,
        ])
    }
}

impl From<FeatureVector> for FeatureFields {
    fn from(v: FeatureVector) -> Self {
        Self {
            n_kg: v.get(Feature::Nitrogen),
            p_kg: v.get(Feature::Phosphorus),
            k_kg: v.get(Feature::Potassium),
            soil_ph: v.get(Feature::SoilPh),
            rainfall_mm: v.get(Feature::Rainfall),
            temperature_c: v.get(Feature::Temperature),
            organic_ton: v.get(Feature::OrganicMatter),
            soil_texture: v.get(Feature::SoilTexture),
            water_access: v.get(Feature::WaterAccess),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_matches_index() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(Feature::from_index(i), Some(*feature));
        }
        assert_eq!(Feature::from_index(FEATURE_COUNT), None);
    }

    #[test]
    fn test_new_clamps_out_of_range_values() {
        let v = FeatureVector::new([-10.0, 500.0, 120.0, 9.9, 100.0, 27.0, f64::NAN, 2.0, -0.5]);
        assert!(v.is_within_bounds());
        assert_eq!(v.nitrogen(), 0.0);
        assert_eq!(v.phosphorus(), 150.0);
        assert_eq!(v.get(Feature::SoilPh), 8.5);
        assert_eq!(v.get(Feature::Rainfall), 500.0);
        assert_eq!(v.organic_matter(), 0.0);
        assert_eq!(v.get(Feature::SoilTexture), 1.0);
        assert_eq!(v.get(Feature::WaterAccess), 0.0);
    }

    #[test]
    fn test_set_returns_clamped_value() {
        let mut v = FeatureVector::floor();
        assert_eq!(v.set(Feature::Temperature, 40.0), 35.0);
        assert_eq!(v.set(Feature::Temperature, 27.5), 27.5);
        assert_eq!(v.get(Feature::Temperature), 27.5);
    }

    #[test]
    fn test_serde_uses_named_fields_and_clamps() {
        let v = FeatureVector::floor().with(Feature::Nitrogen, 210.0);
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["n_kg"], 210.0);
        assert_eq!(json["rainfall_mm"], 500.0);

        let raw = serde_json::json!({
            "n_kg": 999.0, "p_kg": 60.0, "k_kg": 120.0, "soil_ph": 6.5,
            "rainfall_mm": 2000.0, "temperature_c": 27.0, "organic_ton": 2.0,
            "soil_texture": 0.7, "water_access": 0.8
        });
        let parsed: FeatureVector = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.nitrogen(), 400.0);
    }
}
