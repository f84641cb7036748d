use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cost multiplier and expected pest-risk reduction for a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PestProfile {
    pub cost_factor: f64,
    pub risk_reduction: f64,
}

/// Pest-control intensity. Cost factors are strictly increasing in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PestStrategy {
    #[serde(alias = "Organic (Nabati)")]
    Organic,
    #[serde(alias = "IPM (Terpadu)")]
    IPM,
    #[serde(alias = "Konvensional")]
    Conventional,
    #[serde(alias = "Agresif (Intensif)")]
    Aggressive,
}

const PEST_PROFILES: [PestProfile; 4] = [
    PestProfile {
        cost_factor: 1.0,
        risk_reduction: 0.30,
    },
    PestProfile {
        cost_factor: 1.5,
        risk_reduction: 0.60,
    },
    PestProfile {
        cost_factor: 2.5,
        risk_reduction: 0.80,
    },
    PestProfile {
        cost_factor: 4.0,
        risk_reduction: 0.95,
    },
];

impl PestStrategy {
    pub const ALL: [PestStrategy; 4] = [
        PestStrategy::Organic,
        PestStrategy::IPM,
        PestStrategy::Conventional,
        PestStrategy::Aggressive,
    ];

    pub fn profile(self) -> PestProfile {
        PEST_PROFILES[self as usize]
    }

    pub fn cost_factor(self) -> f64 {
        self.profile().cost_factor
    }

    pub fn risk_reduction(self) -> f64 {
        self.profile().risk_reduction
    }

    /// Parse either the canonical name or a field-survey label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Organic" | "Organic (Nabati)" => Some(PestStrategy::Organic),
            "IPM" | "IPM (Terpadu)" => Some(PestStrategy::IPM),
            "Conventional" | "Konvensional" => Some(PestStrategy::Conventional),
            "Aggressive" | "Agresif (Intensif)" => Some(PestStrategy::Aggressive),
            _ => None,
        }
    }
}

impl Default for PestStrategy {
    fn default() -> Self {
        PestStrategy::IPM
    }
}

impl FromStr for PestStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown pest strategy: {s}"))
    }
}

impl fmt::Display for PestStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PestStrategy::Organic => "Organic",
            PestStrategy::IPM => "IPM",
            PestStrategy::Conventional => "Conventional",
            PestStrategy::Aggressive => "Aggressive",
        };
        write!(f, "{}", s)
    }
}
