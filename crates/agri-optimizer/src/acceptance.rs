//! Rules for moving the search point to a candidate that does not improve it.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the search treats a candidate scoring no better than the current
/// point. The best-so-far point only changes on strict improvement under
/// every policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AcceptancePolicy {
    /// Strict hill climbing: non-improving candidates, ties included, are
    /// discarded. Can stall on plateaus.
    Greedy,
    /// Metropolis acceptance with geometric cooling:
    /// `T(i) = initial_temperature * cooling_rate^i`.
    Annealing {
        initial_temperature: f64,
        cooling_rate: f64,
    },
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self::Greedy
    }
}

impl AcceptancePolicy {
    pub fn temperature(&self, iteration: usize) -> f64 {
        match self {
            AcceptancePolicy::Greedy => 0.0,
            AcceptancePolicy::Annealing {
                initial_temperature,
                cooling_rate,
            } => initial_temperature * cooling_rate.powi(iteration.min(i32::MAX as usize) as i32),
        }
    }

    /// Decide whether to move to a candidate with `delta = candidate - current <= 0`.
    /// Greedy never consumes randomness.
    pub fn accept_worse<R: Rng + ?Sized>(&self, delta: f64, iteration: usize, rng: &mut R) -> bool {
        match self {
            AcceptancePolicy::Greedy => false,
            AcceptancePolicy::Annealing { .. } => {
                let t = self.temperature(iteration);
                let draw: f64 = rng.gen();
                if t <= 0.0 || !delta.is_finite() {
                    return false;
                }
                draw < (delta / t).exp()
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            AcceptancePolicy::Greedy => Ok(()),
            AcceptancePolicy::Annealing {
                initial_temperature,
                cooling_rate,
            } => {
                if !(initial_temperature.is_finite() && *initial_temperature > 0.0) {
                    return Err(format!(
                        "initial_temperature must be positive, got {initial_temperature}"
                    ));
                }
                if !(*cooling_rate > 0.0 && *cooling_rate <= 1.0) {
                    return Err(format!("cooling_rate must be in (0, 1], got {cooling_rate}"));
                }
                Ok(())
            }
        }
    }
}
