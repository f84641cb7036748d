//! Run bookkeeping for a single optimization call.

use agri_types::OptimizationResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    BudgetExhausted,
    DeadlineReached,
    Cancelled,
}

/// Outcome of one optimization call plus how it got there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub id: RunId,
    pub result: OptimizationResult,
    /// Score of the starting vector before any mutation.
    pub initial_score: f64,
    pub iterations_run: usize,
    pub starts_run: usize,
    /// Candidates that replaced the current search point.
    pub moves_accepted: usize,
    /// Global best score after each iteration; empty when tracing is off.
    pub best_score_trace: Vec<f64>,
    pub termination: TerminationReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SearchReport {
    pub fn improved_on_start(&self) -> bool {
        self.result.score > self.initial_score
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// True when `best_score_trace` never decreases.
    pub fn trace_is_monotonic(&self) -> bool {
        self.best_score_trace.windows(2).all(|w| w[1] >= w[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_types::{CostBreakdown, FeatureVector, PestStrategy};

    fn report(trace: Vec<f64>, score: f64) -> SearchReport {
        let now = Utc::now();
        SearchReport {
            id: Uuid::new_v4(),
            result: OptimizationResult {
                best: FeatureVector::floor(),
                predicted_yield: 0.0,
                cost: CostBreakdown::new(0.0, 0.0, 0.0, 0.0),
                pest_strategy: PestStrategy::IPM,
                score,
            },
            initial_score: -10.0,
            iterations_run: trace.len(),
            starts_run: 1,
            moves_accepted: 0,
            best_score_trace: trace,
            termination: TerminationReason::BudgetExhausted,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_trace_monotonicity_check() {
        assert!(report(vec![-5.0, -5.0, -1.0], -1.0).trace_is_monotonic());
        assert!(!report(vec![-5.0, -6.0], -6.0).trace_is_monotonic());
    }

    #[test]
    fn test_improvement_flag() {
        assert!(report(vec![], -1.0).improved_on_start());
        assert!(!report(vec![], -20.0).improved_on_start());
        assert_eq!(report(vec![], 0.0).duration_ms(), 0);
    }
}
