//! # agri-optimizer
//!
//! Economic cost model and constrained local search for AgriOpt.
//!
//! Provides the cost schedule and profit accounting, the yield-target and
//! profit objectives, greedy and annealing acceptance policies, and the
//! local-search optimizer with per-run reports, deadlines and cooperative
//! cancellation.

mod acceptance;
mod cancel;
mod config;
mod cost;
mod objective;
mod report;
mod search;

pub use acceptance::AcceptancePolicy;
pub use cancel::CancellationToken;
pub use config::{OptimizerConfig, DEFAULT_START, DEFAULT_STEP_SIZES};
pub use cost::{CostSchedule, EconomicCostModel};
pub use objective::Objective;
pub use report::{RunId, SearchReport, TerminationReason};
pub use search::LocalSearchOptimizer;
