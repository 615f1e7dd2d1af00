//! Savings-plan optimization
//!
//! Finds the smallest uniform scale applied to every account's monthly
//! contribution such that the household's median end-of-life capital meets
//! the target without the median path depleting early. The search composes
//! the Monte Carlo drivers: every probe runs a full accumulation and, by
//! default, a three-scenario decumulation cluster.

mod bisection;
mod evaluator;
mod result;

pub use bisection::{optimize_savings, optimize_savings_with_progress};
pub use result::{OptimizationStep, RecommendedSavingsResult};
