//! Retirement-planning projection engine
//!
//! This crate provides the stochastic projection and optimization core of a
//! retirement planner:
//! - Correlated monthly return sampling across asset classes (Cholesky,
//!   with a documented independent-draw fallback)
//! - Month-by-month accumulation and decumulation simulators with
//!   per-account cost-basis tracking and French withdrawal taxation
//!   (PEA, PER, assurance-vie, livret, CTO, crypto)
//! - An iterative gross-from-net withdrawal solver
//! - A batched Monte Carlo driver with confidence-interval stopping and
//!   percentile aggregation
//! - A bisection optimizer recommending the minimum sufficient savings
//!
//! The engine is stateless and embarrassingly parallel at the path level;
//! with the default `parallel` feature, batches run as data-parallel maps
//! over independent paths. Given the same seed, results are bit-identical.
//!
//! # Entry points
//!
//! ```ignore
//! use horizon_core::{simulate_capitalization, monte_carlo_capitalization,
//!     monte_carlo_retirement, optimize_savings};
//!
//! let preview = simulate_capitalization(&capitalization_input)?;
//! let accumulation = monte_carlo_capitalization(&mc_input, seed)?;
//! let retirement = monte_carlo_retirement(&retirement_input, seed)?;
//! let recommendation = optimize_savings(&optimization_input, seed)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod capitalization;
mod driver;
pub mod error;
pub mod optimization;
pub mod progress;
pub mod retirement;
pub mod returns;
pub mod simulation;
pub mod stats;
pub mod taxes;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use capitalization::simulate_capitalization;
pub use error::{EngineError, Result};
pub use optimization::{
    OptimizationStep, RecommendedSavingsResult, optimize_savings, optimize_savings_with_progress,
};
pub use progress::{NullProgress, ProgressReporter, ProgressSink, ProgressUpdate, RunControl};
pub use retirement::{monte_carlo_retirement, monte_carlo_retirement_with_progress};
pub use simulation::{monte_carlo_capitalization, monte_carlo_capitalization_with_progress};
