//! Scenario tests for the projection engine
//!
//! Organized by phase:
//! - `capitalization` - deterministic preview and closed-form checks
//! - `montecarlo` - accumulation driver: confidence, determinism, bands
//! - `retirement` - decumulation paths, solver behavior at the boundaries
//! - `optimization` - bisection search end-to-end

mod optimization;
mod retirement;
