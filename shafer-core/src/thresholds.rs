//! Centralized numeric tolerances for evidence combination.
//!
//! Changing a value here affects BOTH mass-function validation (in `mass.rs`)
//! and the total-conflict check in the combination engine (in `combination.rs`),
//! unless a caller overrides it through `EngineConfig`.

/// Tolerance for "weights sum to 1" and "conflict reaches 1" comparisons.
pub const MASS_TOLERANCE: f64 = 1e-9;

/// Upper bound accepted for any caller-chosen tolerance, in `EngineConfig` or
/// `MassFunction::build_with_tolerance`. Anything looser would let visibly
/// unnormalized evidence through validation.
pub const MAX_TOLERANCE: f64 = 1e-3;

/// Number of focal-element pairs in a single pairwise step at which the
/// engine switches to the parallel intersection grid.
pub const PARALLEL_PAIR_THRESHOLD: usize = 4096;
