//! Engine configuration.
//!
//! Every field has a default backed by `thresholds.rs`, so an empty
//! `[engine]` table (or no config at all) yields the standard engine.

use serde::{Deserialize, Serialize};

use crate::error::{ShaferError, ShaferResult};
use crate::thresholds::{MASS_TOLERANCE, MAX_TOLERANCE, PARALLEL_PAIR_THRESHOLD};

/// Numeric and scheduling knobs of the combination engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tolerance for the "conflict reaches 1" check.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Focal-element pairs per step at which the intersection grid is
    /// spread over the rayon pool. `0` disables parallelism.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_tolerance() -> f64 {
    MASS_TOLERANCE
}

fn default_parallel_threshold() -> usize {
    PARALLEL_PAIR_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl EngineConfig {
    /// Reject tolerances that are non-positive or too loose to be meaningful.
    pub fn validate(&self) -> ShaferResult<()> {
        validate_tolerance(self.tolerance)
    }

    /// Whether a step with `pairs` focal-element pairs should run in parallel.
    pub fn parallel_for(&self, pairs: usize) -> bool {
        self.parallel_threshold > 0 && pairs >= self.parallel_threshold
    }
}

/// Accept only tolerances in `(0, MAX_TOLERANCE]`.
pub fn validate_tolerance(tolerance: f64) -> ShaferResult<()> {
    if !tolerance.is_finite() || tolerance <= 0.0 || tolerance > MAX_TOLERANCE {
        return Err(ShaferError::InvalidConfig(format!(
            "tolerance must be in (0, {:e}], got {}",
            MAX_TOLERANCE, tolerance
        )));
    }
    Ok(())
}
