//! Engine error types.
//!
//! Every failure mode has a named variant. Validation failures carry the
//! specific invariant that was violated so callers can surface it verbatim.

use thiserror::Error;

/// Why a frame of discernment was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameViolation {
    #[error("the universe of hypotheses is empty")]
    Empty,

    #[error("hypothesis names must not be blank")]
    BlankAtom,

    #[error("hypothesis '{0}' appears more than once")]
    DuplicateAtom(String),
}

/// Which mass-function invariant an assignment broke.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MassViolation {
    #[error("focal elements must be non-empty hypothesis sets")]
    EmptyFocalElement,

    #[error("hypothesis '{0}' is not part of the frame")]
    NotInFrame(String),

    #[error("focal element belongs to a different frame")]
    ForeignSubset,

    #[error("weight {weight} for {focal} is outside [0, 1]")]
    WeightOutOfRange { focal: String, weight: f64 },

    #[error("focal element {0} is assigned more than once")]
    DuplicateFocalElement(String),

    #[error("no focal element carries mass")]
    NoFocalElements,

    #[error("weights sum to {total}, expected 1 (tolerance {tolerance:e})")]
    DoesNotSumToOne { total: f64, tolerance: f64 },

    #[error("reliability {0} is outside [0, 1]")]
    ReliabilityOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaferError {
    #[error("Invalid frame of discernment: {0}")]
    InvalidFrame(FrameViolation),

    #[error("Invalid mass assignment: {0}")]
    InvalidMassAssignment(MassViolation),

    #[error("Frame mismatch: expected frame {expected:#018x}, found {found:#018x}")]
    FrameMismatch { expected: u64, found: u64 },

    #[error("Unknown hypothesis: {0}")]
    UnknownAtom(String),

    #[error(
        "Total conflict at combination step {step}: evidence sources are mutually exclusive (conflict: {conflict:.6})"
    )]
    TotalConflict { step: usize, conflict: f64 },

    #[error("Combination needs at least two mass functions, got {0}")]
    InsufficientSources(usize),

    #[error("Combination cancelled after {completed_steps} pairwise steps")]
    Cancelled { completed_steps: usize },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl From<FrameViolation> for ShaferError {
    fn from(v: FrameViolation) -> Self {
        ShaferError::InvalidFrame(v)
    }
}

impl From<MassViolation> for ShaferError {
    fn from(v: MassViolation) -> Self {
        ShaferError::InvalidMassAssignment(v)
    }
}

/// Result type alias for engine operations.
pub type ShaferResult<T> = Result<T, ShaferError>;
