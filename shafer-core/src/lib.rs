//! Dempster-Shafer evidence combination.
//!
//! Independent sources declare [`MassFunction`]s over a shared [`Frame`]; the
//! [`CombinationEngine`] fuses any ordered collection of two or more of them
//! with Dempster's rule; the [`belief`] module derives interval-valued
//! confidence from raw or fused evidence.
//!
//! ```
//! use shafer_core::{belief, combine, Frame, MassFunction};
//!
//! let frame = Frame::build(["Alice", "Bob", "Charlie"]).unwrap();
//! let a = MassFunction::build(&frame, [(vec!["Alice", "Charlie"], 0.6), (vec!["Bob"], 0.4)]).unwrap();
//! let b = MassFunction::build(&frame, [(vec!["Alice", "Bob"], 0.7), (vec!["Charlie"], 0.3)]).unwrap();
//!
//! let fused = combine(&frame, &[a, b]).unwrap();
//! let alice = frame.singleton("Alice").unwrap();
//! let iv = belief::interval(fused.mass(), &alice).unwrap();
//! assert!(iv.belief <= iv.plausibility);
//! ```

pub mod belief;
pub mod cancel;
pub mod combination;
pub mod config;
pub mod error;
pub mod frame;
pub mod mass;
pub mod math;
pub mod thresholds;

pub use belief::{belief, interval, plausibility, rank_hypotheses, BeliefInterval, HypothesisRank};
pub use cancel::CancellationFlag;
pub use combination::{combine, CombinationEngine, CombinedMassFunction};
pub use config::EngineConfig;
pub use error::{FrameViolation, MassViolation, ShaferError, ShaferResult};
pub use frame::{Frame, Subset};
pub use mass::{FocalElements, MassFunction};
