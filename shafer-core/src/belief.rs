//! Belief and plausibility queries over a mass function.
//!
//! - `Bel(Q) = Σ m(A)` over focal elements `A ⊆ Q`: confidence guaranteed by
//!   the evidence.
//! - `Pl(Q) = Σ m(A)` over focal elements with `A ∩ Q ≠ ∅`: confidence not
//!   ruled out by the evidence.
//!
//! Both are pure and work on raw or fused evidence alike. A query subset
//! from another frame fails with [`ShaferError::FrameMismatch`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{ShaferError, ShaferResult};
use crate::frame::Subset;
use crate::mass::MassFunction;
use crate::math::clamp_unit;

/// `[Bel(Q), Pl(Q)]` for one query subset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BeliefInterval {
    pub belief: f64,
    pub plausibility: f64,
}

impl BeliefInterval {
    /// Width of the interval, `Pl − Bel`: how much the evidence leaves open.
    pub fn uncertainty(&self) -> f64 {
        self.plausibility - self.belief
    }

    /// Whether `p` lies inside the interval.
    pub fn contains(&self, p: f64) -> bool {
        self.belief <= p && p <= self.plausibility
    }
}

/// Decision scores for one atomic hypothesis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HypothesisRank {
    pub hypothesis: String,
    pub belief: f64,
    pub plausibility: f64,
    /// Pignistic probability `BetP(x) = Σ_{A ∋ x} m(A) / |A|`.
    pub pignistic: f64,
}

/// Minimum ("guaranteed") confidence in `query`.
pub fn belief(mass: &MassFunction, query: &Subset) -> ShaferResult<f64> {
    ensure_query(mass, query)?;
    let total = mass
        .focal_elements()
        .filter(|(a, _)| a.is_subset_of(query))
        .map(|(_, w)| w)
        .sum();
    Ok(clamp_unit(total))
}

/// Maximum confidence in `query` not ruled out by the evidence.
pub fn plausibility(mass: &MassFunction, query: &Subset) -> ShaferResult<f64> {
    ensure_query(mass, query)?;
    let total = mass
        .focal_elements()
        .filter(|(a, _)| a.intersects(query))
        .map(|(_, w)| w)
        .sum();
    Ok(clamp_unit(total))
}

/// Belief and plausibility in one pass over the focal elements.
pub fn interval(mass: &MassFunction, query: &Subset) -> ShaferResult<BeliefInterval> {
    ensure_query(mass, query)?;
    let (mut bel, mut pl) = (0.0, 0.0);
    for (a, w) in mass.focal_elements() {
        if a.intersects(query) {
            pl += w;
            if a.is_subset_of(query) {
                bel += w;
            }
        }
    }
    Ok(BeliefInterval {
        belief: clamp_unit(bel),
        plausibility: clamp_unit(pl),
    })
}

/// Score every atom of the frame and rank by pignistic probability.
///
/// Ties keep canonical atom order. A NaN score never ranks ahead of a
/// real one.
pub fn rank_hypotheses(mass: &MassFunction) -> Vec<HypothesisRank> {
    let frame = mass.frame();
    let mut ranks: Vec<HypothesisRank> = frame
        .atoms()
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            let (mut bel, mut pl, mut betp) = (0.0, 0.0, 0.0);
            for (a, w) in mass.focal_elements() {
                if a.contains_atom(i) {
                    pl += w;
                    betp += w / a.len() as f64;
                    if a.len() == 1 {
                        bel += w;
                    }
                }
            }
            HypothesisRank {
                hypothesis: atom.clone(),
                belief: clamp_unit(bel),
                plausibility: clamp_unit(pl),
                pignistic: clamp_unit(betp),
            }
        })
        .collect();

    // Stable sort: explicit total ordering with NaN pushed to the end.
    ranks.sort_by(|a, b| match (a.pignistic.is_nan(), b.pignistic.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.pignistic.partial_cmp(&a.pignistic).unwrap_or(Ordering::Equal),
    });
    ranks
}

fn ensure_query(mass: &MassFunction, query: &Subset) -> ShaferResult<()> {
    let frame = mass.frame();
    if frame.contains(query) {
        Ok(())
    } else {
        Err(ShaferError::FrameMismatch {
            expected: frame.fingerprint(),
            found: query.frame_fingerprint(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
