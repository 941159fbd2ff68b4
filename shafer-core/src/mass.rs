//! Basic probability assignments (mass functions).
//!
//! A [`MassFunction`] maps non-empty subsets of a frame ("focal elements") to
//! weights in [0, 1] that sum to 1. Every invariant is checked once, at
//! construction. Nothing is renormalized on the caller's behalf: a
//! distribution summing to 0.9 is rejected rather than silently rescaled.

use std::collections::btree_map;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::config::validate_tolerance;
use crate::error::{MassViolation, ShaferError, ShaferResult};
use crate::frame::{Frame, Subset};
use crate::math::within_tolerance;
use crate::thresholds::MASS_TOLERANCE;

/// One evidence source's basic probability assignment over a frame.
///
/// Immutable after construction. Combination produces new mass functions
/// and never touches its inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct MassFunction {
    frame: Frame,
    focal: BTreeMap<Subset, f64>,
}

impl MassFunction {
    /// Build a mass function from `(hypothesis names, weight)` pairs.
    ///
    /// ```
    /// use shafer_core::{Frame, MassFunction};
    ///
    /// let frame = Frame::build(["Alice", "Bob", "Charlie"]).unwrap();
    /// let m = MassFunction::build(
    ///     &frame,
    ///     [(vec!["Alice", "Charlie"], 0.6), (vec!["Bob"], 0.3), (vec!["Alice", "Bob"], 0.1)],
    /// )
    /// .unwrap();
    /// assert_eq!(m.len(), 3);
    /// ```
    pub fn build<I, H, S>(frame: &Frame, assignments: I) -> ShaferResult<Self>
    where
        I: IntoIterator<Item = (H, f64)>,
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build_with_tolerance(frame, assignments, MASS_TOLERANCE)
    }

    /// Like [`MassFunction::build`], with a caller-chosen tolerance for the
    /// "weights sum to 1" check.
    pub fn build_with_tolerance<I, H, S>(
        frame: &Frame,
        assignments: I,
        tolerance: f64,
    ) -> ShaferResult<Self>
    where
        I: IntoIterator<Item = (H, f64)>,
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate_tolerance(tolerance)?;

        let mut resolved = Vec::new();
        for (names, weight) in assignments {
            let subset = frame.subset(names).map_err(|e| match e {
                ShaferError::UnknownAtom(name) => MassViolation::NotInFrame(name).into(),
                other => other,
            })?;
            resolved.push((subset, weight));
        }
        Self::from_subsets_with_tolerance(frame, resolved, tolerance)
    }

    /// Build a mass function from already-resolved subsets.
    pub fn from_subsets<I>(frame: &Frame, assignments: I) -> ShaferResult<Self>
    where
        I: IntoIterator<Item = (Subset, f64)>,
    {
        Self::from_subsets_with_tolerance(frame, assignments, MASS_TOLERANCE)
    }

    /// Like [`MassFunction::from_subsets`], with a caller-chosen tolerance.
    pub fn from_subsets_with_tolerance<I>(
        frame: &Frame,
        assignments: I,
        tolerance: f64,
    ) -> ShaferResult<Self>
    where
        I: IntoIterator<Item = (Subset, f64)>,
    {
        validate_tolerance(tolerance)?;

        let mut focal = BTreeMap::new();
        let mut seen: HashSet<Subset> = HashSet::new();

        for (subset, weight) in assignments {
            if !frame.contains(&subset) {
                return Err(MassViolation::ForeignSubset.into());
            }
            if subset.is_empty() {
                return Err(MassViolation::EmptyFocalElement.into());
            }
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(MassViolation::WeightOutOfRange {
                    focal: frame.describe(&subset),
                    weight,
                }
                .into());
            }
            if !seen.insert(subset.clone()) {
                return Err(MassViolation::DuplicateFocalElement(frame.describe(&subset)).into());
            }
            // Zero is a legal weight, but a zero-mass set is not focal.
            if weight > 0.0 {
                focal.insert(subset, weight);
            }
        }

        if focal.is_empty() {
            return Err(MassViolation::NoFocalElements.into());
        }

        let total: f64 = focal.values().sum();
        if !within_tolerance(total, 1.0, tolerance) {
            return Err(MassViolation::DoesNotSumToOne { total, tolerance }.into());
        }

        Ok(Self {
            frame: frame.clone(),
            focal,
        })
    }

    /// Total ignorance: all mass on Θ. Neutral element of Dempster's rule.
    pub fn vacuous(frame: &Frame) -> Self {
        let mut focal = BTreeMap::new();
        focal.insert(frame.universe(), 1.0);
        Self {
            frame: frame.clone(),
            focal,
        }
    }

    /// Wrap buckets the engine has already normalized.
    pub(crate) fn from_normalized(frame: Frame, focal: BTreeMap<Subset, f64>) -> Self {
        debug_assert!(!focal.is_empty());
        debug_assert!(within_tolerance(focal.values().sum::<f64>(), 1.0, 1e-6));
        Self { frame, focal }
    }

    /// The frame this mass function was built over.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Focal elements and their weights in canonical subset order.
    ///
    /// The iterator is lazy and `Clone`; call again (or clone it) to restart.
    pub fn focal_elements(&self) -> FocalElements<'_> {
        FocalElements {
            inner: self.focal.iter(),
        }
    }

    /// m(A), or 0 when `subset` is not a focal element.
    pub fn weight_of(&self, subset: &Subset) -> f64 {
        self.focal.get(subset).copied().unwrap_or(0.0)
    }

    /// Number of focal elements.
    pub fn len(&self) -> usize {
        self.focal.len()
    }

    /// Always false for a validated mass function.
    pub fn is_empty(&self) -> bool {
        self.focal.is_empty()
    }

    /// Σ m(A) over all focal elements.
    pub fn total_mass(&self) -> f64 {
        self.focal.values().sum()
    }

    /// Shafer discounting for a source trusted with `reliability`.
    ///
    /// Every weight is scaled by `reliability` and the remaining
    /// `1 - reliability` is moved to Θ. A reliability of 0 yields the vacuous
    /// mass function; 1 leaves the evidence unchanged.
    pub fn discount(&self, reliability: f64) -> ShaferResult<Self> {
        if !reliability.is_finite() || !(0.0..=1.0).contains(&reliability) {
            return Err(MassViolation::ReliabilityOutOfRange(reliability).into());
        }

        let mut focal: BTreeMap<Subset, f64> = self
            .focal
            .iter()
            .map(|(s, w)| (s.clone(), w * reliability))
            .filter(|(_, w)| *w > 0.0)
            .collect();

        let remainder = 1.0 - reliability;
        if remainder > 0.0 {
            *focal.entry(self.frame.universe()).or_insert(0.0) += remainder;
        }

        Ok(Self::from_normalized(self.frame.clone(), focal))
    }
}

impl fmt::Display for MassFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .focal_elements()
            .map(|(s, w)| format!("{}: {:.3}", self.frame.describe(s), w))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Serialized as a list of `{ "hypotheses": [...], "mass": w }` entries.
impl Serialize for MassFunction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct FocalEntry<'a> {
            hypotheses: Vec<&'a str>,
            mass: f64,
        }

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (subset, mass) in self.focal_elements() {
            seq.serialize_element(&FocalEntry {
                hypotheses: self.frame.labels(subset),
                mass,
            })?;
        }
        seq.end()
    }
}

/// Iterator over `(focal element, weight)` pairs of a [`MassFunction`].
#[derive(Clone)]
pub struct FocalElements<'a> {
    inner: btree_map::Iter<'a, Subset, f64>,
}

impl<'a> Iterator for FocalElements<'a> {
    type Item = (&'a Subset, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(s, &w)| (s, w))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for FocalElements<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
