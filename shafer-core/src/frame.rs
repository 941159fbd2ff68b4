//! Frame of discernment and hypothesis subsets.
//!
//! A [`Frame`] is the closed universe of mutually exclusive atomic hypotheses
//! shared by every evidence source in a combination session. Atoms are kept
//! in canonical (sorted) order, so `{Bob, Alice}` and `{Alice, Bob}` build the
//! same frame with the same fingerprint.
//!
//! A [`Subset`] is an ordered bitset over a frame's atoms. Bit `i` of the
//! bitset stands for the `i`-th atom in canonical order. Every subset is
//! tagged with the fingerprint of the frame it was built from, which is how
//! queries and combinations detect evidence from a foreign frame.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{FrameViolation, ShaferError, ShaferResult};
use crate::math::fingerprint_atoms;

const WORD_BITS: usize = 64;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// The finite universe Θ of atomic hypotheses.
///
/// Cheap to clone: the atom table is shared behind an `Arc`.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

struct FrameInner {
    atoms: Vec<String>,
    index: HashMap<String, usize>,
    fingerprint: u64,
}

impl Frame {
    /// Build a frame from a collection of hypothesis names.
    ///
    /// Fails with [`ShaferError::InvalidFrame`] when the collection is empty,
    /// when a name is blank, or when a name appears twice. Names are trimmed
    /// first, so `" Alice"` and `"Alice"` are the same atom.
    pub fn build<I, S>(atoms: I) -> ShaferResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Lookups trim their names, so stored atoms are trimmed too.
        let mut atoms: Vec<String> = atoms
            .into_iter()
            .map(|a| Into::<String>::into(a).trim().to_string())
            .collect();
        if atoms.is_empty() {
            return Err(FrameViolation::Empty.into());
        }
        if atoms.iter().any(String::is_empty) {
            return Err(FrameViolation::BlankAtom.into());
        }

        atoms.sort();
        if let Some(pair) = atoms.windows(2).find(|w| w[0] == w[1]) {
            return Err(FrameViolation::DuplicateAtom(pair[0].clone()).into());
        }

        let index = atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();
        let fingerprint = fingerprint_atoms(&atoms);

        Ok(Self {
            inner: Arc::new(FrameInner {
                atoms,
                index,
                fingerprint,
            }),
        })
    }

    /// Atom names in canonical order.
    pub fn atoms(&self) -> &[String] {
        &self.inner.atoms
    }

    /// Number of atoms in the frame.
    pub fn len(&self) -> usize {
        self.inner.atoms.len()
    }

    /// Frames are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.inner.atoms.is_empty()
    }

    /// Deterministic identity of this frame, derived from its atoms.
    pub fn fingerprint(&self) -> u64 {
        self.inner.fingerprint
    }

    /// Canonical position of an atom, if it belongs to the frame.
    pub fn index_of(&self, atom: &str) -> Option<usize> {
        self.inner.index.get(atom).copied()
    }

    /// Check `subset ⊆ Θ`: the subset was built against this frame and
    /// sets no bit beyond the frame's width.
    pub fn contains(&self, subset: &Subset) -> bool {
        if subset.frame != self.fingerprint() || subset.bits.len() != self.word_count() {
            return false;
        }
        subset.indices().all(|i| i < self.len())
    }

    /// Resolve hypothesis names into a subset of this frame.
    ///
    /// Fails with [`ShaferError::UnknownAtom`] on the first name that is not
    /// part of the frame. Repeated names are harmless.
    pub fn subset<I, S>(&self, names: I) -> ShaferResult<Subset>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subset = self.empty_subset();
        for name in names {
            let name = name.as_ref().trim();
            let idx = self
                .index_of(name)
                .ok_or_else(|| ShaferError::UnknownAtom(name.to_string()))?;
            subset.insert(idx);
        }
        Ok(subset)
    }

    /// The subset holding exactly one atom.
    pub fn singleton(&self, atom: &str) -> ShaferResult<Subset> {
        self.subset([atom])
    }

    /// Θ itself.
    pub fn universe(&self) -> Subset {
        let mut subset = self.empty_subset();
        for i in 0..self.len() {
            subset.insert(i);
        }
        subset
    }

    /// Atom names of a subset, in canonical order.
    pub fn labels(&self, subset: &Subset) -> Vec<&str> {
        subset
            .indices()
            .filter_map(|i| self.inner.atoms.get(i).map(String::as_str))
            .collect()
    }

    /// Human-readable form of a subset: `{Alice, Charlie}`.
    pub fn describe(&self, subset: &Subset) -> String {
        format!("{{{}}}", self.labels(subset).join(", "))
    }

    /// Fail with [`ShaferError::FrameMismatch`] unless `other` is this frame.
    pub fn ensure_same(&self, other: &Frame) -> ShaferResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(ShaferError::FrameMismatch {
                expected: self.fingerprint(),
                found: other.fingerprint(),
            })
        }
    }

    /// Fail with [`ShaferError::FrameMismatch`] unless `subset ⊆ Θ`.
    pub fn ensure_contains(&self, subset: &Subset) -> ShaferResult<()> {
        if self.contains(subset) {
            Ok(())
        } else {
            Err(ShaferError::FrameMismatch {
                expected: self.fingerprint(),
                found: subset.frame,
            })
        }
    }

    pub(crate) fn empty_subset(&self) -> Subset {
        Subset {
            frame: self.fingerprint(),
            bits: vec![0; self.word_count()].into_boxed_slice(),
        }
    }

    fn word_count(&self) -> usize {
        (self.len() + WORD_BITS - 1) / WORD_BITS
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.fingerprint() == other.fingerprint() && self.atoms() == other.atoms())
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("atoms", &self.inner.atoms)
            .field("fingerprint", &format_args!("{:#018x}", self.fingerprint()))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.inner.atoms.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Subset
// ---------------------------------------------------------------------------

/// A set of hypotheses from one frame, stored as an ordered bitset.
///
/// Equality, ordering and hashing are word-wise, so subsets work directly as
/// `BTreeMap` / `HashMap` keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subset {
    frame: u64,
    bits: Box<[u64]>,
}

impl Subset {
    /// Fingerprint of the frame this subset was built against.
    pub fn frame_fingerprint(&self) -> u64 {
        self.frame
    }

    /// True for ∅.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Cardinality |A|.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the atom at canonical position `index` is in the subset.
    pub fn contains_atom(&self, index: usize) -> bool {
        self.bits
            .get(index / WORD_BITS)
            .map(|w| w & (1u64 << (index % WORD_BITS)) != 0)
            .unwrap_or(false)
    }

    /// `A ∩ B`. Both operands must come from the same frame.
    pub fn intersection(&self, other: &Subset) -> Subset {
        debug_assert_eq!(self.frame, other.frame, "intersecting subsets of different frames");
        Subset {
            frame: self.frame,
            bits: self
                .bits
                .iter()
                .zip(other.bits.iter())
                .map(|(a, b)| a & b)
                .collect(),
        }
    }

    /// `A ∩ B ≠ ∅`, without allocating the intersection.
    pub fn intersects(&self, other: &Subset) -> bool {
        self.frame == other.frame
            && self
                .bits
                .iter()
                .zip(other.bits.iter())
                .any(|(a, b)| a & b != 0)
    }

    /// `A ⊆ B`.
    pub fn is_subset_of(&self, other: &Subset) -> bool {
        self.frame == other.frame
            && self
                .bits
                .iter()
                .zip(other.bits.iter())
                .all(|(a, b)| a & !b == 0)
    }

    /// Canonical positions of the atoms in this subset, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(w, &word)| {
            (0..WORD_BITS)
                .filter(move |b| word & (1u64 << b) != 0)
                .map(move |b| w * WORD_BITS + b)
        })
    }

    fn insert(&mut self, index: usize) {
        self.bits[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
