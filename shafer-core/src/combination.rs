//! Dempster's rule of combination, generalized to N sources.
//!
//! # Algorithm
//!
//! Sources are fused by a left fold: `result ← combine2(result, next)`.
//! Each pairwise step:
//!
//! 1. For every focal pair (A, B) of the left and right operands, computes the
//!    joint mass `m1(A) · m2(B)` and the intersection `A ∩ B`.
//! 2. Non-empty intersections accumulate into a bucket keyed by `A ∩ B`.
//! 3. Empty intersections accumulate into the conflict mass `K`.
//! 4. Every bucket is divided by `1 − K`, taken as the sum of the buckets.
//! 5. If `K` reaches 1 (within tolerance) the sources are mutually exclusive
//!    and the step fails with [`ShaferError::TotalConflict`].
//!
//! Large steps spread the intersection grid over the rayon pool. Each worker
//! folds into its own buckets and conflict scalar; the partial sums are merged
//! by reduction, so no accumulator is ever shared between threads.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::cancel::CancellationFlag;
use crate::config::EngineConfig;
use crate::error::{ShaferError, ShaferResult};
use crate::frame::{Frame, Subset};
use crate::mass::{FocalElements, MassFunction};

// ---------------------------------------------------------------------------
// Combined mass function
// ---------------------------------------------------------------------------

/// The fused mass function produced by [`CombinationEngine::combine`].
///
/// Carries the per-step conflict masses as provenance. Consumers that only
/// render results should stick to [`focal_elements`](Self::focal_elements).
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedMassFunction {
    mass: MassFunction,
    step_conflicts: Vec<f64>,
}

impl CombinedMassFunction {
    /// The fused mass function.
    pub fn mass(&self) -> &MassFunction {
        &self.mass
    }

    pub fn into_mass(self) -> MassFunction {
        self.mass
    }

    pub fn frame(&self) -> &Frame {
        self.mass.frame()
    }

    pub fn focal_elements(&self) -> FocalElements<'_> {
        self.mass.focal_elements()
    }

    pub fn weight_of(&self, subset: &Subset) -> f64 {
        self.mass.weight_of(subset)
    }

    /// Conflict mass `Kᵢ` of each pairwise step, in fold order.
    pub fn step_conflicts(&self) -> &[f64] {
        &self.step_conflicts
    }

    /// Overall conflict `K = 1 − Π(1 − Kᵢ)`: the mass an n-ary combination
    /// assigns to ∅ before normalization. Equals `K₁` for two sources.
    pub fn conflict(&self) -> f64 {
        1.0 - self
            .step_conflicts
            .iter()
            .map(|k| 1.0 - k)
            .product::<f64>()
    }

    /// Number of mass functions fused into this one.
    pub fn source_count(&self) -> usize {
        self.step_conflicts.len() + 1
    }
}

impl AsRef<MassFunction> for CombinedMassFunction {
    fn as_ref(&self) -> &MassFunction {
        &self.mass
    }
}

impl AsRef<MassFunction> for MassFunction {
    fn as_ref(&self) -> &MassFunction {
        self
    }
}

// ---------------------------------------------------------------------------
// Joint masses (one pairwise step, before normalization)
// ---------------------------------------------------------------------------

/// Unnormalized output of a pairwise step.
#[derive(Debug, Default)]
pub(crate) struct JointMasses {
    buckets: HashMap<Subset, f64>,
    conflict: f64,
}

impl JointMasses {
    fn accumulate(&mut self, a: &Subset, wa: f64, b: &Subset, wb: f64) {
        let joint = wa * wb;
        let intersection = a.intersection(b);
        if intersection.is_empty() {
            self.conflict += joint;
        } else {
            *self.buckets.entry(intersection).or_insert(0.0) += joint;
        }
    }

    fn merge(mut self, other: JointMasses) -> JointMasses {
        // Fold the smaller map into the larger one.
        if self.buckets.len() < other.buckets.len() {
            return other.merge(self);
        }
        for (subset, mass) in other.buckets {
            *self.buckets.entry(subset).or_insert(0.0) += mass;
        }
        self.conflict += other.conflict;
        self
    }

    /// Σ buckets + K. Equals 1 for valid operands.
    #[cfg(test)]
    fn total(&self) -> f64 {
        self.buckets.values().sum::<f64>() + self.conflict
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Fuses independent mass functions with Dempster's rule.
///
/// Stateless apart from its configuration: a single engine can serve any
/// number of concurrent callers.
#[derive(Clone, Debug, Default)]
pub struct CombinationEngine {
    config: EngineConfig,
    cancellation: Option<CancellationFlag>,
}

impl CombinationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from a validated configuration.
    pub fn with_config(config: EngineConfig) -> ShaferResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancellation: None,
        })
    }

    /// Poll `flag` before every pairwise step.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Combine an ordered sequence of two or more mass functions over `frame`.
    ///
    /// Every source is validated against `frame` before any work is done.
    /// The result does not depend on source order beyond floating-point
    /// rounding.
    pub fn combine<M: AsRef<MassFunction>>(
        &self,
        frame: &Frame,
        sources: &[M],
    ) -> ShaferResult<CombinedMassFunction> {
        if sources.len() < 2 {
            return Err(ShaferError::InsufficientSources(sources.len()));
        }
        for source in sources {
            frame.ensure_same(source.as_ref().frame())?;
        }

        let mut fused = sources[0].as_ref().clone();
        let mut step_conflicts = Vec::with_capacity(sources.len() - 1);

        for (completed_steps, next) in sources[1..].iter().enumerate() {
            if self.is_cancelled() {
                log::info!(
                    "Combination cancelled after {} of {} steps",
                    completed_steps,
                    sources.len() - 1
                );
                return Err(ShaferError::Cancelled { completed_steps });
            }
            let (mass, conflict) = self.combine_step(completed_steps + 1, &fused, next.as_ref())?;
            step_conflicts.push(conflict);
            fused = mass;
        }

        Ok(CombinedMassFunction {
            mass: fused,
            step_conflicts,
        })
    }

    /// Combine exactly two mass functions over their shared frame.
    pub fn combine_pair(
        &self,
        left: &MassFunction,
        right: &MassFunction,
    ) -> ShaferResult<CombinedMassFunction> {
        self.combine(left.frame(), &[left, right])
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(CancellationFlag::is_cancelled)
            .unwrap_or(false)
    }

    /// One normalized Dempster step. `step` is 1-based, for error reporting.
    fn combine_step(
        &self,
        step: usize,
        left: &MassFunction,
        right: &MassFunction,
    ) -> ShaferResult<(MassFunction, f64)> {
        let joint = self.joint_masses(left, right);
        let conflict = joint.conflict;

        if 1.0 - conflict <= self.config.tolerance || joint.buckets.is_empty() {
            log::debug!("Step {}: total conflict (K = {:.9})", step, conflict);
            return Err(ShaferError::TotalConflict { step, conflict });
        }

        // Σ buckets equals 1 − K but keeps its precision when K is near 1.
        let normalizer: f64 = joint.buckets.values().sum();

        let focal: BTreeMap<Subset, f64> = joint
            .buckets
            .into_iter()
            .map(|(subset, mass)| (subset, mass / normalizer))
            .collect();

        log::debug!(
            "Step {}: {} x {} focal elements -> {}, conflict {:.6}",
            step,
            left.len(),
            right.len(),
            focal.len(),
            conflict
        );

        Ok((
            MassFunction::from_normalized(left.frame().clone(), focal),
            conflict,
        ))
    }

    /// Intersect every focal pair and accumulate joint masses.
    pub(crate) fn joint_masses(&self, left: &MassFunction, right: &MassFunction) -> JointMasses {
        let pairs = left.len() * right.len();

        if self.config.parallel_for(pairs) {
            let lhs: Vec<(&Subset, f64)> = left.focal_elements().collect();
            lhs.par_iter()
                .fold(JointMasses::default, |mut acc, &(a, wa)| {
                    for (b, wb) in right.focal_elements() {
                        acc.accumulate(a, wa, b, wb);
                    }
                    acc
                })
                .reduce(JointMasses::default, JointMasses::merge)
        } else {
            let mut acc = JointMasses::default();
            for (a, wa) in left.focal_elements() {
                for (b, wb) in right.focal_elements() {
                    acc.accumulate(a, wa, b, wb);
                }
            }
            acc
        }
    }
}

/// Combine with the default engine.
pub fn combine<M: AsRef<MassFunction>>(
    frame: &Frame,
    sources: &[M],
) -> ShaferResult<CombinedMassFunction> {
    CombinationEngine::default().combine(frame, sources)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::MASS_TOLERANCE;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn people() -> Frame {
        Frame::build(["Alice", "Bob", "Charlie"]).unwrap()
    }

    fn sensor_a(frame: &Frame) -> MassFunction {
        MassFunction::build(
            frame,
            [
                (vec!["Alice", "Charlie"], 0.6),
                (vec!["Bob"], 0.3),
                (vec!["Alice", "Bob"], 0.1),
            ],
        )
        .unwrap()
    }

    fn sensor_b(frame: &Frame) -> MassFunction {
        MassFunction::build(
            frame,
            [
                (vec!["Alice", "Bob"], 0.7),
                (vec!["Alice", "Charlie"], 0.2),
                (vec!["Bob", "Charlie"], 0.1),
            ],
        )
        .unwrap()
    }

    /// Random mass function with up to `max_focal` focal elements.
    fn random_mass(frame: &Frame, rng: &mut StdRng, max_focal: usize) -> MassFunction {
        let n = frame.len();
        let mut focal: BTreeMap<Subset, f64> = BTreeMap::new();
        for _ in 0..rng.gen_range(1..=max_focal) {
            let mut names = Vec::new();
            while names.is_empty() {
                names = frame
                    .atoms()
                    .iter()
                    .filter(|_| rng.gen_bool(2.0 / n as f64))
                    .cloned()
                    .collect();
            }
            let subset = frame.subset(&names).unwrap();
            *focal.entry(subset).or_insert(0.0) += rng.gen_range(0.05..1.0);
        }
        let total: f64 = focal.values().sum();
        let mut pairs: Vec<(Subset, f64)> = focal.into_iter().map(|(s, w)| (s, w / total)).collect();
        // Push rounding residue onto the first entry so validation passes exactly.
        let residue = 1.0 - pairs.iter().map(|(_, w)| w).sum::<f64>();
        pairs[0].1 += residue;
        MassFunction::from_subsets(frame, pairs).unwrap()
    }

    fn assert_same_mass(a: &MassFunction, b: &MassFunction, tol: f64) {
        let keys: std::collections::BTreeSet<&Subset> = a
            .focal_elements()
            .chain(b.focal_elements())
            .map(|(s, _)| s)
            .collect();
        for key in keys {
            let (wa, wb) = (a.weight_of(key), b.weight_of(key));
            assert!(
                (wa - wb).abs() < tol,
                "weights differ for {}: {} vs {}",
                a.frame().describe(key),
                wa,
                wb
            );
        }
    }

    #[test]
    fn two_sensor_scenario() {
        let frame = people();
        let combined = combine(&frame, &[sensor_a(&frame), sensor_b(&frame)]).unwrap();

        let w = |names: &[&str]| combined.weight_of(&frame.subset(names).unwrap());
        assert!((w(&["Alice"]) - 0.44 / 0.94).abs() < 1e-9);
        assert!((w(&["Bob"]) - 0.25 / 0.94).abs() < 1e-9);
        assert!((w(&["Alice", "Charlie"]) - 0.12 / 0.94).abs() < 1e-9);
        assert!((w(&["Alice", "Bob"]) - 0.07 / 0.94).abs() < 1e-9);
        assert!((w(&["Charlie"]) - 0.06 / 0.94).abs() < 1e-9);
        assert_eq!(w(&["Bob", "Charlie"]), 0.0);
        assert_eq!(combined.mass().len(), 5);

        assert!((combined.conflict() - 0.06).abs() < 1e-12);
        assert_eq!(combined.source_count(), 2);
        assert!((combined.mass().total_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn joint_masses_account_for_all_probability() {
        let frame = people();
        let engine = CombinationEngine::new();
        let joint = engine.joint_masses(&sensor_a(&frame), &sensor_b(&frame));
        assert!((joint.conflict - 0.06).abs() < 1e-12);
        assert!((joint.total() - 1.0).abs() < 1e-12);

        let names: Vec<String> = (0..12).map(|i| format!("h{}", i)).collect();
        let wide = Frame::build(names).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let m1 = random_mass(&wide, &mut rng, 8);
            let m2 = random_mass(&wide, &mut rng, 8);
            let joint = engine.joint_masses(&m1, &m2);
            assert!((joint.total() - 1.0).abs() < 1e-9, "total was {}", joint.total());
        }
    }

    #[test]
    fn total_contradiction_is_an_error() {
        let frame = people();
        let alice = MassFunction::build(&frame, [(vec!["Alice"], 1.0)]).unwrap();
        let bob = MassFunction::build(&frame, [(vec!["Bob"], 1.0)]).unwrap();
        let err = combine(&frame, &[alice, bob]).unwrap_err();
        assert_eq!(
            err,
            ShaferError::TotalConflict {
                step: 1,
                conflict: 1.0
            }
        );
    }

    #[test]
    fn near_total_contradiction_within_tolerance_is_an_error() {
        let frame = people();
        let alice = MassFunction::build(&frame, [(vec!["Alice"], 1.0)]).unwrap();
        let mostly_bob = MassFunction::build(
            &frame,
            [(vec!["Bob"], 1.0 - 1e-12), (vec!["Alice", "Bob"], 1e-12)],
        )
        .unwrap();
        let err = combine(&frame, &[alice, mostly_bob]).unwrap_err();
        assert!(matches!(err, ShaferError::TotalConflict { step: 1, .. }));
    }

    #[test]
    fn total_conflict_reports_the_failing_step() {
        let frame = people();
        let alice = MassFunction::build(&frame, [(vec!["Alice"], 1.0)]).unwrap();
        let bob = MassFunction::build(&frame, [(vec!["Bob"], 1.0)]).unwrap();
        let err = combine(
            &frame,
            &[sensor_a(&frame), alice, MassFunction::vacuous(&frame), bob],
        )
        .unwrap_err();
        assert!(matches!(err, ShaferError::TotalConflict { step: 3, .. }));
    }

    #[test]
    fn fewer_than_two_sources_is_an_error() {
        let frame = people();
        assert_eq!(
            combine(&frame, &[sensor_a(&frame)]).unwrap_err(),
            ShaferError::InsufficientSources(1)
        );
        assert_eq!(
            combine::<MassFunction>(&frame, &[]).unwrap_err(),
            ShaferError::InsufficientSources(0)
        );
    }

    #[test]
    fn sources_from_another_frame_are_rejected() {
        let frame = people();
        let other = Frame::build(["Alice", "Bob", "Dave"]).unwrap();
        let foreign = MassFunction::build(&other, [(vec!["Dave"], 1.0)]).unwrap();
        let err = combine(&frame, &[sensor_a(&frame), foreign]).unwrap_err();
        assert!(matches!(err, ShaferError::FrameMismatch { .. }));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let frame = people();
        let a = sensor_a(&frame);
        let b = sensor_b(&frame);
        let (a0, b0) = (a.clone(), b.clone());
        let _ = combine(&frame, &[&a, &b]).unwrap();
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn vacuous_evidence_is_neutral() {
        let frame = people();
        let a = sensor_a(&frame);
        let combined = combine(&frame, &[a.clone(), MassFunction::vacuous(&frame)]).unwrap();
        assert_same_mass(combined.mass(), &a, 1e-12);
        assert_eq!(combined.conflict(), 0.0);
    }

    #[test]
    fn n_ary_combination_tracks_step_conflicts() {
        let frame = people();
        let a = sensor_a(&frame);
        let b = sensor_b(&frame);
        let combined = combine(&frame, &[&a, &b, &a]).unwrap();
        assert_eq!(combined.source_count(), 3);
        assert_eq!(combined.step_conflicts().len(), 2);

        let k1 = combined.step_conflicts()[0];
        let k2 = combined.step_conflicts()[1];
        assert!((k1 - 0.06).abs() < 1e-12);
        assert!((combined.conflict() - (1.0 - (1.0 - k1) * (1.0 - k2))).abs() < 1e-12);

        let stepwise = combine(&frame, &[combine(&frame, &[&a, &b]).unwrap().mass(), &a]).unwrap();
        assert_same_mass(combined.mass(), stepwise.mass(), 1e-12);
    }

    #[test]
    fn combine_pair_matches_combine() {
        let frame = people();
        let engine = CombinationEngine::new();
        let a = sensor_a(&frame);
        let b = sensor_b(&frame);
        let pair = engine.combine_pair(&a, &b).unwrap();
        let full = engine.combine(&frame, &[&a, &b]).unwrap();
        assert_eq!(pair, full);
    }

    #[test]
    fn parallel_and_sequential_steps_agree() {
        let names: Vec<String> = (0..20).map(|i| format!("h{:02}", i)).collect();
        let frame = Frame::build(names).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let sources: Vec<MassFunction> = (0..4).map(|_| random_mass(&frame, &mut rng, 40)).collect();

        let sequential = CombinationEngine::with_config(EngineConfig {
            parallel_threshold: 0,
            ..EngineConfig::default()
        })
        .unwrap();
        let parallel = CombinationEngine::with_config(EngineConfig {
            parallel_threshold: 1,
            ..EngineConfig::default()
        })
        .unwrap();

        match (sequential.combine(&frame, &sources), parallel.combine(&frame, &sources)) {
            (Ok(s), Ok(p)) => {
                assert_same_mass(s.mass(), p.mass(), 1e-12);
                assert!((s.conflict() - p.conflict()).abs() < 1e-12);
            }
            (Err(s), Err(p)) => assert_eq!(s, p),
            (s, p) => panic!("engines disagree: {:?} vs {:?}", s, p),
        }
    }

    #[test]
    fn cancellation_stops_between_steps() {
        let frame = people();
        let flag = CancellationFlag::new();
        let engine = CombinationEngine::new().with_cancellation(flag.clone());

        assert!(engine.combine(&frame, &[sensor_a(&frame), sensor_b(&frame)]).is_ok());

        flag.cancel();
        let err = engine
            .combine(&frame, &[sensor_a(&frame), sensor_b(&frame)])
            .unwrap_err();
        assert_eq!(err, ShaferError::Cancelled { completed_steps: 0 });
    }

    #[test]
    fn cancellation_raised_mid_fold_reports_completed_steps() {
        use std::cell::Cell;

        // Raises the flag the second time the engine reads it (the first
        // read is frame validation), i.e. while its own step runs.
        struct CancelOnUse<'a> {
            mass: MassFunction,
            flag: &'a CancellationFlag,
            reads: Cell<usize>,
        }

        impl AsRef<MassFunction> for CancelOnUse<'_> {
            fn as_ref(&self) -> &MassFunction {
                self.reads.set(self.reads.get() + 1);
                if self.reads.get() == 2 {
                    self.flag.cancel();
                }
                &self.mass
            }
        }

        let frame = people();
        let flag = CancellationFlag::new();
        let engine = CombinationEngine::new().with_cancellation(flag.clone());
        let plain = |mass: MassFunction| CancelOnUse {
            mass,
            flag: &flag,
            reads: Cell::new(usize::MAX / 2),
        };
        let sources = [
            plain(sensor_a(&frame)),
            plain(sensor_b(&frame)),
            CancelOnUse {
                mass: MassFunction::vacuous(&frame),
                flag: &flag,
                reads: Cell::new(0),
            },
            plain(sensor_a(&frame)),
        ];

        let err = engine.combine(&frame, &sources).unwrap_err();
        assert_eq!(err, ShaferError::Cancelled { completed_steps: 2 });
        assert!(flag.is_cancelled());
    }

    #[test]
    fn near_total_conflict_stays_normalized() {
        let frame = people();
        let (x, y) = (1.7e-5, 6.5e-5);
        assert!(x * y > MASS_TOLERANCE);
        let m1 = MassFunction::build(&frame, [(vec!["Alice"], 1.0 - x), (vec!["Bob"], x)]).unwrap();
        let m2 = MassFunction::build(&frame, [(vec!["Bob"], y), (vec!["Charlie"], 1.0 - y)]).unwrap();

        let combined = combine(&frame, &[&m1, &m2]).unwrap();
        assert!((combined.mass().total_mass() - 1.0).abs() < 1e-12);
        assert_eq!(combined.weight_of(&frame.singleton("Bob").unwrap()), 1.0);
        assert!((combined.conflict() - (1.0 - x * y)).abs() < 1e-12);

        let pairs: Vec<(Subset, f64)> = combined
            .focal_elements()
            .map(|(s, w)| (s.clone(), w))
            .collect();
        assert!(MassFunction::from_subsets(&frame, pairs).is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = CombinationEngine::with_config(EngineConfig {
            tolerance: 0.25,
            ..EngineConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ShaferError::InvalidConfig(_)));
    }
}
