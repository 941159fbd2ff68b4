//! Performance benchmark for shafer-core combination.
//!
//! Generates synthetic evidence sources over a wide frame and times the
//! left-fold combination with the sequential and the parallel intersection
//! grid, then checks that both agree.
//!
//! Run with:
//!   cargo run --example benchmark --release -p shafer-core

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shafer_core::{rank_hypotheses, CombinationEngine, EngineConfig, Frame, MassFunction};
use std::time::Instant;

const NUM_ATOMS: usize = 48;
const NUM_SOURCES: usize = 4;
const FOCAL_PER_SOURCE: usize = 250;
const SEED: u64 = 42;

fn main() {
    println!("=== shafer-core Combination Benchmark ===");
    println!();

    // -----------------------------------------------------------------------
    // 1. Generate synthetic evidence
    // -----------------------------------------------------------------------
    println!(
        "Generating {} sources x {} focal elements over {} atoms...",
        NUM_SOURCES, FOCAL_PER_SOURCE, NUM_ATOMS
    );
    let gen_start = Instant::now();
    let frame = Frame::build((0..NUM_ATOMS).map(|i| format!("h{:02}", i)))
        .expect("synthetic frame is valid");
    let mut rng = StdRng::seed_from_u64(SEED);
    let sources: Vec<MassFunction> = (0..NUM_SOURCES)
        .map(|_| synthetic_source(&frame, &mut rng))
        .collect();
    println!("  Data generation: {:.3}s", gen_start.elapsed().as_secs_f64());
    println!();

    // -----------------------------------------------------------------------
    // 2. Sequential vs parallel combination
    // -----------------------------------------------------------------------
    let sequential = CombinationEngine::with_config(EngineConfig {
        parallel_threshold: 0,
        ..EngineConfig::default()
    })
    .expect("valid config");
    let parallel = CombinationEngine::new();

    let seq_start = Instant::now();
    let seq = sequential
        .combine(&frame, &sources)
        .expect("synthetic sources share a common atom");
    let seq_elapsed = seq_start.elapsed();

    let par_start = Instant::now();
    let par = parallel
        .combine(&frame, &sources)
        .expect("synthetic sources share a common atom");
    let par_elapsed = par_start.elapsed();

    println!("  ┌─────────────────────────────────────────────────────────┐");
    println!("  │  COMBINATION RESULTS                                    │");
    println!("  ├─────────────────────────────────────────────────────────┤");
    println!(
        "  │  Sources:         {:>10}                            │",
        NUM_SOURCES
    );
    println!(
        "  │  Fused focal:     {:>10}                            │",
        seq.mass().len()
    );
    println!(
        "  │  Conflict:        {:>10.6}                            │",
        seq.conflict()
    );
    println!(
        "  │  Sequential:      {:>10.3}s                           │",
        seq_elapsed.as_secs_f64()
    );
    println!(
        "  │  Parallel:        {:>10.3}s                           │",
        par_elapsed.as_secs_f64()
    );
    println!(
        "  │  Speedup:         {:>10.2}x                           │",
        seq_elapsed.as_secs_f64() / par_elapsed.as_secs_f64()
    );
    println!("  └─────────────────────────────────────────────────────────┘");
    println!();

    // -----------------------------------------------------------------------
    // 3. Correctness validation
    // -----------------------------------------------------------------------
    println!("Running correctness validation...");
    let mut max_diff = 0.0f64;
    for (subset, w) in seq.focal_elements() {
        max_diff = max_diff.max((w - par.weight_of(subset)).abs());
    }
    println!("  Max weight difference: {:.3e}", max_diff);
    assert!(max_diff < 1e-9, "sequential and parallel results diverged");

    let total: f64 = par.focal_elements().map(|(_, w)| w).sum();
    println!("  Total fused mass: {:.12}", total);
    assert!((total - 1.0).abs() < 1e-9, "fused mass is not normalized");

    println!();
    println!("Top hypotheses (pignistic):");
    for (rank, r) in rank_hypotheses(par.mass()).iter().take(5).enumerate() {
        println!(
            "    #{}: {} BetP={:.4} Bel={:.4} Pl={:.4}",
            rank + 1,
            r.hypothesis,
            r.pignistic,
            r.belief,
            r.plausibility
        );
    }
}

/// A source whose focal elements all contain `h00`, so the benchmark never
/// hits total conflict.
fn synthetic_source(frame: &Frame, rng: &mut StdRng) -> MassFunction {
    let mut entries: Vec<(Vec<String>, f64)> = Vec::with_capacity(FOCAL_PER_SOURCE);
    let mut seen = std::collections::HashSet::new();
    while entries.len() < FOCAL_PER_SOURCE {
        let mut names = vec![frame.atoms()[0].clone()];
        names.extend(frame.atoms()[1..].iter().filter(|_| rng.gen_bool(0.25)).cloned());
        if seen.insert(names.clone()) {
            entries.push((names, rng.gen_range(0.01..1.0)));
        }
    }

    let total: f64 = entries.iter().map(|(_, w)| w).sum();
    for (_, w) in entries.iter_mut() {
        *w /= total;
    }
    let residue = 1.0 - entries.iter().map(|(_, w)| w).sum::<f64>();
    entries[0].1 += residue;

    MassFunction::build(frame, entries).expect("synthetic weights are normalized")
}
