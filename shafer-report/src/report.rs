//! Console and JSON renderings of a combined session.
//!
//! Only focal elements, their weights and belief queries are rendered.
//! Conflict is a diagnostic and goes to the log instead.

use std::cmp::Ordering;
use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;
use shafer_core::{rank_hypotheses, CombinedMassFunction, HypothesisRank, Subset};
use shafer_sources::EvidenceSession;

use crate::config::ReportSettings;

const RULE_WIDTH: usize = 64;

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ReportJson {
    pub generated_at: String,
    pub frame: Vec<String>,
    pub sources: Vec<String>,
    pub focal_elements: Vec<FocalJson>,
    pub ranking: Vec<HypothesisRank>,
}

#[derive(Debug, Serialize)]
pub struct FocalJson {
    pub hypotheses: Vec<String>,
    pub mass: f64,
}

pub fn build_json(
    session: &EvidenceSession,
    fused: &CombinedMassFunction,
    settings: &ReportSettings,
) -> ReportJson {
    let frame = fused.frame();
    ReportJson {
        generated_at: Utc::now().to_rfc3339(),
        frame: frame.atoms().to_vec(),
        sources: session.sources.iter().map(|s| s.name.clone()).collect(),
        focal_elements: by_mass_descending(fused)
            .into_iter()
            .map(|(subset, mass)| FocalJson {
                hypotheses: frame.labels(subset).into_iter().map(String::from).collect(),
                mass,
            })
            .collect(),
        ranking: top_ranks(fused, settings.top),
    }
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

pub fn render_human<W: Write>(
    out: &mut W,
    session: &EvidenceSession,
    fused: &CombinedMassFunction,
    settings: &ReportSettings,
) -> io::Result<()> {
    let frame = fused.frame();
    let p = settings.precision;

    writeln!(out)?;
    writeln!(out, "  \u{2554}{}\u{2557}", "\u{2550}".repeat(RULE_WIDTH - 2))?;
    writeln!(
        out,
        "  \u{2551}{:^width$}\u{2551}",
        "SHAFER \u{00b7} Evidence Combination Report",
        width = RULE_WIDTH - 2
    )?;
    writeln!(out, "  \u{255a}{}\u{255d}", "\u{2550}".repeat(RULE_WIDTH - 2))?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} sources fused  \u{00b7}  {} hypotheses  \u{00b7}  {} focal elements",
        fused.source_count(),
        frame.len(),
        fused.mass().len()
    )?;
    writeln!(out, "  Sources: {}", session.source_names().join(", "))?;
    writeln!(out)?;

    for (subset, mass) in by_mass_descending(fused) {
        writeln!(
            out,
            "  Hypothesis {}: mass = {:.*}",
            frame.describe(subset),
            p,
            mass
        )?;
    }
    writeln!(out)?;

    writeln!(out, "  {:\u{2500}<width$}", "", width = RULE_WIDTH)?;
    writeln!(
        out,
        "  {:>4}  {:<24} {:>9} {:>9} {:>9}",
        "#", "Hypothesis", "Bel", "Pl", "BetP"
    )?;
    for (i, r) in top_ranks(fused, settings.top).iter().enumerate() {
        writeln!(
            out,
            "  {:>3}.  {:<24} {:>9.*} {:>9.*} {:>9.*}",
            i + 1,
            r.hypothesis,
            p,
            r.belief,
            p,
            r.plausibility,
            p,
            r.pignistic
        )?;
    }
    writeln!(out, "  {:\u{2500}<width$}", "", width = RULE_WIDTH)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared ordering
// ---------------------------------------------------------------------------

/// Focal elements by weight, heaviest first; ties keep canonical order.
pub fn by_mass_descending(fused: &CombinedMassFunction) -> Vec<(&Subset, f64)> {
    let mut focal: Vec<(&Subset, f64)> = fused.focal_elements().collect();
    focal.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    focal
}

fn top_ranks(fused: &CombinedMassFunction, top: Option<usize>) -> Vec<HypothesisRank> {
    let mut ranks = rank_hypotheses(fused.mass());
    if let Some(n) = top {
        ranks.truncate(n);
    }
    ranks
}
