//! CSV evidence loader.
//!
//! One row per focal element. Expected CSV columns:
//!   source, hypotheses, mass
//!
//! `hypotheses` lists the atoms of the focal element separated by `|`.
//! Rows of the same source need not be adjacent; sources are combined in
//! the order they first appear. Lines starting with `#` are skipped.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SourceError, SourceResult};
use crate::session::{EvidenceSession, RawSource};

/// Separator between atoms inside the `hypotheses` column.
pub const HYPOTHESIS_SEPARATOR: char = '|';

/// One focal element of one source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvidenceRecord {
    pub source: String,
    #[serde(deserialize_with = "deserialize_hypotheses")]
    pub hypotheses: Vec<String>,
    pub mass: f64,
}

/// Load evidence records from a CSV reader.
pub fn load_evidence<R: Read>(reader: R) -> SourceResult<Vec<EvidenceRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: EvidenceRecord = result.map_err(|e| SourceError::Csv {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(line_num + 2),
            source: e,
        })?;
        records.push(record);
    }

    log::debug!("Parsed {} evidence rows", records.len());
    Ok(records)
}

/// Load evidence records from a CSV file path.
pub fn load_evidence_file(path: &Path) -> SourceResult<Vec<EvidenceRecord>> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_evidence(file)
}

/// Group records by source, in order of first appearance.
pub fn group_by_source(records: &[EvidenceRecord]) -> Vec<(String, Vec<EvidenceRecord>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<EvidenceRecord>)> = Vec::new();
    for record in records {
        let slot = *slots.entry(record.source.as_str()).or_insert_with(|| {
            groups.push((record.source.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record.clone());
    }
    groups
}

/// Validate grouped records into a session with an inferred frame.
pub fn session_from_records(records: &[EvidenceRecord]) -> SourceResult<EvidenceSession> {
    let raw_sources = group_by_source(records)
        .into_iter()
        .map(|(name, rows)| RawSource {
            name,
            reliability: None,
            entries: rows.into_iter().map(|r| (r.hypotheses, r.mass)).collect(),
        })
        .collect();
    EvidenceSession::from_raw(None, raw_sources)
}

/// Split `Alice|Charlie` into atoms, dropping blanks around separators.
fn deserialize_hypotheses<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let atoms: Vec<String> = s
        .split(HYPOTHESIS_SEPARATOR)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect();
    if atoms.is_empty() {
        return Err(serde::de::Error::custom(format!(
            "expected at least one hypothesis, got '{}'",
            s
        )));
    }
    Ok(atoms)
}
