//! Evidence sessions: one frame plus the ordered sources to fuse over it.

use std::collections::BTreeSet;
use std::path::Path;

use shafer_core::{
    CombinationEngine, CombinedMassFunction, Frame, MassFunction, ShaferResult,
};

use crate::document::load_document_file;
use crate::error::{SourceError, SourceResult};
use crate::evidence_loader::{load_evidence_file, session_from_records};

/// One named evidence source and its validated mass function.
#[derive(Clone, Debug, PartialEq)]
pub struct EvidenceSource {
    pub name: String,
    pub mass: MassFunction,
}

impl AsRef<MassFunction> for EvidenceSource {
    fn as_ref(&self) -> &MassFunction {
        &self.mass
    }
}

/// A frame and the sources to combine over it, in combination order.
#[derive(Clone, Debug, PartialEq)]
pub struct EvidenceSession {
    pub frame: Frame,
    pub sources: Vec<EvidenceSource>,
}

/// Raw description of one source before validation.
#[derive(Clone, Debug, Default)]
pub(crate) struct RawSource {
    pub name: String,
    pub reliability: Option<f64>,
    pub entries: Vec<(Vec<String>, f64)>,
}

impl EvidenceSession {
    /// Validate raw source descriptions into a session.
    ///
    /// With no explicit frame, the frame is inferred as the union of every
    /// hypothesis the sources mention.
    pub(crate) fn from_raw(
        frame_atoms: Option<Vec<String>>,
        raw_sources: Vec<RawSource>,
    ) -> SourceResult<Self> {
        if raw_sources.is_empty() {
            return Err(SourceError::EmptySession);
        }

        let atoms: Vec<String> = match frame_atoms {
            Some(atoms) => atoms,
            None => raw_sources
                .iter()
                .flat_map(|s| s.entries.iter().flat_map(|(names, _)| names.iter()))
                .map(|name| name.trim().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };
        let frame = Frame::build(atoms).map_err(SourceError::Frame)?;

        let sources = raw_sources
            .into_iter()
            .map(|raw| build_source(&frame, raw))
            .collect::<SourceResult<Vec<_>>>()?;

        log::info!(
            "Loaded {} evidence sources over frame {}",
            sources.len(),
            frame
        );
        Ok(Self { frame, sources })
    }

    /// Source names in combination order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    /// Fuse every source of the session with `engine`.
    pub fn combine(&self, engine: &CombinationEngine) -> ShaferResult<CombinedMassFunction> {
        engine.combine(&self.frame, &self.sources)
    }
}

fn build_source(frame: &Frame, raw: RawSource) -> SourceResult<EvidenceSource> {
    let RawSource {
        name,
        reliability,
        entries,
    } = raw;
    let built = MassFunction::build(frame, entries).and_then(|mass| match reliability {
        Some(r) => mass.discount(r),
        None => Ok(mass),
    });
    match built {
        Ok(mass) => Ok(EvidenceSource { name, mass }),
        Err(source) => Err(SourceError::Evidence { name, source }),
    }
}

/// Load a session from disk: `.json` files are evidence documents, anything
/// else is read as evidence CSV.
pub fn load_session(path: impl AsRef<Path>) -> SourceResult<EvidenceSession> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        load_document_file(path)?.into_session()
    } else {
        session_from_records(&load_evidence_file(path)?)
    }
}
