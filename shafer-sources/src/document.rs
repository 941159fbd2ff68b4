//! JSON evidence documents.
//!
//! ```json
//! {
//!   "frame": ["Alice", "Bob", "Charlie"],
//!   "sources": [
//!     {
//!       "name": "sensor-a",
//!       "reliability": 0.9,
//!       "masses": [
//!         { "hypotheses": ["Alice", "Charlie"], "mass": 0.6 },
//!         { "hypotheses": ["Bob"], "mass": 0.4 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `frame` is optional and inferred from the sources when absent.
//! `reliability` is optional; when present the source is discounted by it
//! before combination.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};
use crate::session::{EvidenceSession, RawSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Vec<String>>,
    pub sources: Vec<SourceDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,
    pub masses: Vec<FocalDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocalDocument {
    pub hypotheses: Vec<String>,
    pub mass: f64,
}

impl EvidenceDocument {
    pub fn from_json_str(json: &str) -> SourceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> SourceResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Validate the document into a session.
    pub fn into_session(self) -> SourceResult<EvidenceSession> {
        let raw_sources = self
            .sources
            .into_iter()
            .map(|s| RawSource {
                name: s.name,
                reliability: s.reliability,
                entries: s
                    .masses
                    .into_iter()
                    .map(|f| (f.hypotheses, f.mass))
                    .collect(),
            })
            .collect();
        EvidenceSession::from_raw(self.frame, raw_sources)
    }
}

/// Load an evidence document from a JSON file path.
pub fn load_document_file(path: &Path) -> SourceResult<EvidenceDocument> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    EvidenceDocument::from_reader(std::io::BufReader::new(file))
}
