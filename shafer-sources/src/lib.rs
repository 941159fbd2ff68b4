//! Evidence session loading for the Dempster-Shafer engine.
//!
//! Sessions come from two file formats:
//! - CSV, one focal element per row (see [`evidence_loader`])
//! - JSON evidence documents (see [`document`])
//!
//! Both produce an [`EvidenceSession`]: a validated frame plus the ordered,
//! validated sources ready for [`shafer_core::CombinationEngine`].

pub mod document;
pub mod error;
pub mod evidence_loader;
pub mod session;

pub use document::{load_document_file, EvidenceDocument, FocalDocument, SourceDocument};
pub use error::{SourceError, SourceResult};
pub use evidence_loader::{
    group_by_source, load_evidence, load_evidence_file, session_from_records, EvidenceRecord,
};
pub use session::{load_session, EvidenceSession, EvidenceSource};
