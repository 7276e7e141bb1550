//! The ordered phase set of the manuscript pipeline.
//!
//! Phases form a linear pipeline with two reserved gaps (4 and the 12..64
//! range): the numbering is stable across projects, so gaps stay gaps.
//! Phase 65 is the interim quality sweep between drafting and review and
//! renders as "6.5" in human-readable output.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::StateError;

/// A pipeline phase. The numeric representation is the on-disk contract;
/// the enum keeps phase handling exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Phase {
    Bootstrap,
    ProjectDefinition,
    LiteratureSearch,
    ReferenceScreening,
    ConceptDevelopment,
    SectionDrafting,
    QualitySweep,
    ManuscriptReview,
    Revision,
    Supplementary,
    Formatting,
    SubmissionPackage,
}

impl Phase {
    /// All phases, in pipeline order.
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Bootstrap,
            Phase::ProjectDefinition,
            Phase::LiteratureSearch,
            Phase::ReferenceScreening,
            Phase::ConceptDevelopment,
            Phase::SectionDrafting,
            Phase::QualitySweep,
            Phase::ManuscriptReview,
            Phase::Revision,
            Phase::Supplementary,
            Phase::Formatting,
            Phase::SubmissionPackage,
        ]
    }

    /// The stable phase number used in persisted state and logs.
    pub fn number(&self) -> u32 {
        match self {
            Phase::Bootstrap => 0,
            Phase::ProjectDefinition => 1,
            Phase::LiteratureSearch => 2,
            Phase::ReferenceScreening => 3,
            Phase::ConceptDevelopment => 5,
            Phase::SectionDrafting => 6,
            Phase::QualitySweep => 65,
            Phase::ManuscriptReview => 7,
            Phase::Revision => 8,
            Phase::Supplementary => 9,
            Phase::Formatting => 10,
            Phase::SubmissionPackage => 11,
        }
    }

    /// Position in the pipeline (0-based). Orders 65 between 6 and 7.
    pub fn sequence_index(&self) -> usize {
        Phase::all()
            .iter()
            .position(|p| p == self)
            .expect("phase listed in all()")
    }

    /// Resolve a stable phase number to a phase.
    pub fn from_number(n: u32) -> Result<Phase, StateError> {
        Phase::all()
            .iter()
            .copied()
            .find(|p| p.number() == n)
            .ok_or(StateError::UnknownPhase(n))
    }

    /// Human-readable phase name.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Bootstrap => "Project bootstrap",
            Phase::ProjectDefinition => "Project definition",
            Phase::LiteratureSearch => "Literature search",
            Phase::ReferenceScreening => "Reference screening",
            Phase::ConceptDevelopment => "Concept development",
            Phase::SectionDrafting => "Section drafting",
            Phase::QualitySweep => "Interim quality sweep",
            Phase::ManuscriptReview => "Manuscript review",
            Phase::Revision => "Revision",
            Phase::Supplementary => "Supplementary materials",
            Phase::Formatting => "Formatting",
            Phase::SubmissionPackage => "Submission package",
        }
    }

    /// Display form of the phase number ("6.5" for the interim sweep).
    pub fn display_number(&self) -> String {
        match self {
            Phase::QualitySweep => "6.5".to_string(),
            other => other.number().to_string(),
        }
    }
}

impl From<Phase> for u32 {
    fn from(p: Phase) -> u32 {
        p.number()
    }
}

impl TryFrom<u32> for Phase {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Phase::from_number(n).map_err(|e| e.to_string())
    }
}

impl std::str::FromStr for Phase {
    type Err = StateError;

    /// Parse a CLI-facing phase number; accepts "6.5" for the interim sweep.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "6.5" {
            return Ok(Phase::QualitySweep);
        }
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| StateError::Other(anyhow::anyhow!("invalid phase number: {s}")))?;
        Phase::from_number(n)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.display_number(), self.name())
    }
}
