//! Constraint-evolution layer.
//!
//! - `constraints`: paper-type rule templates, learned-constraint merge,
//!   and content validation
//! - `effectiveness`: per-hook trigger/pass/fix counters
//! - `meta`: the meta-learning engine turning counters and quality scores
//!   into proposed refinements
//! - `pending`: durable store of proposals awaiting a human verdict
//! - `verifier`: cross-project evidence that evolution is really happening

pub mod constraints;
pub mod effectiveness;
pub mod meta;
pub mod pending;
pub mod verifier;

pub use constraints::{
    Constraint, ConstraintCategory, ConstraintReport, ConstraintViolation, DomainConstraintEngine,
    PaperType, Provenance,
};
pub use effectiveness::{HookCounters, HookEffectivenessTracker};
pub use meta::{AnalysisSummary, MetaLearningEngine, QualityScorecard, Recommendation};
pub use pending::{EvolutionItem, EvolutionStatus, PendingEvolutionStore};
pub use verifier::{EvolutionVerdict, EvolutionVerifier, VerificationReport};
