//! Typed error hierarchy for the quillgate control plane.
//!
//! Two top-level enums cover the two stateful subsystems:
//! - `StateError` — checkpoint/pipeline state transition failures
//! - `EvolutionError` — constraint-evolution and pending-item failures
//!
//! Gate and hook failures are deliberately *not* errors: they are ordinary
//! result data (`GateResult`/`HookResult` with `passed = false`).

use thiserror::Error;

/// Errors from the checkpoint subsystem (pipeline state transitions).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Regression from phase {from} to {to} names no sections to rewrite")]
    RegressionWithoutSections { from: u32, to: u32 },

    #[error("Invalid regression: target phase {to} is not earlier than phase {from}")]
    InvalidRegression { from: u32, to: u32 },

    #[error("Unknown phase number {0}")]
    UnknownPhase(u32),

    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the constraint-evolution subsystem.
#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error("Unknown paper type '{0}'")]
    UnknownPaperType(String),

    #[error("Evolution item {id} not found")]
    ItemNotFound { id: String },

    #[error("Evolution item {id} already resolved as {status}")]
    AlreadyResolved { id: String, status: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
