//! Hook rule engine: independent, stateless content-quality checks.
//!
//! Each hook is a pure function of (content, optional sibling content,
//! configuration) producing a typed `HookResult`. The set of hooks is the
//! closed `HookKind` enum; new hooks are added by extending it, keeping
//! severity and category handling exhaustive at compile time.

pub mod claims;
pub mod crossref;
pub mod language;
pub mod overlap;
pub mod runner;
pub mod types;

pub use runner::{
    run_hook, run_post_manuscript_hooks, run_post_section_hooks, run_post_write_hooks,
};
pub use types::{
    HookConfig, HookInput, HookIssue, HookKind, HookResult, Severity, SpellingStyle,
};
