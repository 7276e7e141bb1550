//! Hook dispatch and batch entry points.
//!
//! Each batch runs a fixed subset of hooks and returns a map keyed by hook
//! kind; no hook's result depends on another's within a batch.

use std::collections::BTreeMap;
use tracing::debug;

use super::types::{HookConfig, HookInput, HookKind, HookResult};
use super::{claims, crossref, language, overlap};

/// Run one hook. Pure: same input and config, same result.
pub fn run_hook(kind: HookKind, input: &HookInput, config: &HookConfig) -> HookResult {
    let result = match kind {
        HookKind::LanguageConsistency => language::run(input, config),
        HookKind::OverlapDetection => overlap::run(input, config),
        HookKind::DataClaimAlignment => claims::run(input, config),
        HookKind::SupplementaryCrossref => crossref::run(input, config),
    };
    debug!(hook = %kind, passed = result.passed, issues = result.issues.len(), "hook run");
    result
}

fn run_batch(
    kinds: &[HookKind],
    input: &HookInput,
    config: &HookConfig,
) -> BTreeMap<HookKind, HookResult> {
    kinds
        .iter()
        .map(|kind| (*kind, run_hook(*kind, input, config)))
        .collect()
}

/// Hooks after any write of manuscript text.
pub fn run_post_write_hooks(input: &HookInput, config: &HookConfig) -> BTreeMap<HookKind, HookResult> {
    run_batch(&[HookKind::LanguageConsistency], input, config)
}

/// Hooks after a section is completed.
pub fn run_post_section_hooks(
    input: &HookInput,
    config: &HookConfig,
) -> BTreeMap<HookKind, HookResult> {
    run_batch(
        &[HookKind::LanguageConsistency, HookKind::OverlapDetection],
        input,
        config,
    )
}

/// Hooks after the full manuscript is assembled.
pub fn run_post_manuscript_hooks(
    input: &HookInput,
    config: &HookConfig,
) -> BTreeMap<HookKind, HookResult> {
    run_batch(HookKind::all(), input, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_write_runs_language_only() {
        let input = HookInput::text("The colour was recorded.");
        let results = run_post_write_hooks(&input, &HookConfig::default());
        assert_eq!(results.len(), 1);
        assert!(!results[&HookKind::LanguageConsistency].passed);
    }

    #[test]
    fn test_post_section_runs_fixed_pair() {
        let input = HookInput::text("Plain clean text with nothing to flag.");
        let results = run_post_section_hooks(&input, &HookConfig::default());
        assert_eq!(results.len(), 2);
        assert!(results.contains_key(&HookKind::LanguageConsistency));
        assert!(results.contains_key(&HookKind::OverlapDetection));
        assert!(results.values().all(|r| r.passed));
    }

    #[test]
    fn test_post_manuscript_runs_all_hooks() {
        let input = HookInput::text("Clean manuscript body.");
        let results = run_post_manuscript_hooks(&input, &HookConfig::default());
        assert_eq!(results.len(), HookKind::all().len());
    }

    #[test]
    fn test_hooks_are_independent_within_batch() {
        // A language failure must not affect the overlap verdict.
        let input = HookInput::text("The colour was measured in the randomised cohort.");
        let results = run_post_section_hooks(&input, &HookConfig::default());
        assert!(!results[&HookKind::LanguageConsistency].passed);
        assert!(results[&HookKind::OverlapDetection].passed);
    }

    #[test]
    fn test_run_hook_is_deterministic() {
        let input = HookInput::text("We analysed the colour data.");
        let config = HookConfig::default();
        let a = run_hook(HookKind::LanguageConsistency, &input, &config);
        let b = run_hook(HookKind::LanguageConsistency, &input, &config);
        assert_eq!(a.passed, b.passed);
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.issues.len(), b.issues.len());
    }
}
