//! Core types for the hook rule engine.
//!
//! This module defines:
//! - `Severity`: the shared CRITICAL/WARNING/INFO classification
//! - `HookKind`: the closed set of content-quality hooks
//! - `HookIssue` / `HookResult`: the typed output of a hook run
//! - `HookInput` / `HookConfig`: the pure-function inputs
//!
//! A hook is a pure function of (content, optional sibling content,
//! configuration); it has no persisted state of its own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Severity classification shared by hook issues, gate checks, and
/// constraints. Ordered least to most severe so escalate-only merges can
/// use `max`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl Severity {
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed set of content-quality hooks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    LanguageConsistency,
    OverlapDetection,
    DataClaimAlignment,
    SupplementaryCrossref,
}

impl HookKind {
    /// Returns all hook kinds.
    pub fn all() -> &'static [HookKind] {
        &[
            HookKind::LanguageConsistency,
            HookKind::OverlapDetection,
            HookKind::DataClaimAlignment,
            HookKind::SupplementaryCrossref,
        ]
    }

    /// Stable hook id used in persisted state and effectiveness counters.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::LanguageConsistency => "language-consistency",
            HookKind::OverlapDetection => "overlap-detection",
            HookKind::DataClaimAlignment => "data-claim-alignment",
            HookKind::SupplementaryCrossref => "supplementary-crossref",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HookKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "language-consistency" => Ok(HookKind::LanguageConsistency),
            "overlap-detection" => Ok(HookKind::OverlapDetection),
            "data-claim-alignment" => Ok(HookKind::DataClaimAlignment),
            "supplementary-crossref" => Ok(HookKind::SupplementaryCrossref),
            _ => anyhow::bail!(
                "Invalid hook '{}'. Valid values: language-consistency, overlap-detection, data-claim-alignment, supplementary-crossref",
                s
            ),
        }
    }
}

/// One categorized issue raised by a hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookIssue {
    pub hook_id: HookKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub message: String,
    /// Location hint (paragraph index, word, mention text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl HookIssue {
    pub fn new(hook_id: HookKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            hook_id,
            severity,
            section: None,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of one hook run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookResult {
    pub hook_id: HookKind,
    pub passed: bool,
    pub issues: Vec<HookIssue>,
    /// Hook-specific counters (occurrence counts, flagged pairs, ...).
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
}

impl HookResult {
    /// A passing result with no issues.
    pub fn pass(hook_id: HookKind) -> Self {
        Self {
            hook_id,
            passed: true,
            issues: Vec::new(),
            stats: BTreeMap::new(),
        }
    }

    /// Build a result from issues; passes iff there are none.
    pub fn from_issues(hook_id: HookKind, issues: Vec<HookIssue>) -> Self {
        Self {
            hook_id,
            passed: issues.is_empty(),
            issues,
            stats: BTreeMap::new(),
        }
    }

    pub fn with_stat(mut self, key: impl Into<String>, value: f64) -> Self {
        self.stats.insert(key.into(), value);
        self
    }

    /// True if any issue is CRITICAL.
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_critical())
    }
}

/// Input to a hook run: the content under check plus optional context.
#[derive(Debug, Clone, Default)]
pub struct HookInput {
    /// Primary text under check.
    pub text: String,
    /// Sibling text for cross-document hooks (methods text for the
    /// data-claim hook).
    pub sibling: Option<String>,
    /// Section name the text came from, if any.
    pub section: Option<String>,
    /// Project root, for hooks that consult sibling artifacts on disk.
    pub project_dir: Option<PathBuf>,
}

impl HookInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_sibling(mut self, sibling: impl Into<String>) -> Self {
        self.sibling = Some(sibling.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }
}

/// Preferred spelling style for the language-consistency hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpellingStyle {
    #[default]
    American,
    British,
}

/// Tunables for the hook engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Shingle size for overlap detection.
    pub min_ngram: usize,
    /// Shared-shingle count at which a paragraph pair is flagged.
    pub overlap_threshold: usize,
    /// Preferred spelling style; the other style is reported.
    pub preferred_spelling: SpellingStyle,
    /// Supplementary directory names scanned by the crossref hook,
    /// relative to the project root.
    pub supplementary_dirs: Vec<String>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            min_ngram: 6,
            overlap_threshold: 3,
            preferred_spelling: SpellingStyle::American,
            supplementary_dirs: vec!["supplementary".to_string(), "appendix".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_supports_escalation() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::Warning.max(Severity::Critical), Severity::Critical);
        assert_eq!(Severity::Warning.max(Severity::Info), Severity::Warning);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        let parsed: Severity = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(parsed, Severity::Warning);
    }

    #[test]
    fn test_hook_kind_from_str() {
        assert_eq!(
            "language-consistency".parse::<HookKind>().unwrap(),
            HookKind::LanguageConsistency
        );
        assert_eq!(
            "overlap_detection".parse::<HookKind>().unwrap(),
            HookKind::OverlapDetection
        );
        assert!("spellcheck".parse::<HookKind>().is_err());
    }

    #[test]
    fn test_hook_result_from_issues_sets_passed() {
        let clean = HookResult::from_issues(HookKind::OverlapDetection, vec![]);
        assert!(clean.passed);

        let issue = HookIssue::new(
            HookKind::OverlapDetection,
            Severity::Critical,
            "near-duplicate paragraphs",
        );
        let failed = HookResult::from_issues(HookKind::OverlapDetection, vec![issue]);
        assert!(!failed.passed);
        assert!(failed.has_critical());
    }

    #[test]
    fn test_hook_issue_builders() {
        let issue = HookIssue::new(HookKind::LanguageConsistency, Severity::Warning, "colour")
            .with_section("Methods")
            .with_location("colour")
            .with_suggestion("color");
        assert_eq!(issue.section.as_deref(), Some("Methods"));
        assert_eq!(issue.suggestion.as_deref(), Some("color"));
    }

    #[test]
    fn test_hook_result_serialization_roundtrip() {
        let result = HookResult::pass(HookKind::DataClaimAlignment).with_stat("tests_found", 3.0);
        let json = serde_json::to_string(&result).unwrap();
        let parsed: HookResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.hook_id, HookKind::DataClaimAlignment);
        assert_eq!(parsed.stats.get("tests_found"), Some(&3.0));
    }
}
