//! Domain constraints: base templates plus learned refinements.
//!
//! Base constraints are immutable per-paper-type templates embedded at
//! compile time. Learned constraints are appended over a project's life
//! and merged with an escalate-only rule: a learned entry with the same id
//! as a base constraint may raise its severity, never lower it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::audit::AppendLog;
use crate::config::ProjectConfig;
use crate::errors::EvolutionError;
use crate::hooks::{HookKind, Severity};

pub const LEARNED_CONSTRAINTS_FILE: &str = "learned-constraints.json";
pub const EVOLUTION_LOG_FILE: &str = "evolution-log.jsonl";

/// Supported paper types. Closed enum: unknown types are an explicit
/// error, never a silent empty constraint list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperType {
    OriginalResearch,
    CaseReport,
    SystematicReview,
    NarrativeReview,
}

impl PaperType {
    pub fn all() -> &'static [PaperType] {
        &[
            PaperType::OriginalResearch,
            PaperType::CaseReport,
            PaperType::SystematicReview,
            PaperType::NarrativeReview,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperType::OriginalResearch => "original-research",
            PaperType::CaseReport => "case-report",
            PaperType::SystematicReview => "systematic-review",
            PaperType::NarrativeReview => "narrative-review",
        }
    }

    fn template_yaml(&self) -> &'static str {
        match self {
            PaperType::OriginalResearch => include_str!("templates/original-research.yaml"),
            PaperType::CaseReport => include_str!("templates/case-report.yaml"),
            PaperType::SystematicReview => include_str!("templates/systematic-review.yaml"),
            PaperType::NarrativeReview => include_str!("templates/narrative-review.yaml"),
        }
    }
}

impl fmt::Display for PaperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaperType {
    type Err = EvolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaperType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s.to_lowercase().replace('_', "-"))
            .ok_or_else(|| EvolutionError::UnknownPaperType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintCategory {
    WordCount,
    RequiredSection,
    ForbiddenVocabulary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Base,
    Learned,
}

/// A persisted rule consulted by the domain-constraint validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub category: ConstraintCategory,
    pub rule: String,
    pub severity: Severity,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hook: Option<HookKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_at: Option<DateTime<Utc>>,
}

impl Constraint {
    fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(|v| v.as_u64())
    }
}

#[derive(Debug, Deserialize)]
struct Template {
    #[allow(dead_code)]
    paper_type: String,
    constraints: Vec<Constraint>,
}

/// One constraint violation found in content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub constraint_id: String,
    pub severity: Severity,
    pub provenance: Provenance,
    pub message: String,
}

/// Result of a constraint validation pass. Constraint counts are always
/// reported for transparency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintReport {
    pub total_constraints: usize,
    pub base_constraints: usize,
    pub learned_constraints: usize,
    pub violations: Vec<ConstraintViolation>,
}

impl ConstraintReport {
    pub fn passed(&self) -> bool {
        !self
            .violations
            .iter()
            .any(|v| v.severity == Severity::Critical)
    }
}

/// Record appended to `evolution-log.jsonl` by every `evolve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionLogRecord {
    pub constraint_id: String,
    pub category: ConstraintCategory,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hook: Option<HookKind>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

pub struct DomainConstraintEngine {
    paper_type: PaperType,
    base: Vec<Constraint>,
    learned_file: PathBuf,
    log: AppendLog,
}

impl DomainConstraintEngine {
    pub fn new(config: &ProjectConfig, paper_type: PaperType) -> Self {
        let template: Template = serde_yaml::from_str(paper_type.template_yaml())
            .expect("embedded constraint template parses");
        Self {
            paper_type,
            base: template.constraints,
            learned_file: config.audit_file(LEARNED_CONSTRAINTS_FILE),
            log: AppendLog::new(config.audit_file(EVOLUTION_LOG_FILE)),
        }
    }

    pub fn paper_type(&self) -> PaperType {
        self.paper_type
    }

    /// Learned constraints on disk. Corrupt or unreadable documents
    /// degrade to the empty list, never an error.
    fn load_learned(&self) -> Vec<Constraint> {
        if !self.learned_file.exists() {
            return Vec::new();
        }
        match fs::read_to_string(&self.learned_file) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(learned) => learned,
                Err(e) => {
                    warn!(error = %e, "corrupt learned-constraints document, using base only");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "unreadable learned-constraints document, using base only");
                Vec::new()
            }
        }
    }

    /// Base template left-merged with learned constraints by id. A learned
    /// entry sharing a base id can only escalate its severity.
    pub fn get_active_constraints(&self) -> Vec<Constraint> {
        let mut active = self.base.clone();
        for learned in self.load_learned() {
            if let Some(existing) = active.iter_mut().find(|c| c.id == learned.id) {
                existing.severity = existing.severity.max(learned.severity);
            } else {
                active.push(learned);
            }
        }
        active
    }

    /// Evaluate every active constraint against content. `section` scopes
    /// word-count constraints to the section being validated.
    pub fn validate_against_constraints(&self, content: &str, section: &str) -> ConstraintReport {
        let active = self.get_active_constraints();
        let base_constraints = active
            .iter()
            .filter(|c| c.provenance == Provenance::Base)
            .count();
        let learned_constraints = active.len() - base_constraints;

        let mut violations = Vec::new();
        for constraint in &active {
            if let Some(violation) = evaluate(constraint, content, section) {
                violations.push(violation);
            }
        }

        ConstraintReport {
            total_constraints: active.len(),
            base_constraints,
            learned_constraints,
            violations,
        }
    }

    /// Append a learned constraint. No-op returning `Ok(false)` if the id
    /// already exists (base or learned); every successful call appends one
    /// record to the evolution log.
    #[allow(clippy::too_many_arguments)]
    pub fn evolve(
        &self,
        id: &str,
        rule: &str,
        category: ConstraintCategory,
        severity: Severity,
        params: BTreeMap<String, serde_json::Value>,
        source_hook: Option<HookKind>,
        reason: &str,
    ) -> Result<bool> {
        let learned = self.load_learned();
        if learned.iter().any(|c| c.id == id) || self.base.iter().any(|c| c.id == id) {
            return Ok(false);
        }

        let constraint = Constraint {
            id: id.to_string(),
            category,
            rule: rule.to_string(),
            severity,
            provenance: Provenance::Learned,
            params,
            source_hook,
            reason: Some(reason.to_string()),
            learned_at: Some(Utc::now()),
        };

        let mut updated = learned;
        updated.push(constraint);
        if let Some(parent) = self.learned_file.parent() {
            fs::create_dir_all(parent).context("Failed to create audit directory")?;
        }
        let json = serde_json::to_string_pretty(&updated)
            .context("Failed to serialize learned constraints")?;
        fs::write(&self.learned_file, json).context("Failed to write learned constraints")?;

        self.log.append(&EvolutionLogRecord {
            constraint_id: id.to_string(),
            category,
            rule: rule.to_string(),
            source_hook,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        })?;
        Ok(true)
    }

    /// Replay the evolution-event log.
    pub fn get_evolution_history(&self) -> Result<Vec<EvolutionLogRecord>> {
        self.log.read_all()
    }
}

fn evaluate(constraint: &Constraint, content: &str, section: &str) -> Option<ConstraintViolation> {
    let message = match constraint.category {
        ConstraintCategory::WordCount => {
            // Scoped to one section; other sections are not this
            // constraint's business.
            if let Some(target) = constraint.param_str("section") {
                if !target.eq_ignore_ascii_case(section) {
                    return None;
                }
            }
            let words = content.split_whitespace().count() as u64;
            let min = constraint.param_u64("min_words");
            let max = constraint.param_u64("max_words");
            match (min, max) {
                (Some(min), _) if words < min => {
                    format!("{section} has {words} words, below the minimum of {min}")
                }
                (_, Some(max)) if words > max => {
                    format!("{section} has {words} words, above the maximum of {max}")
                }
                _ => return None,
            }
        }
        ConstraintCategory::RequiredSection => {
            let required = constraint.param_str("section")?;
            let present = content.lines().any(|line| {
                let trimmed = line.trim_start();
                trimmed.starts_with('#')
                    && trimmed
                        .trim_start_matches('#')
                        .trim()
                        .eq_ignore_ascii_case(required)
            }) || required.eq_ignore_ascii_case(section);
            if present {
                return None;
            }
            format!("required section '{required}' is missing")
        }
        ConstraintCategory::ForbiddenVocabulary => {
            let patterns = constraint.params.get("patterns")?.as_array()?;
            let mut matched = None;
            for pattern in patterns.iter().filter_map(|p| p.as_str()) {
                match regex::Regex::new(pattern) {
                    Ok(re) => {
                        if let Some(found) = re.find(content) {
                            matched = Some(found.as_str().to_string());
                            break;
                        }
                    }
                    Err(e) => warn!(pattern, error = %e, "invalid forbidden-vocabulary pattern"),
                }
            }
            let found = matched?;
            format!("forbidden vocabulary '{found}' ({})", constraint.rule)
        }
    };

    Some(ConstraintViolation {
        constraint_id: constraint.id.clone(),
        severity: constraint.severity,
        provenance: constraint.provenance,
        message,
    })
}
