//! Phase gate validator: the pipeline state machine's accept/reject logic.
//!
//! `validate_phase` runs prerequisite checks first (all enumerated even
//! when one fails, so the caller can address every gap in one pass), then
//! phase-specific structural and content checks. Gate failures are data,
//! not errors: a `GateResult` with `passed = false`.
//!
//! Every validation appends one record to `gate-validations.jsonl`; the
//! validator itself never reads that log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

use crate::audit::AppendLog;
use crate::checkpoint::CheckpointManager;
use crate::config::ProjectConfig;
use crate::hooks::{self, HookConfig, HookInput, HookKind, Severity};
use crate::phase::Phase;

pub const GATE_LOG_FILE: &str = "gate-validations.jsonl";

/// Phase number used for the phase-independent structure check.
pub const STRUCTURE_PHASE: i64 = -1;

/// One named check inside a gate validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCheck {
    pub name: String,
    pub description: String,
    pub passed: bool,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GateCheck {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        passed: bool,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            passed,
            severity,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Immutable result of one validation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub phase: i64,
    pub phase_name: String,
    pub checks: Vec<GateCheck>,
    /// Passes iff no CRITICAL check failed.
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

impl GateResult {
    fn new(phase: i64, phase_name: impl Into<String>, checks: Vec<GateCheck>) -> Self {
        let passed = !checks
            .iter()
            .any(|c| !c.passed && c.severity == Severity::Critical);
        Self {
            phase,
            phase_name: phase_name.into(),
            checks,
            passed,
            timestamp: Utc::now(),
        }
    }

    /// Names of failed checks, most severe first.
    pub fn failed_checks(&self) -> Vec<&GateCheck> {
        let mut failed: Vec<&GateCheck> = self.checks.iter().filter(|c| !c.passed).collect();
        failed.sort_by(|a, b| b.severity.cmp(&a.severity));
        failed
    }
}

/// Record appended to the validation log, one per attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateLogRecord {
    pub phase: i64,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Review-loop state declared by the review phase tooling.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewState {
    pub completed_rounds: u32,
}

/// Per-phase status line inside `get_pipeline_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseStatus {
    pub phase: u32,
    pub phase_name: String,
    pub passed: bool,
    pub failed_checks: Vec<String>,
}

/// Full pipeline status, recomputed from artifact state on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatusReport {
    pub phases: Vec<PhaseStatus>,
    pub completion_percent: f64,
}

pub struct PhaseGateValidator {
    config: ProjectConfig,
    log: AppendLog,
}

impl PhaseGateValidator {
    pub fn new(config: ProjectConfig) -> Self {
        let log = AppendLog::new(config.audit_file(GATE_LOG_FILE));
        Self { config, log }
    }

    /// Validate a phase against current artifact state. Pure with respect
    /// to the artifacts: no caching, no dependence on prior calls.
    pub fn validate_phase(&self, phase: Phase) -> GateResult {
        let mut checks = Vec::new();

        if phase.number() > 1 {
            let prereqs = self.prerequisite_checks(phase);
            let prereqs_failed = prereqs
                .iter()
                .any(|c| !c.passed && c.severity == Severity::Critical);
            checks.extend(prereqs);
            // Prerequisite failure short-circuits the phase-specific work,
            // but every prerequisite stays enumerated in the result.
            if !prereqs_failed {
                checks.extend(self.phase_checks(phase));
            }
        } else {
            checks.extend(self.phase_checks(phase));
        }

        let result = GateResult::new(i64::from(phase.number()), phase.name(), checks);
        self.log_result(&result);
        result
    }

    /// Phase-independent base-directory skeleton check (phase -1).
    pub fn validate_project_structure(&self) -> GateResult {
        let checks = vec![
            self.path_check(
                "structure:manuscript/",
                "manuscript directory exists",
                self.config.manuscript_dir.is_dir(),
            ),
            self.path_check(
                "structure:references/",
                "references directory exists",
                self.config.references_dir.is_dir(),
            ),
            self.path_check(
                "structure:audit/",
                "audit directory exists",
                self.config.audit_dir.is_dir(),
            ),
            self.path_check(
                "structure:project.json",
                "project metadata document exists",
                self.config.project_file().is_file(),
            ),
        ];
        let result = GateResult::new(STRUCTURE_PHASE, "Project structure", checks);
        self.log_result(&result);
        result
    }

    /// Re-validate every declared phase. O(phases) by design: always
    /// consistent with current artifact state.
    pub fn get_pipeline_status(&self) -> PipelineStatusReport {
        let mut phases = Vec::new();
        let mut passed_count = 0usize;
        for phase in Phase::all() {
            let result = self.validate_phase(*phase);
            if result.passed {
                passed_count += 1;
            }
            phases.push(PhaseStatus {
                phase: phase.number(),
                phase_name: phase.name().to_string(),
                passed: result.passed,
                failed_checks: result
                    .failed_checks()
                    .iter()
                    .map(|c| c.name.clone())
                    .collect(),
            });
        }
        let completion_percent = 100.0 * passed_count as f64 / Phase::all().len() as f64;
        PipelineStatusReport {
            phases,
            completion_percent,
        }
    }

    fn log_result(&self, result: &GateResult) {
        debug!(phase = result.phase, passed = result.passed, "gate validated");
        // The log is observability, not state: a write failure must not
        // turn a validation verdict into an error.
        if let Err(e) = self.log.append(&GateLogRecord {
            phase: result.phase,
            passed: result.passed,
            timestamp: result.timestamp,
        }) {
            tracing::warn!(error = %e, "failed to append gate validation record");
        }
    }

    fn path_check(&self, name: &str, description: &str, passed: bool) -> GateCheck {
        GateCheck::new(name, description, passed, Severity::Critical)
    }

    fn prerequisite_checks(&self, phase: Phase) -> Vec<GateCheck> {
        let mut checks = vec![GateCheck::new(
            "prereq:project.json",
            "project metadata document present",
            self.config.project_file().is_file(),
            Severity::Critical,
        )];

        if phase.number() >= 5 {
            let count = self.config.reference_count();
            checks.push(
                GateCheck::new(
                    "prereq:references",
                    format!("at least {} reference files", self.config.min_references),
                    count >= self.config.min_references,
                    Severity::Critical,
                )
                .with_details(format!("{count} reference files found")),
            );
            checks.push(GateCheck::new(
                "prereq:concept.md",
                "concept document present",
                self.config.concept_file().is_file(),
                Severity::Critical,
            ));
        }

        if matches!(
            phase,
            Phase::ManuscriptReview
                | Phase::Revision
                | Phase::Supplementary
                | Phase::Formatting
                | Phase::SubmissionPackage
        ) {
            checks.push(GateCheck::new(
                "prereq:manuscript.md",
                "assembled manuscript document present",
                self.config.manuscript_file().is_file(),
                Severity::Critical,
            ));
        }

        checks
    }

    fn phase_checks(&self, phase: Phase) -> Vec<GateCheck> {
        match phase {
            Phase::Bootstrap => vec![self.path_check(
                "bootstrap:project_dir",
                "project directory exists",
                self.config.project_dir.is_dir(),
            )],
            Phase::ProjectDefinition => vec![self.path_check(
                "definition:project.json",
                "project metadata document present",
                self.config.project_file().is_file(),
            )],
            Phase::LiteratureSearch => vec![self.path_check(
                "literature:references/",
                "references directory exists",
                self.config.references_dir.is_dir(),
            )],
            Phase::ReferenceScreening => {
                let count = self.config.reference_count();
                vec![GateCheck::new(
                    "screening:references",
                    "screened reference set is non-empty",
                    count > 0,
                    Severity::Critical,
                )
                .with_details(format!("{count} reference files found"))]
            }
            Phase::ConceptDevelopment => {
                let concept_nonempty = fs::read_to_string(self.config.concept_file())
                    .map(|c| !c.trim().is_empty())
                    .unwrap_or(false);
                vec![GateCheck::new(
                    "concept:non_empty",
                    "concept document has content",
                    concept_nonempty,
                    Severity::Critical,
                )]
            }
            Phase::SectionDrafting => {
                let sections = self.config.section_names();
                vec![
                    self.path_check(
                        "drafting:outline.md",
                        "outline document present",
                        self.config.outline_file().is_file(),
                    ),
                    GateCheck::new(
                        "drafting:sections",
                        "at least one section drafted",
                        !sections.is_empty(),
                        Severity::Critical,
                    )
                    .with_details(format!("{} sections", sections.len())),
                ]
            }
            Phase::QualitySweep => self.section_completeness_checks(),
            Phase::ManuscriptReview => self.review_loop_checks(),
            Phase::Revision => {
                let state = CheckpointManager::new(self.config.clone());
                vec![GateCheck::new(
                    "revision:sections_approved",
                    "every tracked section approved",
                    state.all_sections_approved(),
                    Severity::Critical,
                )]
            }
            Phase::Supplementary => {
                // Every supplementary mention in the assembled manuscript
                // must resolve to a file.
                let manuscript =
                    fs::read_to_string(self.config.manuscript_file()).unwrap_or_default();
                let input = HookInput::text(manuscript)
                    .with_project_dir(self.config.project_dir.clone());
                let result = hooks::run_hook(
                    HookKind::SupplementaryCrossref,
                    &input,
                    &HookConfig::default(),
                );
                vec![GateCheck::new(
                    "supplementary:crossref",
                    "supplementary mentions resolve to files",
                    result.passed,
                    Severity::Critical,
                )
                .with_details(format!("{} unresolved mentions", result.issues.len()))]
            }
            Phase::Formatting | Phase::SubmissionPackage => vec![self.path_check(
                "manuscript:assembled",
                "assembled manuscript document present",
                self.config.manuscript_file().is_file(),
            )],
        }
    }

    /// Every tracked section must be present and non-empty.
    fn section_completeness_checks(&self) -> Vec<GateCheck> {
        let sections = self.config.section_names();
        if sections.is_empty() {
            return vec![GateCheck::new(
                "sweep:sections",
                "at least one section drafted",
                false,
                Severity::Critical,
            )];
        }
        sections
            .iter()
            .map(|section| {
                let non_empty = fs::read_to_string(self.config.section_file(section))
                    .map(|c| !c.trim().is_empty())
                    .unwrap_or(false);
                GateCheck::new(
                    format!("sweep:{section}"),
                    format!("section '{section}' has content"),
                    non_empty,
                    Severity::Critical,
                )
            })
            .collect()
    }

    /// Review-loop state, round artifacts, and per-round evidence must be
    /// jointly present and count-consistent; every incomplete round is its
    /// own CRITICAL failure.
    fn review_loop_checks(&self) -> Vec<GateCheck> {
        let state_file = self.config.review_state_file();
        let state: Option<ReviewState> = fs::read_to_string(&state_file)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok());

        let mut checks = vec![GateCheck::new(
            "review:state",
            "review-state document present and parseable",
            state.is_some(),
            Severity::Critical,
        )];

        let Some(state) = state else {
            return checks;
        };

        for round in 1..=state.completed_rounds {
            let round_dir = self.config.review_dir.join(format!("round-{round}"));
            let comments = round_dir.join("comments.md").is_file();
            let responses = round_dir.join("responses.md").is_file();
            let complete = round_dir.is_dir() && comments && responses;
            let mut missing = Vec::new();
            if !round_dir.is_dir() {
                missing.push("round directory");
            } else {
                if !comments {
                    missing.push("comments.md");
                }
                if !responses {
                    missing.push("responses.md");
                }
            }
            let mut check = GateCheck::new(
                format!("review:round-{round}"),
                format!("review round {round} evidence complete"),
                complete,
                Severity::Critical,
            );
            if !complete {
                check = check.with_details(format!("missing: {}", missing.join(", ")));
            }
            checks.push(check);
        }
        checks
    }
}
