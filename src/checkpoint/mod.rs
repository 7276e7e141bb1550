//! Checkpoint manager: the single mutable pipeline-state record.
//!
//! `CheckpointManager` owns `checkpoint.json` under the audit directory.
//! Every write is a whole-document rewrite, so external readers always see
//! a consistent snapshot; there is no partial-field mutation API. The
//! history list inside the document is append-only by convention: the
//! manager only ever pushes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::ProjectConfig;
use crate::errors::StateError;
use crate::hooks::types::HookIssue;

pub const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Top-level pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    NotStarted,
    InProgress,
    PhaseCompleted,
    Paused,
    Regression,
}

/// Per-section approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    RevisionRequested,
}

/// Progress record for one manuscript section. Created on first write,
/// mutated afterwards, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SectionProgress {
    pub word_count: usize,
    pub approval_status: ApprovalStatus,
    /// Monotonically increasing; bumped when a revision-requested section
    /// is rewritten.
    pub revision_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
}

/// Context of the most recent regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionContext {
    pub from_phase: u32,
    pub to_phase: u32,
    pub reason: String,
    pub sections_to_rewrite: Vec<String>,
    pub regressed_at: DateTime<Utc>,
}

/// Snapshot taken by `save_pause`: one content hash per section file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseState {
    pub reason: String,
    pub paused_at: DateTime<Utc>,
    pub content_hashes: BTreeMap<String, String>,
}

/// One entry in the append-only history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<u32>,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEvent {
    fn new(event: &str, phase: Option<u32>, detail: impl Into<String>) -> Self {
        Self {
            event: event.to_string(),
            phase,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The singleton pipeline-state record, one per project.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineState {
    pub status: PipelineStatus,
    /// Only increases, except through an explicit regression.
    pub last_completed_phase: i64,
    pub current_phase: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_section: Option<String>,
    /// Output summary per completed phase, keyed by phase number.
    #[serde(default)]
    pub phase_outputs: BTreeMap<u32, serde_json::Value>,
    #[serde(default)]
    pub flagged_issues: Vec<HookIssue>,
    #[serde(default)]
    pub section_progress: BTreeMap<String, SectionProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regression_context: Option<RegressionContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_state: Option<PauseState>,
    /// Total regressions over the project's life.
    #[serde(default)]
    pub regression_count: u32,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

/// Report from `resume_from_pause`: which section files changed while
/// paused. Resuming when not paused yields the empty report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResumeReport {
    pub changed: bool,
    pub changed_files: Vec<String>,
}

pub struct CheckpointManager {
    config: ProjectConfig,
    checkpoint_file: PathBuf,
    state: PipelineState,
}

impl CheckpointManager {
    /// Construct a manager and load any existing checkpoint. A missing or
    /// corrupt checkpoint degrades to the default (empty) state.
    pub fn new(config: ProjectConfig) -> Self {
        let checkpoint_file = config.audit_file(CHECKPOINT_FILE);
        let state = Self::load_state(&checkpoint_file);
        Self {
            config,
            checkpoint_file,
            state,
        }
    }

    fn load_state(path: &PathBuf) -> PipelineState {
        if !path.exists() {
            return PipelineState::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "corrupt checkpoint, starting from empty state");
                    PipelineState::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "unreadable checkpoint, starting from empty state");
                PipelineState::default()
            }
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Persist the full state record. Auto-creates the audit directory.
    fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.config.audit_dir)
            .context("Failed to create audit directory")?;
        let json = serde_json::to_string_pretty(&self.state)
            .context("Failed to serialize pipeline state")?;
        fs::write(&self.checkpoint_file, json).context("Failed to write checkpoint")?;
        Ok(())
    }

    /// Record the start of a phase.
    pub fn save_phase_start(
        &mut self,
        phase: u32,
        name: &str,
        section: Option<&str>,
    ) -> Result<()> {
        self.state.status = PipelineStatus::InProgress;
        self.state.current_phase = phase;
        self.state.current_section = section.map(|s| s.to_string());
        self.state.history.push(HistoryEvent::new(
            "phase_started",
            Some(phase),
            format!("{name} started"),
        ));
        debug!(phase, name, "phase started");
        self.save()
    }

    /// Record the completion of a phase, its outputs, and any flagged
    /// issues.
    pub fn save_phase_completion(
        &mut self,
        phase: u32,
        name: &str,
        outputs: Option<serde_json::Value>,
        issues: Vec<HookIssue>,
        stats: Option<BTreeMap<String, f64>>,
    ) -> Result<()> {
        self.state.status = PipelineStatus::PhaseCompleted;
        // Monotonic outside an explicit regression: re-running an earlier
        // phase must not roll the high-water mark back.
        self.state.last_completed_phase =
            self.state.last_completed_phase.max(i64::from(phase));
        self.state.current_phase = phase;
        if let Some(outputs) = outputs {
            self.state.phase_outputs.insert(phase, outputs);
        }
        let issue_count = issues.len();
        self.state.flagged_issues.extend(issues);

        let detail = match stats {
            Some(stats) => format!(
                "{name} completed ({issue_count} issues, stats: {})",
                serde_json::to_string(&stats).unwrap_or_default()
            ),
            None => format!("{name} completed ({issue_count} issues)"),
        };
        self.state
            .history
            .push(HistoryEvent::new("phase_completed", Some(phase), detail));
        debug!(phase, name, issue_count, "phase completed");
        self.save()
    }

    /// Controlled transition backward. Resets approval on every named
    /// section and sets `last_completed_phase` to just before the target.
    pub fn save_phase_regression(
        &mut self,
        from: u32,
        to: u32,
        reason: &str,
        sections: &[String],
    ) -> Result<(), StateError> {
        if sections.is_empty() {
            return Err(StateError::RegressionWithoutSections { from, to });
        }
        if to >= from {
            return Err(StateError::InvalidRegression { from, to });
        }

        self.state.status = PipelineStatus::Regression;
        self.state.current_phase = to;
        self.state.last_completed_phase = i64::from(to) - 1;
        self.state.regression_count += 1;
        for section in sections {
            if let Some(progress) = self.state.section_progress.get_mut(section) {
                progress.approval_status = ApprovalStatus::Pending;
            }
        }
        self.state.regression_context = Some(RegressionContext {
            from_phase: from,
            to_phase: to,
            reason: reason.to_string(),
            sections_to_rewrite: sections.to_vec(),
            regressed_at: Utc::now(),
        });
        self.state.history.push(HistoryEvent::new(
            "phase_regression",
            Some(to),
            format!("regressed from phase {from} to {to}: {reason}"),
        ));
        warn!(from, to, reason, "pipeline regression");
        self.save().map_err(StateError::Other)?;
        Ok(())
    }

    /// Pause the pipeline, snapshotting a content hash per section file so
    /// external edits are detectable on resume.
    pub fn save_pause(&mut self, reason: &str) -> Result<()> {
        let content_hashes = self.hash_sections();
        self.state.status = PipelineStatus::Paused;
        self.state.pause_state = Some(PauseState {
            reason: reason.to_string(),
            paused_at: Utc::now(),
            content_hashes,
        });
        self.state.history.push(HistoryEvent::new(
            "paused",
            None,
            format!("paused: {reason}"),
        ));
        self.save()
    }

    /// Resume from pause, reporting section files changed while paused.
    /// Resuming when not paused is a no-op returning the empty report.
    pub fn resume_from_pause(&mut self) -> Result<ResumeReport> {
        let Some(pause) = self.state.pause_state.take() else {
            return Ok(ResumeReport::default());
        };

        let current = self.hash_sections();
        let mut changed_files: Vec<String> = Vec::new();
        for (section, hash) in &current {
            if pause.content_hashes.get(section) != Some(hash) {
                changed_files.push(section.clone());
            }
        }
        for section in pause.content_hashes.keys() {
            if !current.contains_key(section) {
                changed_files.push(section.clone());
            }
        }
        changed_files.sort();

        self.state.status = PipelineStatus::InProgress;
        self.state.history.push(HistoryEvent::new(
            "resumed",
            None,
            format!("resumed ({} files changed while paused)", changed_files.len()),
        ));
        self.save()?;

        Ok(ResumeReport {
            changed: !changed_files.is_empty(),
            changed_files,
        })
    }

    fn hash_sections(&self) -> BTreeMap<String, String> {
        let mut hashes = BTreeMap::new();
        for section in self.config.section_names() {
            let path = self.config.section_file(&section);
            if let Ok(content) = fs::read(&path) {
                let mut hasher = Sha256::new();
                hasher.update(&content);
                hashes.insert(section, format!("{:x}", hasher.finalize()));
            }
        }
        hashes
    }

    /// Record a write to a section. Creates the progress record on first
    /// write; a rewrite of a revision-requested section bumps
    /// `revision_count` and resets approval to pending.
    pub fn save_section_progress(
        &mut self,
        section: &str,
        word_count: usize,
        feedback: Option<&str>,
    ) -> Result<()> {
        let progress = self
            .state
            .section_progress
            .entry(section.to_string())
            .or_default();
        progress.word_count = word_count;
        if progress.approval_status == ApprovalStatus::RevisionRequested {
            progress.revision_count += 1;
            progress.approval_status = ApprovalStatus::Pending;
        }
        if let Some(feedback) = feedback {
            progress.user_feedback = Some(feedback.to_string());
        }
        self.state.current_section = Some(section.to_string());
        self.state.history.push(HistoryEvent::new(
            "section_written",
            None,
            format!("{section}: {word_count} words"),
        ));
        self.save()
    }

    pub fn approve_section(&mut self, section: &str) -> Result<(), StateError> {
        let progress = self
            .state
            .section_progress
            .get_mut(section)
            .ok_or_else(|| StateError::UnknownSection(section.to_string()))?;
        progress.approval_status = ApprovalStatus::Approved;
        self.state.history.push(HistoryEvent::new(
            "section_approved",
            None,
            section.to_string(),
        ));
        self.save().map_err(StateError::Other)?;
        Ok(())
    }

    pub fn request_revision(&mut self, section: &str, feedback: &str) -> Result<(), StateError> {
        let progress = self
            .state
            .section_progress
            .get_mut(section)
            .ok_or_else(|| StateError::UnknownSection(section.to_string()))?;
        progress.approval_status = ApprovalStatus::RevisionRequested;
        progress.user_feedback = Some(feedback.to_string());
        self.state.history.push(HistoryEvent::new(
            "revision_requested",
            None,
            format!("{section}: {feedback}"),
        ));
        self.save().map_err(StateError::Other)?;
        Ok(())
    }

    /// False on an empty section set: "no sections" is not "all approved".
    pub fn all_sections_approved(&self) -> bool {
        !self.state.section_progress.is_empty()
            && self
                .state
                .section_progress
                .values()
                .all(|p| p.approval_status == ApprovalStatus::Approved)
    }

    /// Render the full state as human-readable text for hand-off to the
    /// writing agent after a crash or pause.
    pub fn get_recovery_summary(&self) -> String {
        let state = &self.state;
        let mut out = String::new();
        out.push_str(&format!(
            "Pipeline status: {}\n",
            match state.status {
                PipelineStatus::NotStarted => "not started",
                PipelineStatus::InProgress => "in progress",
                PipelineStatus::PhaseCompleted => "phase completed",
                PipelineStatus::Paused => "paused",
                PipelineStatus::Regression => "regression",
            }
        ));
        out.push_str(&format!(
            "Current phase: {} (last completed: {})\n",
            state.current_phase, state.last_completed_phase
        ));
        if let Some(section) = &state.current_section {
            out.push_str(&format!("Current section: {section}\n"));
        }

        if let Some(regression) = &state.regression_context {
            out.push_str(&format!(
                "\n!! REGRESSION: phase {} -> {} ({})\n   Sections to rewrite: {}\n",
                regression.from_phase,
                regression.to_phase,
                regression.reason,
                regression.sections_to_rewrite.join(", ")
            ));
        }
        if let Some(pause) = &state.pause_state {
            out.push_str(&format!(
                "\n|| PAUSED at {}: {}\n",
                pause.paused_at.to_rfc3339(),
                pause.reason
            ));
        }

        if !state.section_progress.is_empty() {
            out.push_str("\nSections:\n");
            for (name, progress) in &state.section_progress {
                let status = match progress.approval_status {
                    ApprovalStatus::Pending => "pending",
                    ApprovalStatus::Approved => "approved",
                    ApprovalStatus::RevisionRequested => "revision requested",
                };
                out.push_str(&format!(
                    "  {name}: {status} ({} words, {} revisions)\n",
                    progress.word_count, progress.revision_count
                ));
            }
        }

        if !state.flagged_issues.is_empty() {
            out.push_str(&format!(
                "\nFlagged issues: {}\n",
                state.flagged_issues.len()
            ));
        }
        out
    }
}
