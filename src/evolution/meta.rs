//! Meta-learning engine: turns hook effectiveness and quality scores into
//! proposed rule refinements.
//!
//! Recommendations are only ever *proposed*, written through the pending
//! store; nothing here rewrites the active rule set in place. Each
//! analysis appends one summary to the meta-learning audit trail.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ProjectConfig;
use crate::hooks::HookKind;

use super::effectiveness::HookEffectivenessTracker;
use super::pending::PendingEvolutionStore;

pub const SCORECARD_FILE: &str = "quality-scorecard.json";
pub const META_AUDIT_FILE: &str = "meta-learning-audit.json";
pub const LESSONS_FILE: &str = "lessons.json";

/// Fix-rate at which a hook's threshold is considered too lax.
const FIX_RATE_ESCALATION: f64 = 0.8;
/// Minimum triggers before a fix-rate pattern is trusted.
const MIN_TRIGGERS: u64 = 5;
/// Average quality below which a silent hook suggests a coverage gap.
const LOW_QUALITY: f64 = 0.7;

/// Per-dimension quality scores for a project, on a 0..=1 scale.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityScorecard {
    pub scores: BTreeMap<String, f64>,
}

impl QualityScorecard {
    pub fn load(config: &ProjectConfig) -> Self {
        Self::load_from(&config.audit_file(SCORECARD_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, config: &ProjectConfig) -> Result<()> {
        fs::create_dir_all(&config.audit_dir).context("Failed to create audit directory")?;
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize scorecard")?;
        fs::write(config.audit_file(SCORECARD_FILE), json)
            .context("Failed to write scorecard")?;
        Ok(())
    }

    pub fn set_score(&mut self, dimension: &str, score: f64) {
        self.scores.insert(dimension.to_string(), score.clamp(0.0, 1.0));
    }

    /// Mean over all dimensions; `None` when nothing has been scored.
    pub fn average(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        Some(self.scores.values().sum::<f64>() / self.scores.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ThresholdAdjustment,
    CoverageGap,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::ThresholdAdjustment => "threshold_adjustment",
            RecommendationKind::CoverageGap => "coverage_gap",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub hook_id: HookKind,
    pub detail: String,
}

/// Result of one analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub analyzed_at: DateTime<Utc>,
    pub hooks_tracked: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_quality: Option<f64>,
    pub recommendations: Vec<Recommendation>,
    /// Ids of pending items created for the recommendations.
    pub proposed_items: Vec<String>,
}

/// One accumulated lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson: String,
    pub recorded_at: DateTime<Utc>,
}

pub struct MetaLearningEngine {
    audit_path: PathBuf,
    lessons_path: PathBuf,
}

impl MetaLearningEngine {
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            audit_path: config.audit_file(META_AUDIT_FILE),
            lessons_path: config.audit_file(LESSONS_FILE),
        }
    }

    /// Analyze counters and quality scores, propose refinements through
    /// the pending store, and append the summary to the audit trail.
    pub fn analyze(
        &self,
        tracker: &HookEffectivenessTracker,
        scorecard: &QualityScorecard,
        store: &mut PendingEvolutionStore,
    ) -> Result<AnalysisSummary> {
        let average_quality = scorecard.average();
        let mut recommendations = Vec::new();

        for (hook, counters) in tracker.counters() {
            if counters.triggered >= MIN_TRIGGERS {
                if let Some(rate) = counters.fix_rate() {
                    if rate >= FIX_RATE_ESCALATION {
                        recommendations.push(Recommendation {
                            kind: RecommendationKind::ThresholdAdjustment,
                            hook_id: *hook,
                            detail: format!(
                                "{hook} fixed {:.0}% of {} triggers; the threshold is catching real problems and can be tightened",
                                rate * 100.0,
                                counters.triggered
                            ),
                        });
                    }
                }
            }
        }

        if let Some(avg) = average_quality {
            if avg < LOW_QUALITY {
                for hook in HookKind::all() {
                    let counters = tracker.get(*hook);
                    if counters.triggered == 0 && counters.passed == 0 {
                        recommendations.push(Recommendation {
                            kind: RecommendationKind::CoverageGap,
                            hook_id: *hook,
                            detail: format!(
                                "average quality is {avg:.2} but {hook} has never run; a coverage gap is likely"
                            ),
                        });
                    }
                }
            }
        }

        let mut proposed_items = Vec::new();
        for recommendation in &recommendations {
            let id = store.add(
                recommendation.kind.as_str(),
                "meta-learning",
                serde_json::json!({
                    "hook": recommendation.hook_id,
                    "detail": recommendation.detail,
                }),
                None,
                false,
            )?;
            proposed_items.push(id);
        }

        let summary = AnalysisSummary {
            analyzed_at: Utc::now(),
            hooks_tracked: tracker.counters().len(),
            average_quality,
            recommendations,
            proposed_items,
        };
        self.append_audit(&summary)?;
        debug!(
            recommendations = summary.recommendations.len(),
            "meta-learning analysis complete"
        );
        Ok(summary)
    }

    fn append_audit(&self, summary: &AnalysisSummary) -> Result<()> {
        let mut trail: Vec<AnalysisSummary> = fs::read_to_string(&self.audit_path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default();
        trail.push(summary.clone());
        if let Some(parent) = self.audit_path.parent() {
            fs::create_dir_all(parent).context("Failed to create audit directory")?;
        }
        let json =
            serde_json::to_string_pretty(&trail).context("Failed to serialize audit trail")?;
        fs::write(&self.audit_path, json).context("Failed to write audit trail")?;
        Ok(())
    }

    /// The full analysis trail, oldest first.
    pub fn audit_trail(&self) -> Vec<AnalysisSummary> {
        fs::read_to_string(&self.audit_path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default()
    }

    /// Record a lesson learned for cross-project accumulation.
    pub fn record_lesson(&self, lesson: &str) -> Result<()> {
        let mut lessons: Vec<Lesson> = fs::read_to_string(&self.lessons_path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default();
        lessons.push(Lesson {
            lesson: lesson.to_string(),
            recorded_at: Utc::now(),
        });
        if let Some(parent) = self.lessons_path.parent() {
            fs::create_dir_all(parent).context("Failed to create audit directory")?;
        }
        let json = serde_json::to_string_pretty(&lessons).context("Failed to serialize lessons")?;
        fs::write(&self.lessons_path, json).context("Failed to write lessons")?;
        Ok(())
    }

    pub fn lessons(&self) -> Vec<Lesson> {
        fs::read_to_string(&self.lessons_path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scorecard_average() {
        let mut scorecard = QualityScorecard::default();
        assert_eq!(scorecard.average(), None);
        scorecard.set_score("clarity", 0.8);
        scorecard.set_score("rigor", 0.6);
        assert_eq!(scorecard.average(), Some(0.7));
    }

    #[test]
    fn test_scorecard_clamps_and_persists() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::new(dir.path());
        let mut scorecard = QualityScorecard::default();
        scorecard.set_score("clarity", 1.7);
        scorecard.save(&config).unwrap();

        let loaded = QualityScorecard::load(&config);
        assert_eq!(loaded.scores.get("clarity"), Some(&1.0));
    }

    #[test]
    fn test_high_fix_rate_proposes_threshold_adjustment() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::new(dir.path());
        let mut tracker = HookEffectivenessTracker::new(&config);
        for _ in 0..5 {
            tracker
                .record_trigger(HookKind::OverlapDetection, false)
                .unwrap();
        }
        for _ in 0..5 {
            tracker.record_fix(HookKind::OverlapDetection).unwrap();
        }

        let engine = MetaLearningEngine::new(&config);
        let mut store = PendingEvolutionStore::new(&config);
        let summary = engine
            .analyze(&tracker, &QualityScorecard::default(), &mut store)
            .unwrap();

        assert_eq!(summary.recommendations.len(), 1);
        assert_eq!(
            summary.recommendations[0].kind,
            RecommendationKind::ThresholdAdjustment
        );
        // The recommendation is proposed, never applied in place.
        assert_eq!(summary.proposed_items.len(), 1);
        assert!(store.is_pending(&summary.proposed_items[0]));
    }

    #[test]
    fn test_few_triggers_do_not_recommend() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::new(dir.path());
        let mut tracker = HookEffectivenessTracker::new(&config);
        tracker
            .record_trigger(HookKind::OverlapDetection, false)
            .unwrap();
        tracker.record_fix(HookKind::OverlapDetection).unwrap();

        let engine = MetaLearningEngine::new(&config);
        let mut store = PendingEvolutionStore::new(&config);
        let summary = engine
            .analyze(&tracker, &QualityScorecard::default(), &mut store)
            .unwrap();
        assert!(summary.recommendations.is_empty());
        assert!(store.get_pending().is_empty());
    }

    #[test]
    fn test_low_quality_with_silent_hooks_flags_coverage_gap() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::new(dir.path());
        let mut tracker = HookEffectivenessTracker::new(&config);
        tracker
            .record_trigger(HookKind::LanguageConsistency, true)
            .unwrap();
        let mut scorecard = QualityScorecard::default();
        scorecard.set_score("rigor", 0.4);

        let engine = MetaLearningEngine::new(&config);
        let mut store = PendingEvolutionStore::new(&config);
        let summary = engine.analyze(&tracker, &scorecard, &mut store).unwrap();

        let gaps: Vec<_> = summary
            .recommendations
            .iter()
            .filter(|r| r.kind == RecommendationKind::CoverageGap)
            .collect();
        // Every never-run hook is flagged; language-consistency ran.
        assert_eq!(gaps.len(), HookKind::all().len() - 1);
        assert!(gaps.iter().all(|r| r.hook_id != HookKind::LanguageConsistency));
    }

    #[test]
    fn test_analysis_trail_appends() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::new(dir.path());
        let tracker = HookEffectivenessTracker::new(&config);
        let engine = MetaLearningEngine::new(&config);
        let mut store = PendingEvolutionStore::new(&config);

        engine
            .analyze(&tracker, &QualityScorecard::default(), &mut store)
            .unwrap();
        engine
            .analyze(&tracker, &QualityScorecard::default(), &mut store)
            .unwrap();

        assert_eq!(engine.audit_trail().len(), 2);
    }

    #[test]
    fn test_lessons_accumulate() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::new(dir.path());
        let engine = MetaLearningEngine::new(&config);
        engine.record_lesson("overlap threshold 3 is too lax for reviews").unwrap();
        engine.record_lesson("British spelling slips in from quoted sources").unwrap();
        assert_eq!(engine.lessons().len(), 2);
    }
}
