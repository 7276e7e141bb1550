//! Integration tests for quillgate
//!
//! Exercises a full project lifecycle through the library plus CLI smoke
//! tests against the compiled binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use quillgate::checkpoint::CheckpointManager;
use quillgate::config::ProjectConfig;
use quillgate::evolution::{
    DomainConstraintEngine, EvolutionVerdict, EvolutionVerifier, HookEffectivenessTracker,
    MetaLearningEngine, PaperType, PendingEvolutionStore, QualityScorecard,
};
use quillgate::gates::PhaseGateValidator;
use quillgate::hooks::{run_post_manuscript_hooks, HookConfig, HookInput, HookKind};
use quillgate::phase::Phase;

/// Helper to create a quillgate Command
fn quillgate() -> Command {
    cargo_bin_cmd!("quillgate")
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

/// Populate a project far enough along to pass the early gates: metadata,
/// five references, a concept, an outline, and two drafted sections.
fn seed_drafted_project(dir: &TempDir) -> ProjectConfig {
    let config = ProjectConfig::new(dir.path());
    config.ensure_directories().unwrap();
    fs::write(
        config.project_file(),
        r#"{"title": "Sample study", "paper_type": "original-research"}"#,
    )
    .unwrap();
    for i in 0..5 {
        fs::write(
            config.references_dir.join(format!("ref-{i}.json")),
            "{}",
        )
        .unwrap();
    }
    fs::write(config.concept_file(), "# Concept\nA focused research question.").unwrap();
    fs::write(config.outline_file(), "# Outline\n- Methods\n- Results").unwrap();
    fs::write(
        config.section_file("Methods"),
        "# Methods\nWe performed a t-test in SPSS with p < 0.05.",
    )
    .unwrap();
    fs::write(
        config.section_file("Results"),
        "# Results\nThe t-test showed a difference (p < 0.05).",
    )
    .unwrap();
    config
}

// =============================================================================
// Full lifecycle through the library
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn test_gates_open_as_artifacts_appear() {
        let dir = create_temp_project();
        let config = ProjectConfig::new(dir.path());
        config.ensure_directories().unwrap();
        fs::write(config.project_file(), "{}").unwrap();
        let validator = PhaseGateValidator::new(config.clone());

        // Concept development is blocked until references and concept exist.
        let result = validator.validate_phase(Phase::ConceptDevelopment);
        assert!(!result.passed);

        for i in 0..5 {
            fs::write(config.references_dir.join(format!("ref-{i}.json")), "{}").unwrap();
        }
        fs::write(config.concept_file(), "A focused research question.").unwrap();

        // Same validator instance, fresh verdict: gates read only the disk.
        let result = validator.validate_phase(Phase::ConceptDevelopment);
        assert!(result.passed, "failed: {:?}", result.failed_checks());
    }

    #[test]
    fn test_pipeline_status_reflects_progress() {
        let dir = create_temp_project();
        let config = seed_drafted_project(&dir);
        let validator = PhaseGateValidator::new(config);

        let report = validator.get_pipeline_status();
        let drafting = report
            .phases
            .iter()
            .find(|p| p.phase == Phase::SectionDrafting.number())
            .unwrap();
        assert!(drafting.passed);
        let review = report
            .phases
            .iter()
            .find(|p| p.phase == Phase::ManuscriptReview.number())
            .unwrap();
        // No assembled manuscript or review state yet.
        assert!(!review.passed);
        assert!(report.completion_percent > 0.0);
        assert!(report.completion_percent < 100.0);
    }

    #[test]
    fn test_checkpoint_survives_crash_and_regression() {
        let dir = create_temp_project();
        let config = seed_drafted_project(&dir);

        {
            let mut manager = CheckpointManager::new(config.clone());
            manager
                .save_phase_completion(6, "Section drafting", None, vec![], None)
                .unwrap();
            manager.save_section_progress("Methods", 120, None).unwrap();
            manager.approve_section("Methods").unwrap();
            manager
                .save_phase_regression(7, 6, "reviewer found gaps", &["Methods".to_string()])
                .unwrap();
        }

        // A new manager (fresh process) sees the regression.
        let manager = CheckpointManager::new(config);
        assert_eq!(manager.state().current_phase, 6);
        assert_eq!(manager.state().last_completed_phase, 5);
        assert_eq!(manager.state().regression_count, 1);
        assert!(!manager.all_sections_approved());
        let summary = manager.get_recovery_summary();
        assert!(summary.contains("!! REGRESSION"));
        assert!(summary.contains("Methods"));
    }

    #[test]
    fn test_pause_detects_external_edits_on_resume() {
        let dir = create_temp_project();
        let config = seed_drafted_project(&dir);
        let mut manager = CheckpointManager::new(config.clone());

        manager.save_pause("waiting for coauthor").unwrap();
        fs::write(
            config.section_file("Results"),
            "# Results\nRewritten while paused.",
        )
        .unwrap();

        let report = manager.resume_from_pause().unwrap();
        assert!(report.changed);
        assert_eq!(report.changed_files, vec!["Results".to_string()]);
    }

    #[test]
    fn test_hooks_catch_and_then_clear_issues() {
        let dir = create_temp_project();
        let config = HookConfig::default();

        let flawed = "We randomised the cohort into two groups.\n\n\
                      The colour of each label was recorded separately.";
        let input = HookInput::text(flawed)
            .with_section("Methods")
            .with_project_dir(dir.path());
        let results = run_post_manuscript_hooks(&input, &config);
        let language = &results[&HookKind::LanguageConsistency];
        assert!(!language.passed);

        let fixed = "We randomized the cohort into two groups.\n\n\
                     The color of each label was recorded separately.";
        let input = HookInput::text(fixed)
            .with_section("Methods")
            .with_project_dir(dir.path());
        let results = run_post_manuscript_hooks(&input, &config);
        assert!(results.values().all(|r| r.passed));
    }

    #[test]
    fn test_evolution_loop_proposes_and_resolves() {
        let dir = create_temp_project();
        let config = seed_drafted_project(&dir);

        // Constraint engine learns a new rule.
        let engine = DomainConstraintEngine::new(&config, PaperType::OriginalResearch);
        let added = engine
            .evolve(
                "vocab-hedging",
                "Avoid excessive hedging",
                quillgate::evolution::ConstraintCategory::ForbiddenVocabulary,
                quillgate::hooks::Severity::Info,
                [(
                    "patterns".to_string(),
                    serde_json::json!(["(?i)\\bmight\\s+possibly\\b"]),
                )]
                .into_iter()
                .collect(),
                None,
                "seen across three drafts",
            )
            .unwrap();
        assert!(added);

        // A high fix rate drives a meta-learning proposal.
        let mut tracker = HookEffectivenessTracker::new(&config);
        for _ in 0..5 {
            tracker
                .record_trigger(HookKind::OverlapDetection, false)
                .unwrap();
            tracker.record_fix(HookKind::OverlapDetection).unwrap();
        }
        let meta = MetaLearningEngine::new(&config);
        let mut store = PendingEvolutionStore::new(&config);
        let summary = meta
            .analyze(&tracker, &QualityScorecard::default(), &mut store)
            .unwrap();
        assert_eq!(summary.proposed_items.len(), 1);

        // The proposal is resolved exactly once.
        let id = &summary.proposed_items[0];
        store.mark_applied(id, "reviewer").unwrap();
        assert!(store.mark_applied(id, "reviewer").is_err());
    }

    #[test]
    fn test_verifier_sees_accumulated_evidence() {
        let dir = create_temp_project();
        let config = seed_drafted_project(&dir);

        let mut scorecard = QualityScorecard::default();
        scorecard.set_score("clarity", 0.85);
        scorecard.save(&config).unwrap();
        MetaLearningEngine::new(&config)
            .record_lesson("results sections drift from methods")
            .unwrap();

        let report = EvolutionVerifier::verify(dir.path());
        assert_eq!(report.projects.len(), 1);
        // One project with no learned constraints cannot show full evolution.
        assert_ne!(report.verdict, EvolutionVerdict::Active);
    }
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_quillgate_help() {
        quillgate().arg("--help").assert().success();
    }

    #[test]
    fn test_quillgate_version() {
        quillgate().arg("--version").assert().success();
    }

    #[test]
    fn test_structure_fails_in_empty_dir() {
        let dir = create_temp_project();
        quillgate()
            .current_dir(dir.path())
            .arg("structure")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Gate failed"));
    }

    #[test]
    fn test_structure_passes_on_seeded_project() {
        let dir = create_temp_project();
        seed_drafted_project(&dir);
        quillgate()
            .current_dir(dir.path())
            .arg("structure")
            .assert()
            .success()
            .stdout(predicate::str::contains("Gate passed"));
    }

    #[test]
    fn test_validate_accepts_interim_sweep_number() {
        let dir = create_temp_project();
        seed_drafted_project(&dir);
        quillgate()
            .current_dir(dir.path())
            .args(["validate", "6.5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Interim quality sweep"));
    }

    #[test]
    fn test_validate_rejects_gap_number() {
        let dir = create_temp_project();
        quillgate()
            .current_dir(dir.path())
            .args(["validate", "4"])
            .assert()
            .failure();
    }

    #[test]
    fn test_recover_on_fresh_project() {
        let dir = create_temp_project();
        quillgate()
            .current_dir(dir.path())
            .arg("recover")
            .assert()
            .success()
            .stdout(predicate::str::contains("not started"));
    }

    #[test]
    fn test_status_lists_all_phases() {
        let dir = create_temp_project();
        quillgate()
            .current_dir(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("6.5"))
            .stdout(predicate::str::contains("Completion"));
    }

    #[test]
    fn test_hooks_flag_british_spelling() {
        let dir = create_temp_project();
        let file = dir.path().join("Methods.md");
        fs::write(&file, "We randomised the cohort.").unwrap();
        quillgate()
            .current_dir(dir.path())
            .args(["hooks", "Methods.md"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("language-consistency"));
    }

    #[test]
    fn test_evolution_list_empty() {
        let dir = create_temp_project();
        quillgate()
            .current_dir(dir.path())
            .args(["evolution", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No evolution items"));
    }

    #[test]
    fn test_evolution_verify_reports_verdict() {
        let dir = create_temp_project();
        quillgate()
            .current_dir(dir.path())
            .args(["evolution", "verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Verdict"));
    }
}
