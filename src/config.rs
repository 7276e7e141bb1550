//! Runtime configuration for a quillgate project workspace.
//!
//! `ProjectConfig` resolves every path the core reads or writes and carries
//! the tunables shared across subsystems. Everything lives under one project
//! directory; persisted core state lives under `.quillgate/`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Audit directory name under the project root.
pub const AUDIT_DIR_NAME: &str = ".quillgate";

/// Resolved paths and tunables for one project.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub project_dir: PathBuf,
    pub manuscript_dir: PathBuf,
    pub references_dir: PathBuf,
    pub review_dir: PathBuf,
    pub audit_dir: PathBuf,
    /// Directories scanned by the supplementary cross-reference hook,
    /// relative to the project root.
    pub supplementary_dirs: Vec<PathBuf>,
    /// Minimum reference-file count required from the concept phase onward.
    pub min_references: usize,
}

impl ProjectConfig {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        Self {
            manuscript_dir: project_dir.join("manuscript"),
            references_dir: project_dir.join("references"),
            review_dir: project_dir.join("review"),
            audit_dir: project_dir.join(AUDIT_DIR_NAME),
            supplementary_dirs: vec![
                project_dir.join("supplementary"),
                project_dir.join("appendix"),
            ],
            min_references: 5,
            project_dir,
        }
    }

    pub fn with_min_references(mut self, min_references: usize) -> Self {
        self.min_references = min_references;
        self
    }

    /// Path to the project metadata document.
    pub fn project_file(&self) -> PathBuf {
        self.project_dir.join("project.json")
    }

    /// Path to the concept document (phase-5 prerequisite).
    pub fn concept_file(&self) -> PathBuf {
        self.project_dir.join("concept.md")
    }

    /// Path to the outline (phase-6 structural artifact).
    pub fn outline_file(&self) -> PathBuf {
        self.project_dir.join("outline.md")
    }

    /// Path to the assembled manuscript draft (phase-7 prerequisite).
    pub fn manuscript_file(&self) -> PathBuf {
        self.project_dir.join("manuscript.md")
    }

    /// Path to the review-loop state document.
    pub fn review_state_file(&self) -> PathBuf {
        self.review_dir.join("review-state.json")
    }

    /// Path to a named section file under the manuscript tree.
    pub fn section_file(&self, section: &str) -> PathBuf {
        self.manuscript_dir.join(format!("{section}.md"))
    }

    /// Path to a persisted core document under the audit directory.
    pub fn audit_file(&self, name: &str) -> PathBuf {
        self.audit_dir.join(name)
    }

    /// Count reference files (any regular file under `references/`).
    pub fn reference_count(&self) -> usize {
        count_files(&self.references_dir)
    }

    /// Names of all tracked section files (file stems under `manuscript/`).
    pub fn section_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.manuscript_dir)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "md").unwrap_or(false))
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        names
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.audit_dir).context("Failed to create audit directory")?;
        std::fs::create_dir_all(&self.manuscript_dir)
            .context("Failed to create manuscript directory")?;
        std::fs::create_dir_all(&self.references_dir)
            .context("Failed to create references directory")?;
        Ok(())
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .count()
}
