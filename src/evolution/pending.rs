//! Pending-evolution store: proposed refinements awaiting a human verdict.
//!
//! Items are created by the meta-learning engine and consumed exactly once
//! by `mark_applied`/`mark_dismissed`. Resolution is idempotent in the
//! failure direction: a second resolution of the same item is a typed
//! failure that leaves the record unchanged. The store is durable across
//! process restarts.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::config::ProjectConfig;
use crate::errors::EvolutionError;

pub const PENDING_EVOLUTIONS_FILE: &str = "pending-evolutions.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStatus {
    #[default]
    Pending,
    Applied,
    Dismissed,
}

impl EvolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvolutionStatus::Pending => "pending",
            EvolutionStatus::Applied => "applied",
            EvolutionStatus::Dismissed => "dismissed",
        }
    }
}

/// A proposed refinement to the rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionItem {
    /// Auto-incrementing `PE-%04d` id.
    pub id: String,
    pub item_type: String,
    pub source: String,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub status: EvolutionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PendingDoc {
    counter: u64,
    items: Vec<EvolutionItem>,
}

pub struct PendingEvolutionStore {
    path: PathBuf,
    doc: PendingDoc,
}

impl PendingEvolutionStore {
    pub fn new(config: &ProjectConfig) -> Self {
        let path = config.audit_file(PENDING_EVOLUTIONS_FILE);
        let doc = Self::load(&path);
        Self { path, doc }
    }

    fn load(path: &PathBuf) -> PendingDoc {
        if !path.exists() {
            return PendingDoc::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "corrupt pending-evolutions document, starting empty");
                PendingDoc::default()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable pending-evolutions document, starting empty");
                PendingDoc::default()
            }
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create audit directory")?;
        }
        let json = serde_json::to_string_pretty(&self.doc)
            .context("Failed to serialize pending evolutions")?;
        fs::write(&self.path, json).context("Failed to write pending evolutions")?;
        Ok(())
    }

    /// Add a proposed item, assigning the next `PE-%04d` id.
    pub fn add(
        &mut self,
        item_type: &str,
        source: &str,
        payload: serde_json::Value,
        project: Option<&str>,
        auto_apply: bool,
    ) -> Result<String> {
        self.doc.counter += 1;
        let id = format!("PE-{:04}", self.doc.counter);
        self.doc.items.push(EvolutionItem {
            id: id.clone(),
            item_type: item_type.to_string(),
            source: source.to_string(),
            payload,
            project: project.map(|p| p.to_string()),
            auto_apply,
            status: EvolutionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        });
        self.save()?;
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&EvolutionItem> {
        self.doc.items.iter().find(|i| i.id == id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.get(id)
            .map(|i| i.status == EvolutionStatus::Pending)
            .unwrap_or(false)
    }

    pub fn get_pending(&self) -> Vec<&EvolutionItem> {
        self.doc
            .items
            .iter()
            .filter(|i| i.status == EvolutionStatus::Pending)
            .collect()
    }

    pub fn all_items(&self) -> &[EvolutionItem] {
        &self.doc.items
    }

    /// Pending items older than `max_age`. Read-only: staleness never
    /// mutates an item.
    pub fn get_stale(&self, max_age: Duration) -> Vec<&EvolutionItem> {
        let cutoff = Utc::now() - max_age;
        self.doc
            .items
            .iter()
            .filter(|i| i.status == EvolutionStatus::Pending && i.created_at < cutoff)
            .collect()
    }

    pub fn mark_applied(&mut self, id: &str, actor: &str) -> Result<(), EvolutionError> {
        self.resolve(id, actor, EvolutionStatus::Applied)
    }

    pub fn mark_dismissed(&mut self, id: &str, actor: &str) -> Result<(), EvolutionError> {
        self.resolve(id, actor, EvolutionStatus::Dismissed)
    }

    fn resolve(
        &mut self,
        id: &str,
        actor: &str,
        status: EvolutionStatus,
    ) -> Result<(), EvolutionError> {
        let item = self
            .doc
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| EvolutionError::ItemNotFound { id: id.to_string() })?;
        if item.status != EvolutionStatus::Pending {
            return Err(EvolutionError::AlreadyResolved {
                id: id.to_string(),
                status: item.status.as_str().to_string(),
            });
        }
        item.status = status;
        item.resolved_at = Some(Utc::now());
        item.resolved_by = Some(actor.to_string());
        self.save().map_err(EvolutionError::Other)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_store(dir: &tempfile::TempDir) -> PendingEvolutionStore {
        PendingEvolutionStore::new(&ProjectConfig::new(dir.path()))
    }

    #[test]
    fn test_ids_auto_increment() {
        let dir = tempdir().unwrap();
        let mut store = make_store(&dir);
        let a = store
            .add("threshold_adjustment", "meta-learning", serde_json::json!({}), None, false)
            .unwrap();
        let b = store
            .add("coverage_gap", "meta-learning", serde_json::json!({}), None, false)
            .unwrap();
        assert_eq!(a, "PE-0001");
        assert_eq!(b, "PE-0002");
        assert_eq!(store.get_pending().len(), 2);
    }

    #[test]
    fn test_durable_across_restarts() {
        let dir = tempdir().unwrap();
        {
            let mut store = make_store(&dir);
            store
                .add("threshold_adjustment", "meta-learning", serde_json::json!({"hook": "overlap-detection"}), Some("proj-a"), false)
                .unwrap();
        }
        let mut store = make_store(&dir);
        assert!(store.exists("PE-0001"));
        assert!(store.is_pending("PE-0001"));
        // Counter survives too: the next id does not collide.
        let next = store
            .add("coverage_gap", "meta-learning", serde_json::json!({}), None, false)
            .unwrap();
        assert_eq!(next, "PE-0002");
    }

    #[test]
    fn test_mark_applied_consumes_exactly_once() {
        let dir = tempdir().unwrap();
        let mut store = make_store(&dir);
        let id = store
            .add("threshold_adjustment", "meta-learning", serde_json::json!({}), None, false)
            .unwrap();

        store.mark_applied(&id, "reviewer").unwrap();
        let item = store.get(&id).unwrap();
        assert_eq!(item.status, EvolutionStatus::Applied);
        assert_eq!(item.resolved_by.as_deref(), Some("reviewer"));
        assert!(item.resolved_at.is_some());

        // Second resolution fails and leaves the record unchanged.
        let first_resolved_at = item.resolved_at;
        let err = store.mark_dismissed(&id, "someone-else").unwrap_err();
        assert!(matches!(err, EvolutionError::AlreadyResolved { .. }));
        let item = store.get(&id).unwrap();
        assert_eq!(item.status, EvolutionStatus::Applied);
        assert_eq!(item.resolved_by.as_deref(), Some("reviewer"));
        assert_eq!(item.resolved_at, first_resolved_at);
    }

    #[test]
    fn test_mark_dismissed_then_applied_fails() {
        let dir = tempdir().unwrap();
        let mut store = make_store(&dir);
        let id = store
            .add("coverage_gap", "meta-learning", serde_json::json!({}), None, false)
            .unwrap();
        store.mark_dismissed(&id, "reviewer").unwrap();
        let err = store.mark_applied(&id, "reviewer").unwrap_err();
        assert!(matches!(
            err,
            EvolutionError::AlreadyResolved { ref status, .. } if status == "dismissed"
        ));
    }

    #[test]
    fn test_unknown_id_is_typed_failure() {
        let dir = tempdir().unwrap();
        let mut store = make_store(&dir);
        let err = store.mark_applied("PE-9999", "reviewer").unwrap_err();
        assert!(matches!(err, EvolutionError::ItemNotFound { .. }));
        assert!(!store.exists("PE-9999"));
        assert!(!store.is_pending("PE-9999"));
    }

    #[test]
    fn test_get_stale_is_read_only() {
        let dir = tempdir().unwrap();
        let mut store = make_store(&dir);
        let id = store
            .add("threshold_adjustment", "meta-learning", serde_json::json!({}), None, false)
            .unwrap();

        // Fresh items are not stale.
        assert!(store.get_stale(Duration::days(30)).is_empty());
        // With a zero age threshold the item qualifies, but stays pending.
        assert_eq!(store.get_stale(Duration::zero()).len(), 1);
        assert!(store.is_pending(&id));
    }
}
