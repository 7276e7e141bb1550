//! Per-hook effectiveness counters, accumulated across a project's runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::config::ProjectConfig;
use crate::hooks::HookKind;

pub const EFFECTIVENESS_FILE: &str = "hook-effectiveness.json";

/// Trigger/pass/fix counters for one hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HookCounters {
    /// Times the hook ran and raised at least one issue.
    pub triggered: u64,
    /// Times the hook ran clean.
    pub passed: u64,
    /// Times a raised issue was subsequently fixed.
    pub fixed: u64,
}

impl HookCounters {
    /// Fraction of triggers that led to a fix; `None` before any trigger.
    pub fn fix_rate(&self) -> Option<f64> {
        if self.triggered == 0 {
            None
        } else {
            Some(self.fixed as f64 / self.triggered as f64)
        }
    }
}

/// Accumulates hook counters within a project; persisted as one document.
pub struct HookEffectivenessTracker {
    path: PathBuf,
    counters: BTreeMap<HookKind, HookCounters>,
}

impl HookEffectivenessTracker {
    pub fn new(config: &ProjectConfig) -> Self {
        let path = config.audit_file(EFFECTIVENESS_FILE);
        let counters = Self::load(&path);
        Self { path, counters }
    }

    fn load(path: &PathBuf) -> BTreeMap<HookKind, HookCounters> {
        if !path.exists() {
            return BTreeMap::new();
        }
        match fs::read_to_string(path).map_err(anyhow::Error::from).and_then(|c| {
            serde_json::from_str(&c).map_err(anyhow::Error::from)
        }) {
            Ok(counters) => counters,
            Err(e) => {
                warn!(error = %e, "corrupt effectiveness document, starting from zero");
                BTreeMap::new()
            }
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create audit directory")?;
        }
        let json = serde_json::to_string_pretty(&self.counters)
            .context("Failed to serialize effectiveness counters")?;
        fs::write(&self.path, json).context("Failed to write effectiveness counters")?;
        Ok(())
    }

    /// Record one hook run: a clean run counts as passed, a run with
    /// issues as triggered.
    pub fn record_trigger(&mut self, hook: HookKind, passed: bool) -> Result<()> {
        let counters = self.counters.entry(hook).or_default();
        if passed {
            counters.passed += 1;
        } else {
            counters.triggered += 1;
        }
        self.save()
    }

    /// Record that a previously raised issue was fixed.
    pub fn record_fix(&mut self, hook: HookKind) -> Result<()> {
        self.counters.entry(hook).or_default().fixed += 1;
        self.save()
    }

    pub fn counters(&self) -> &BTreeMap<HookKind, HookCounters> {
        &self.counters
    }

    pub fn get(&self, hook: HookKind) -> HookCounters {
        self.counters.get(&hook).copied().unwrap_or_default()
    }
}
