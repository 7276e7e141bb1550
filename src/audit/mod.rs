//! Append-only log primitives.
//!
//! `AppendLog` writes one JSON record per line and exposes no rewrite
//! operation, so an interrupted write can corrupt at most the final record.
//! Both the gate-validation log and the evolution log are built on it.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// A line-oriented append-only log of JSON records.
pub struct AppendLog {
    path: PathBuf,
}

impl AppendLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one record. Creates the log (and its parent directory) on
    /// first use.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
        let mut line = serde_json::to_string(record).context("Failed to serialize log record")?;
        line.push('\n');

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open append log")?
            .write_all(line.as_bytes())
            .context("Failed to append log record")?;

        Ok(())
    }

    /// Read every parseable record. A missing log is an empty log; a
    /// truncated final line is skipped rather than failing the whole read.
    pub fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).context("Failed to read append log")?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// Number of records currently in the log.
    pub fn len(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read append log")?;
        Ok(content.lines().filter(|l| !l.trim().is_empty()).count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
