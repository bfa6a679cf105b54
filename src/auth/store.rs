//! Flat-file user record store.
//!
//! The store only knows two operations: load every record, and replace every
//! record. Callers load, mutate their own copy, then save the whole sequence.
//! There is no index and no partial update; records are assumed to be few.
//!
//! File layout: a single JSON array of [`UserRecord`] objects, indented with
//! four spaces.

use super::record::UserRecord;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Full-replace persistence for user records.
pub trait RecordStore: Send + Sync {
    /// Every record in storage order. Missing backing data is created empty.
    fn load_all(&self) -> Result<Vec<UserRecord>>;

    /// Replace the backing data with `records`.
    fn save_all(&self, records: &[UserRecord]) -> Result<()>;
}

// ── JSON file ───────────────────────────────────────────────────────

/// `users.json` on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<UserRecord>> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "User store missing, initializing empty");
            self.save_all(&[])?;
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("corrupt user store {}", self.path.display()))
    }

    fn save_all(&self, records: &[UserRecord]) -> Result<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let body = to_json_4_spaces(records)?;

        // Write next to the target, then rename over it, so readers only
        // ever see the old or the new file.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn to_json_4_spaces(records: &[UserRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

// ── In-memory ───────────────────────────────────────────────────────

/// Process-local store, used by tests and embedders that manage their own
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.records.lock().clone())
    }

    fn save_all(&self, records: &[UserRecord]) -> Result<()> {
        *self.records.lock() = records.to_vec();
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
