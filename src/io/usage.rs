use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::io::line_store::{StoreError, atomic_write};

/// How often each review action has been used, keyed by action label
/// (`"1h"`, `"Mon"`, `"done"`, ...). Insertion order is first use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageCounts {
    counts: IndexMap<String, u64>,
}

impl UsageCounts {
    pub fn increment(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Most used first; ties keep first-use order.
    pub fn by_frequency(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> =
            self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

/// Explicit load/save persistence for usage counters.
pub trait CounterStore {
    /// Missing or unreadable storage yields empty counts.
    fn load(&self) -> UsageCounts;
    fn save(&self, counts: &UsageCounts) -> Result<(), StoreError>;
}

/// Counters kept as pretty JSON in one file.
#[derive(Debug, Clone)]
pub struct JsonCounterStore {
    path: PathBuf,
}

impl JsonCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonCounterStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for JsonCounterStore {
    fn load(&self) -> UsageCounts {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return UsageCounts::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring malformed {}: {}", self.path.display(), e);
            UsageCounts::default()
        })
    }

    fn save(&self, counts: &UsageCounts) -> Result<(), StoreError> {
        let write_err = |e: std::io::Error| StoreError::WriteError {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(counts)
            .map_err(std::io::Error::from)
            .map_err(write_err)?;
        atomic_write(&self.path, content.as_bytes()).map_err(write_err)
    }
}

/// In-process store, for tests and one-off sessions.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counts: RefCell<UsageCounts>,
}

impl CounterStore for MemoryCounterStore {
    fn load(&self) -> UsageCounts {
        self.counts.borrow().clone()
    }

    fn save(&self, counts: &UsageCounts) -> Result<(), StoreError> {
        *self.counts.borrow_mut() = counts.clone();
        Ok(())
    }
}
