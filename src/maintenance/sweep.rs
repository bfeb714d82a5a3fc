//! One-time purge of stale client-side storage keys.
//!
//! Works on any [`KeyValueStore`]; the CLI runs it over a JSON object
//! exported from a browser profile's localStorage.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::{ConchitasError, Result};
use crate::storage::json_type_name;

pub const SENTINEL_KEY: &str = "cleanup-done-v1";
pub const LEGACY_PREFIX: &str = "conchas-abanico:";
/// Tokens shorter than this came from the mock login.
pub const MIN_TOKEN_LEN: usize = 50;

pub trait KeyValueStore {
    fn keys(&self) -> Vec<String>;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The sentinel was already set; nothing was touched.
    AlreadyDone,
    Swept { removed: Vec<String> },
}

impl SweepOutcome {
    pub fn removed_count(&self) -> usize {
        match self {
            SweepOutcome::AlreadyDone => 0,
            SweepOutcome::Swept { removed } => removed.len(),
        }
    }
}

fn is_stale_token(token: &str) -> bool {
    !token.is_empty() && (token.contains("conchas") || token.chars().count() < MIN_TOKEN_LEN)
}

/// Remove legacy keys and stale credentials once, then set the sentinel.
pub fn sweep<S: KeyValueStore + ?Sized>(store: &mut S) -> SweepOutcome {
    if store.get(SENTINEL_KEY).is_some() {
        return SweepOutcome::AlreadyDone;
    }

    let mut removed = Vec::new();
    for key in store.keys() {
        if key.starts_with(LEGACY_PREFIX) && store.remove(&key) {
            tracing::debug!(key = %key, "removed legacy key");
            removed.push(key);
        }
    }

    if store.get("token").is_some_and(|t| is_stale_token(&t)) {
        for key in ["token", "user"] {
            if store.remove(key) {
                removed.push(key.to_string());
            }
        }
    }

    store.set(SENTINEL_KEY, "true");
    tracing::info!(removed = removed.len(), "storage sweep finished");
    SweepOutcome::Swept { removed }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryKeyValue {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryKeyValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryKeyValue {
    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }
}

/// A storage dump: one JSON object of key to string value.
#[derive(Debug)]
pub struct JsonKeyValueFile {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonKeyValueFile {
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(entries) => Ok(Self {
                path: path.to_path_buf(),
                entries,
            }),
            other => Err(ConchitasError::InvalidRecord(format!(
                "storage dump must be a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.entries)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for JsonKeyValueFile {
    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// localStorage only holds strings; other JSON values read as their text.
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    fn remove(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }
}
