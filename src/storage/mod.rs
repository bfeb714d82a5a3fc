//! The shared JSON document and the stores that persist it.
//!
//! A document is an ordered mapping from collection name to an array of
//! plain JSON records. Key order survives a load/save round trip so that
//! positional inserts (see [`Document::insert_collection_after`]) stay put.
//! Keys starting with `_` are internal (the migration log lives there) and
//! are hidden from [`Document::collection_names`] and the HTTP façade.

mod json_store;
mod memory_store;

pub use json_store::{JsonFileStore, LockFile};
pub use memory_store::MemoryStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConchitasError, Result};

/// Prefix marking internal top-level keys.
pub const INTERNAL_PREFIX: char = '_';

pub fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a parsed JSON value. The top level must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(ConchitasError::InvalidRecord(format!(
                "document root must be an object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Raw top-level value, whatever its shape.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    pub fn has_collection(&self, name: &str) -> bool {
        matches!(self.root.get(name), Some(Value::Array(_)))
    }

    /// Records of a collection, or `None` if the key is absent or not an array.
    pub fn collection(&self, name: &str) -> Option<&Vec<Value>> {
        match self.root.get(name) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Missing collections read as empty.
    pub fn collection_or_empty(&self, name: &str) -> Vec<Value> {
        self.collection(name).cloned().unwrap_or_default()
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        match self.root.get_mut(name) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Replace a collection wholesale. An existing key keeps its position;
    /// a new key is appended at the end.
    pub fn put_collection(&mut self, name: &str, records: Vec<Value>) {
        self.root.insert(name.to_string(), Value::Array(records));
    }

    /// Insert (or move) a collection directly after `anchor`.
    /// Appends at the end when `anchor` is absent.
    pub fn insert_collection_after(&mut self, anchor: &str, name: &str, records: Vec<Value>) {
        if !self.root.contains_key(anchor) || anchor == name {
            self.put_collection(name, records);
            return;
        }

        let old = std::mem::take(&mut self.root);
        let mut records = Some(records);
        for (key, value) in old {
            if key == name {
                continue;
            }
            let is_anchor = key == anchor;
            self.root.insert(key, value);
            if is_anchor {
                if let Some(records) = records.take() {
                    self.root.insert(name.to_string(), Value::Array(records));
                }
            }
        }
    }

    pub fn remove_collection(&mut self, name: &str) -> Option<Value> {
        self.root.shift_remove(name)
    }

    /// Public collection names in document order.
    pub fn collection_names(&self) -> Vec<String> {
        self.root
            .keys()
            .filter(|k| !is_internal(k))
            .cloned()
            .collect()
    }

    /// Record count per public key; `None` for keys that are not arrays.
    pub fn counts(&self) -> Vec<(String, Option<usize>)> {
        self.root
            .iter()
            .filter(|(k, _)| !is_internal(k))
            .map(|(k, v)| (k.clone(), v.as_array().map(Vec::len)))
            .collect()
    }

    /// The document without internal keys.
    pub fn public_view(&self) -> Value {
        let filtered: Map<String, Value> = self
            .root
            .iter()
            .filter(|(k, _)| !is_internal(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(filtered)
    }

    pub fn find_record(&self, collection: &str, id: &str) -> Option<&Value> {
        self.collection(collection)?
            .iter()
            .find(|record| id_matches(record, id))
    }
}

/// Compare a record's `id` (string or number) against a path segment.
pub fn id_matches(record: &Value, id: &str) -> bool {
    match record.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

/// Shallow object merge: keys of `patch` overwrite keys of `target`.
/// A non-object on either side replaces `target` outright.
pub fn merge_into(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Persistence boundary for the document.
pub trait DocumentStore: Send + Sync {
    fn load(&self) -> Result<Document>;

    fn save(&self, document: &Document) -> Result<()>;

    /// Acquire exclusive access for a read-modify-write cycle.
    fn lock(&self) -> Result<Option<LockFile>>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}

/// Read-modify-write helpers available on every store, including trait objects.
pub trait DocumentStoreExt: DocumentStore {
    /// Lock, load, mutate and save. Nothing is written if `f` fails.
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _lock = self.lock()?;
        let mut document = self.load()?;
        let out = f(&mut document)?;
        self.save(&document)?;
        Ok(out)
    }

    fn get_collection(&self, name: &str) -> Result<Option<Vec<Value>>> {
        Ok(self.load()?.collection(name).cloned())
    }

    fn put_collection(&self, name: &str, records: Vec<Value>) -> Result<()> {
        self.update(|doc| {
            doc.put_collection(name, records);
            Ok(())
        })
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}
