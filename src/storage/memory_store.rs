use std::sync::Mutex;

use super::{Document, DocumentStore, LockFile};
use crate::error::{ConchitasError, Result};

/// Document kept in process memory and never written to disk. Backs the
/// server and migration tests, and callers that want a throwaway store.
///
/// ```
/// use conchitas::{DocumentStore, DocumentStoreExt, MemoryStore};
///
/// let store = MemoryStore::default();
/// store.put_collection("lots", vec![serde_json::json!({"id": "lot-001"})]).unwrap();
/// assert_eq!(store.load().unwrap().collection("lots").unwrap().len(), 1);
/// assert_eq!(store.describe(), "memory");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Document>,
}

impl MemoryStore {
    pub fn new(document: Document) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    pub fn snapshot(&self) -> Document {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Document> {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .map_err(|_| ConchitasError::Locked("memory store poisoned".to_string()))
    }

    fn save(&self, document: &Document) -> Result<()> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| ConchitasError::Locked("memory store poisoned".to_string()))?;
        *guard = document.clone();
        Ok(())
    }

    fn lock(&self) -> Result<Option<LockFile>> {
        Ok(None)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DocumentStoreExt;
    use serde_json::json;

    #[test]
    fn test_put_and_get_collection() {
        let store = MemoryStore::default();
        store
            .put_collection("batteries", vec![json!({"id": "bat-A"})])
            .unwrap();

        let batteries = store.get_collection("batteries").unwrap().unwrap();
        assert_eq!(batteries.len(), 1);
        assert!(store.get_collection("lots").unwrap().is_none());
    }
}
