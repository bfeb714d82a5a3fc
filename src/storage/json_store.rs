use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{Document, DocumentStore};
use crate::error::{ConchitasError, Result};

const LOCK_SUFFIX: &str = ".lock";

/// Exclusive lock held for the duration of a read-modify-write cycle.
///
/// The lock is a sibling file created with create-new semantics, so a
/// second process fails fast instead of racing. Dropping the guard removes it.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn acquire(path: PathBuf) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ConchitasError::Locked(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}

/// The document as a pretty-printed JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a new empty document. Fails if the file already exists.
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(ConchitasError::AlreadyInitialized(path.display().to_string()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
        };
        store.save(&Document::new())?;

        Ok(store)
    }

    /// Open an existing document.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConchitasError::NotInitialized(path.display().to_string()));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(LOCK_SUFFIX);
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Document> {
        let text = fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        Document::from_value(value)
    }

    fn save(&self, document: &Document) -> Result<()> {
        // Write next to the target and rename so readers never see a partial file.
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        serde_json::to_writer_pretty(&mut tmp, document)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn lock(&self) -> Result<Option<LockFile>> {
        LockFile::acquire(self.lock_path()).map(Some)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DocumentStoreExt;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_empty_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let store = JsonFileStore::init(&path).unwrap();

        assert!(path.exists());
        assert!(store.load().unwrap().collection_names().is_empty());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        JsonFileStore::init(&path).unwrap();

        let result = JsonFileStore::init(&path);
        assert!(matches!(result, Err(ConchitasError::AlreadyInitialized(_))));
    }

    #[test]
    fn test_open_fails_if_not_initialized() {
        let tmp = TempDir::new().unwrap();

        let result = JsonFileStore::open(&tmp.path().join("db.json"));
        assert!(matches!(result, Err(ConchitasError::NotInitialized(_))));
    }

    #[test]
    fn test_init_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backend/data/db.json");
        JsonFileStore::init(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_update_round_trip_preserves_key_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        fs::write(
            &path,
            r#"{"zeta": [], "alpha": [{"id": "a"}], "mid": []}"#,
        )
        .unwrap();
        let store = JsonFileStore::open(&path).unwrap();

        store
            .update(|doc| {
                doc.put_collection("alpha", vec![json!({"id": "b"})]);
                Ok(())
            })
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap().load().unwrap();
        assert_eq!(reopened.collection_names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(reopened.collection("alpha").unwrap()[0]["id"], "b");
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        fs::write(&path, r#"{"lots": [{"id": "lot-001"}]}"#).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        let store = JsonFileStore::open(&path).unwrap();

        let result: Result<()> = store.update(|doc| {
            doc.put_collection("lots", vec![]);
            Err(ConchitasError::CollectionNotFound("cultivationLines".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert!(!store.lock_path().exists());
    }

    #[test]
    fn test_concurrent_update_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let store = JsonFileStore::init(&path).unwrap();

        let held = store.lock().unwrap();
        let result = store.put_collection("lots", vec![]);
        assert!(matches!(result, Err(ConchitasError::Locked(_))));

        drop(held);
        store.put_collection("lots", vec![]).unwrap();
        assert!(store.load().unwrap().has_collection("lots"));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::open(&path).unwrap();

        assert!(matches!(store.load(), Err(ConchitasError::Json(_))));
    }

    #[test]
    fn test_saved_file_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let store = JsonFileStore::init(&path).unwrap();
        store.put_collection("lots", vec![json!({"id": "lot-001"})]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"lots\": ["));
    }
}
