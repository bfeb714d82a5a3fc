use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Result;

/// Stores that moved behind the `stores` index module.
pub const LEGACY_STORES: [&str; 12] = [
    "authStore",
    "sectorStore",
    "monitoringStore",
    "expenseStore",
    "harvestStore",
    "incomeStore",
    "inventoryStore",
    "investmentStore",
    "notificationStore",
    "seedOriginStore",
    "projectionStore",
    "incomeStatementClosureStore",
];

const SOURCE_EXTENSIONS: [&str; 2] = ["js", "jsx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRewrite {
    pub path: PathBuf,
    pub stores: Vec<String>,
}

fn store_pattern(store: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(
        r#"from ['"]((?:\.\./)+)stores/{}['"]"#,
        regex::escape(store)
    ))?)
}

/// Rewrite legacy store imports in one source text.
/// Returns the new text and the stores whose imports changed.
pub fn rewrite_source(content: &str) -> Result<(String, Vec<String>)> {
    let mut content = content.to_string();
    let mut changed = Vec::new();

    for store in LEGACY_STORES {
        let pattern = store_pattern(store)?;
        if pattern.is_match(&content) {
            content = pattern
                .replace_all(&content, "from '${1}stores'")
                .into_owned();
            changed.push(store.to_string());
        }
    }

    Ok((content, changed))
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

/// Every `.js`/`.jsx` file under `dir`, skipping `node_modules`,
/// dot-directories and the stores themselves. Sorted for stable output.
fn source_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if entry.file_type()?.is_dir() {
            if name.contains("node_modules") || name.starts_with('.') || name == "stores" {
                continue;
            }
            source_files(&path, files)?;
        } else if is_source(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Rewrite imports in every source file under `dir`. With `dry_run` the
/// changes are reported but nothing is written.
pub fn rewrite_imports(dir: &Path, dry_run: bool) -> Result<Vec<ImportRewrite>> {
    let mut files = Vec::new();
    source_files(dir, &mut files)?;

    let mut rewrites = Vec::new();
    for path in files {
        let content = fs::read_to_string(&path)?;
        let (rewritten, stores) = rewrite_source(&content)?;
        if stores.is_empty() {
            continue;
        }
        if !dry_run {
            fs::write(&path, rewritten)?;
        }
        tracing::debug!(path = %path.display(), stores = stores.len(), dry_run, "imports rewritten");
        rewrites.push(ImportRewrite { path, stores });
    }

    Ok(rewrites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rewrite_keeps_relative_depth() {
        let source = "import { useAuthStore } from '../../stores/authStore';\n\
                      import { useLotStore } from '../stores/lotStore';\n\
                      import { useHarvestStore } from \"../stores/harvestStore\";\n";

        let (rewritten, changed) = rewrite_source(source).unwrap();

        assert_eq!(changed, vec!["authStore", "harvestStore"]);
        assert!(rewritten.contains("import { useAuthStore } from '../../stores';"));
        assert!(rewritten.contains("from '../stores/lotStore'"));
        assert!(rewritten.contains("import { useHarvestStore } from '../stores';"));
    }

    #[test]
    fn test_store_names_match_exactly() {
        let source = "import x from '../stores/incomeStatementClosureStore';\n";
        let (rewritten, changed) = rewrite_source(source).unwrap();
        assert_eq!(changed, vec!["incomeStatementClosureStore"]);
        assert_eq!(rewritten, "import x from '../stores';\n");
    }

    #[test]
    fn test_walk_skips_ignored_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let legacy = "import { useSectorStore } from '../stores/sectorStore';\n";

        fs::create_dir_all(root.join("pages")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::create_dir_all(root.join("stores")).unwrap();
        fs::write(root.join("pages/SectorsPage.jsx"), legacy).unwrap();
        fs::write(root.join("pages/notes.md"), legacy).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), legacy).unwrap();
        fs::write(root.join(".cache/a.js"), legacy).unwrap();
        fs::write(root.join("stores/index.js"), legacy).unwrap();

        let rewrites = rewrite_imports(root, false).unwrap();

        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].path, root.join("pages/SectorsPage.jsx"));
        assert_eq!(
            fs::read_to_string(root.join("pages/SectorsPage.jsx")).unwrap(),
            "import { useSectorStore } from '../stores';\n"
        );
        assert_eq!(fs::read_to_string(root.join("node_modules/pkg/index.js")).unwrap(), legacy);
        assert_eq!(fs::read_to_string(root.join("stores/index.js")).unwrap(), legacy);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("App.js");
        let legacy = "import { useAuthStore } from '../stores/authStore';\n";
        fs::write(&file, legacy).unwrap();

        let rewrites = rewrite_imports(tmp.path(), true).unwrap();

        assert_eq!(rewrites.len(), 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), legacy);
    }
}
