use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Result;

const DISABLED_IMPORT: &str = "// DESACTIVADO - Migrado a JSON Server";
const PENDING_CALL: &str = "// TODO: Migrar a nuevo store con JSON Server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyFileOutcome {
    Modified(PathBuf),
    Unchanged(PathBuf),
    Missing(PathBuf),
}

/// Comment out mock-API imports and calls. Lines already commented are left
/// alone, so running twice changes nothing the second time.
pub fn comment_legacy_source(content: &str) -> Result<String> {
    let mock_module = Regex::new(r#"(?m)^import\s+.*?from\s+['"].*?/mock/.*?['"];?$"#)?;
    let mock_import = Regex::new(r"(?m)^import\s+\{?\s*(mockAPI|MockAPI|MockDB)\s*\}?\s+from")?;
    let awaited_assign = Regex::new(r"(?m)^([ \t]*)(const.*?=\s*await\s+(?:mockAPI|MockAPI)\..*?)$")?;
    let awaited_call = Regex::new(r"(?m)^([ \t]*)(await\s+(?:mockAPI|MockAPI)\..*?)$")?;
    let bare_reference = Regex::new(r"(?m)^([ \t]*)(mockAPI|MockAPI)\.")?;

    let content = mock_module.replace_all(content, format!("// $0 {}", DISABLED_IMPORT).as_str());
    let content = mock_import.replace_all(&content, "// $0");
    let content =
        awaited_assign.replace_all(&content, format!("${{1}}// ${{2}} {}", PENDING_CALL).as_str());
    let content =
        awaited_call.replace_all(&content, format!("${{1}}// ${{2}} {}", PENDING_CALL).as_str());
    let content = bare_reference.replace_all(&content, "${1}// ${2}.");

    Ok(content.into_owned())
}

/// Process each listed file in place. Missing files are reported and skipped.
pub fn comment_legacy_file(path: &Path) -> Result<LegacyFileOutcome> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "file not found, skipped");
        return Ok(LegacyFileOutcome::Missing(path.to_path_buf()));
    }

    let original = fs::read_to_string(path)?;
    let updated = comment_legacy_source(&original)?;
    if updated == original {
        return Ok(LegacyFileOutcome::Unchanged(path.to_path_buf()));
    }

    fs::write(path, updated)?;
    Ok(LegacyFileOutcome::Modified(path.to_path_buf()))
}
