//! One-off maintenance tasks for the frontend sources and exported
//! browser storage.

pub mod imports;
pub mod legacy;
pub mod sweep;

pub use imports::{rewrite_imports, rewrite_source, ImportRewrite, LEGACY_STORES};
pub use legacy::{comment_legacy_file, comment_legacy_source, LegacyFileOutcome};
pub use sweep::{sweep, JsonKeyValueFile, KeyValueStore, MemoryKeyValue, SweepOutcome};
