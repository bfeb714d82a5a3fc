pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod maintenance;
pub mod migrations;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{ConchitasError, Result};
pub use migrations::Migrator;
pub use storage::{Document, DocumentStore, DocumentStoreExt, JsonFileStore, MemoryStore};
