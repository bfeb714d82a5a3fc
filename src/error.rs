use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConchitasError {
    #[error("No document at {0}. Run 'conchitas init' first.")]
    NotInitialized(String),

    #[error("Document already exists at {0}. Remove it to reinitialize.")]
    AlreadyInitialized(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Record not found: {collection}/{id}")]
    RecordNotFound { collection: String, id: String },

    #[error("Record already exists: {collection}/{id}")]
    DuplicateRecord { collection: String, id: String },

    #[error("Key '{0}' is not a collection (expected an array)")]
    NotACollection(String),

    #[error("Document is locked by another process ({0}). Remove the lock file if it is stale.")]
    Locked(String),

    #[error("Unknown migration: {0}")]
    UnknownMigration(String),

    #[error("Invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("{0}")]
    ConfirmationRequired(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ConchitasError>;
