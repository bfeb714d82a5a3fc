use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConchitasError, Result};

/// Optional settings file, looked up next to the document.
pub const CONFIG_FILE: &str = "conchitas.yaml";
pub const DEFAULT_DB: &str = "db.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4077;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Only the exact value `production` selects production.
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Runtime settings for the CLI and the HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db: PathBuf,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Origins accepted by CORS in production.
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db: PathBuf::from(DEFAULT_DB),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: Environment::Development,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Resolve settings: defaults, then `conchitas.yaml`, then the process
    /// environment, then an explicit document path from the command line.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        Self::resolve(db_override, |key| std::env::var(key).ok())
    }

    fn resolve<F>(db_override: Option<PathBuf>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_hint = db_override
            .clone()
            .or_else(|| var("CONCHITAS_DB").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
        let file = config_path_for(&db_hint);

        let mut config = if file.exists() {
            tracing::debug!(path = %file.display(), "loading config file");
            Self::from_file(&file)?
        } else {
            Self::default()
        };

        config.apply_env(var)?;
        if let Some(db) = db_override {
            config.db = db;
        }
        Ok(config)
    }

    /// Apply `CONCHITAS_DB`, `HOST`, `PORT` and `NODE_ENV` from `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = var("CONCHITAS_DB") {
            self.db = PathBuf::from(db);
        }
        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConchitasError::Config(format!("invalid PORT '{}'", port)))?;
        }
        if let Some(env) = var("NODE_ENV") {
            self.environment = Environment::from_node_env(Some(env.as_str()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                ConchitasError::Config(format!("invalid listen address {}:{}", self.host, self.port))
            })
    }
}

fn config_path_for(db: &Path) -> PathBuf {
    match db.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(CONFIG_FILE),
        _ => PathBuf::from(CONFIG_FILE),
    }
}
