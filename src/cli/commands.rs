use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "conchitas")]
#[command(version, about = "Data store, migrations and mock REST backend for scallop farm tracking")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the JSON document (default: db.json, or $CONCHITAS_DB)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty document
    Init,

    /// Apply pending migrations
    Migrate {
        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,

        /// Stop after this migration id
        #[arg(long = "to", value_name = "ID")]
        to: Option<String>,
    },

    /// Show applied and pending migrations
    MigrateStatus,

    /// List collections with their record counts
    Collections {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the records of a collection
    List {
        collection: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one record as JSON
    Get { collection: String, id: String },

    /// Summarize which lots can be harvested
    HarvestReport {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark pending invitations past their expiration date as expired
    ExpireInvitations {
        /// Show which invitations would expire without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the REST backend
    Serve {
        /// Address to bind (default: 0.0.0.0, or $HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: 4077, or $PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Point legacy store imports at the stores index
    RewriteImports {
        /// Source directory to scan
        dir: PathBuf,

        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Comment out mock API imports and calls
    CommentLegacy {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Purge stale keys from an exported localStorage dump
    SweepStorage { file: PathBuf },

    /// Remove a collection from the document
    Drop {
        collection: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}
