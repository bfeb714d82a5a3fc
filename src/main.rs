use clap::Parser;
use conchitas::cli::{
    handle_collections, handle_comment_legacy, handle_drop, handle_expire_invitations, handle_get,
    handle_harvest_report, handle_init, handle_list, handle_migrate, handle_migrate_status,
    handle_rewrite_imports, handle_serve, handle_sweep_storage, Cli, Commands,
};

fn main() {
    conchitas::logging::init();

    let cli = Cli::parse();
    let db = cli.db;

    let result = match cli.command {
        Commands::Init => handle_init(db),
        Commands::Migrate { dry_run, to } => handle_migrate(db, dry_run, to),
        Commands::MigrateStatus => handle_migrate_status(db),
        Commands::Collections { json } => handle_collections(db, json),
        Commands::List { collection, json } => handle_list(db, collection, json),
        Commands::Get { collection, id } => handle_get(db, collection, id),
        Commands::HarvestReport { json } => handle_harvest_report(db, json),
        Commands::ExpireInvitations { dry_run } => handle_expire_invitations(db, dry_run),
        Commands::Serve { host, port } => handle_serve(db, host, port),
        Commands::RewriteImports { dir, dry_run } => handle_rewrite_imports(dir, dry_run),
        Commands::CommentLegacy { files } => handle_comment_legacy(files),
        Commands::SweepStorage { file } => handle_sweep_storage(file),
        Commands::Drop { collection, force } => handle_drop(db, collection, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
