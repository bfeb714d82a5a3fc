mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_collections, handle_comment_legacy, handle_drop, handle_expire_invitations, handle_get,
    handle_harvest_report, handle_init, handle_list, handle_migrate, handle_migrate_status,
    handle_rewrite_imports, handle_serve, handle_sweep_storage,
};
