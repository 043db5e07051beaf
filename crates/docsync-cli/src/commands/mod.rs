//! CLI subcommands.

pub mod cascade;
pub mod history;
pub mod seed;
pub mod status;

use rusqlite::Connection;

/// Open (and migrate) the store at the given path.
pub fn open_store(db: &str) -> Result<Connection, Box<dyn std::error::Error>> {
    if let Some(parent) = std::path::Path::new(db).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut conn = docsync_store::db::open(db)?;
    docsync_store::db::configure(&conn)?;
    docsync_store::migrations::apply_migrations(&mut conn)?;
    Ok(conn)
}
