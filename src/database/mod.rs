pub mod schema;

use crate::error::AppError;
use rusqlite::Connection;
use std::path::Path;

/// Opens the database at `path` and brings the schema up to date
pub fn init_database(path: &Path) -> Result<Connection, AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    schema::init_schema(&conn)?;
    log::info!("Database ready at {}", path.display());

    Ok(conn)
}

