use log::info;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

use crate::db::schema::initialize_schema;
use crate::error::CatalogError;

pub type DbPool = Pool<SqliteConnectionManager>;

// Foreign keys are off by default and the pragma is per connection
fn enable_foreign_keys(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

pub fn create_db_pool<P: AsRef<Path>>(db_path: P) -> Result<DbPool, CatalogError> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(enable_foreign_keys);
    let pool = Pool::new(manager)?;

    {
        let conn = pool.get()?;
        // WAL lets searches read while an indexing run writes
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        initialize_schema(&conn)?;
    }

    info!("Catalog database ready at {}", db_path.display());
    Ok(pool)
}

/// Every in-memory SQLite connection is its own database, so the pool holds one.
pub fn create_in_memory_pool() -> Result<DbPool, CatalogError> {
    let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
    let pool = Pool::builder().max_size(1).build(manager)?;

    {
        let conn = pool.get()?;
        initialize_schema(&conn)?;
    }

    Ok(pool)
}
