use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::SCHEMA;
use crate::error::{EtlError, Result};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let is_memory = path_str.trim().eq_ignore_ascii_case(MEMORY_DB_PATH);
        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        };
        // Reply rows reference their parent comment; enforce it per connection.
        let manager = manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON"));
        // Every connection to ":memory:" opens its own empty database, so
        // the in-memory pool must hold exactly one connection.
        let pool = if is_memory {
            Pool::builder().max_size(1).build(manager)?
        } else {
            Pool::new(manager)?
        };
        Ok(Self { pool })
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Apply the idempotent schema definition. Safe to run repeatedly.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA).map_err(EtlError::Schema)?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let db = Database::in_memory().expect("Failed to create database");
        db.ensure_schema().expect("Failed to apply schema");

        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        assert!(tables.contains(&"posts".to_string()));
        assert!(tables.contains(&"comments".to_string()));
        assert!(tables.contains(&"flat_texts".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let db = Database::in_memory().expect("Failed to create database");
        db.ensure_schema().expect("first application");
        db.ensure_schema().expect("second application must be a no-op");
    }

    #[test]
    fn collaborator_columns_exist_and_are_nullable() {
        let db = Database::in_memory().expect("Failed to create database");
        db.ensure_schema().expect("Failed to apply schema");

        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("PRAGMA table_info(flat_texts)")
            .expect("Failed to prepare statement");
        // (name, notnull) pairs from the table metadata
        let columns: Vec<(String, i32)> = stmt
            .query_map([], |row| Ok((row.get(1)?, row.get(3)?)))
            .expect("Failed to query columns")
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("Failed to collect columns");

        for wanted in ["sentiment_label", "predicted_sentiment"] {
            let (_, notnull) = columns
                .iter()
                .find(|(name, _)| name == wanted)
                .unwrap_or_else(|| panic!("missing column {wanted}"));
            assert_eq!(*notnull, 0, "{wanted} must be nullable");
        }
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::in_memory().expect("Failed to create database");
        db.ensure_schema().expect("Failed to apply schema");

        let conn = db.connection().expect("Failed to get connection");
        let result = conn.execute(
            "INSERT INTO comments (comment_id, post_id) VALUES ('c1', 'no-such-post')",
            [],
        );
        assert!(result.is_err(), "orphan comment must be rejected");
    }
}
