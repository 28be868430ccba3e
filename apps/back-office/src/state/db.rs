//! # Database State
//!
//! Wraps the `Database` connection for use in commands.

use greengrocer_db::{Database, DbConfig, DbResult};

/// Wrapper around `Database` handed to every command.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens a database from `config`.
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        Ok(DbState::new(Database::new(config).await?))
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let listing = db_state.inner().items().catalog_for_customers().await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
