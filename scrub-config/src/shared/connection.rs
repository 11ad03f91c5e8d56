use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnectOptions;

/// Connection configuration for the local SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConnectionConfig {
    /// Path of the database file.
    pub path: PathBuf,
    /// Whether to create the file when it does not exist yet.
    #[serde(default)]
    pub create_if_missing: bool,
}

impl SqliteConnectionConfig {
    /// Returns sqlx connect options for this configuration.
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .foreign_keys(true)
    }
}
