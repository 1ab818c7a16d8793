//! Database layer for the watcher.
//!
//! SQLite persistence of watch records behind the `WatchStore` trait:
//! - `records` - the watch record entity
//! - `store` - the storage trait the watcher, dispatcher and API depend on
//! - `watches` - the SQLite implementation of that trait

mod records;
mod store;
mod watches;

pub use records::{WatchKey, WatchRecord};
pub use store::WatchStore;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{error, info};

pub struct Database {
    pool: Pool<Sqlite>,
    /// Per-subscriber cap on watched hosts, `0` for unlimited
    max_watches_per_subscriber: usize,
}

impl Database {
    pub async fn new(database_path: &str, max_watches_per_subscriber: usize) -> Result<Self> {
        info!("Database path: {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Failed to create parent directory {:?}: {}", parent, e);
                return Err(e.into());
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_url, e);
                return Err(e.into());
            }
        };

        let database = Self {
            pool,
            max_watches_per_subscriber,
        };
        database.initialize_tables().await?;

        info!("Database initialized");
        Ok(database)
    }

    /// Private in-memory database, used by tests and dry runs
    pub async fn in_memory(max_watches_per_subscriber: usize) -> Result<Self> {
        // Every connection to `sqlite::memory:` is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let database = Self {
            pool,
            max_watches_per_subscriber,
        };
        database.initialize_tables().await?;
        Ok(database)
    }

    pub fn max_watches_per_subscriber(&self) -> usize {
        self.max_watches_per_subscriber
    }

    async fn initialize_tables(&self) -> Result<()> {
        let watches_table_sql = r#"
            CREATE TABLE IF NOT EXISTS watches (
                subscriber_id INTEGER NOT NULL,
                host TEXT NOT NULL,
                api_port INTEGER NOT NULL,
                metrics_port INTEGER,
                seed_port INTEGER,
                is_ok BOOLEAN,
                modified INTEGER NOT NULL DEFAULT 0,
                checked INTEGER NOT NULL DEFAULT 0,
                errors TEXT NOT NULL DEFAULT '[]',
                alarm_sent INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (subscriber_id, host)
            )
        "#;

        if let Err(e) = sqlx::query(watches_table_sql).execute(&self.pool).await {
            error!("Failed to create watches table: {}", e);
            return Err(e.into());
        }

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_watches_checked ON watches(checked)",
            "CREATE INDEX IF NOT EXISTS idx_watches_alarm ON watches(is_ok, alarm_sent, modified)",
        ];
        for index_sql in indexes {
            if let Err(e) = sqlx::query(index_sql).execute(&self.pool).await {
                error!("Failed to create index: {}", e);
                return Err(e.into());
            }
        }

        info!("watches table and indexes created");
        Ok(())
    }
}
