//! In-memory watch stores

use std::sync::Arc;
use watcher::database::{Database, WatchStore};

/// Fresh in-memory store with the given per-subscriber cap
pub async fn memory_store(max_watches_per_subscriber: usize) -> Arc<Database> {
    Arc::new(
        Database::in_memory(max_watches_per_subscriber)
            .await
            .expect("Failed to create in-memory database"),
    )
}

pub fn as_store(database: &Arc<Database>) -> Arc<dyn WatchStore> {
    database.clone()
}
