// File: watcher/src/web/mod.rs
pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::config::Config;
use crate::database::WatchStore;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn WatchStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn WatchStore>) -> Self {
        Self { config, store }
    }
}
