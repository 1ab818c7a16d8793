pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod health;
pub mod probe;
pub mod scheduler;
pub mod services;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use database::{Database, WatchRecord, WatchStore};
pub use errors::{StoreError, WatcherError};
pub use probe::{NodeProbe, ProbeCache};
pub use scheduler::{WatchEvaluator, WatchScheduler};
pub use services::{AlertDispatcher, Notifier};
