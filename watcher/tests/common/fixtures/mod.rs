//! This module provides reusable test utilities:
//! - Mock HTTP servers (Aptos node, notification webhook)
//! - Real TCP listeners for port reachability
//! - Test configuration files
//! - In-memory watch stores
//! - Common test data and a capturing notifier

// Each integration test binary uses a different subset of the fixtures
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_node;
pub mod mock_webhook;
pub mod test_config;
pub mod test_data;
pub mod test_database;

// Re-export commonly used items
pub use mock_node::{closed_port, MockNodeServer, SeedListener, LOCALHOST};
pub use mock_webhook::MockWebhookServer;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
pub use test_database::{as_store, memory_store};
