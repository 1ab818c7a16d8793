//! HTTP request handlers for the watcher API.
//!
//! - `common` - response envelope and error mapping
//! - `health` - liveness and command help
//! - `watches` - subscribe, unsubscribe and list watches

pub mod common;
pub mod health;
pub mod watches;

pub use health::*;
pub use watches::*;
