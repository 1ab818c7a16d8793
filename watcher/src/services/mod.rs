// File: watcher/src/services/mod.rs
pub mod alert_dispatcher;
pub mod notifier;

pub use alert_dispatcher::{AlertDispatcher, DispatchSummary};
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
