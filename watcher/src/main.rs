// File: watcher/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use watcher::config::ConfigManager;
use watcher::database::{Database, WatchStore};
use watcher::probe::{NodeProbe, ProbeCache};
use watcher::scheduler::{WatchEvaluator, WatchScheduler};
use watcher::services::{AlertDispatcher, LogNotifier, Notifier, WebhookNotifier};
use watcher::web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("watcher=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Aptos node watcher");

    let config_manager = ConfigManager::from_env().await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded from {}",
        config_manager.config_path().display()
    );

    let database = Database::new(&config.database_path, config.max_watches_per_subscriber).await?;
    let store: Arc<dyn WatchStore> = Arc::new(database);

    let probe = Arc::new(NodeProbe::from_config(&config)?);
    let cache = Arc::new(ProbeCache::new());
    let evaluator = Arc::new(WatchEvaluator::from_config(
        store.clone(),
        probe,
        cache.clone(),
        &config,
    ));

    let scheduler = WatchScheduler::from_config(store.clone(), evaluator, cache, &config);
    tokio::spawn(scheduler.run());
    info!("Watch scheduler started");

    let notifier: Arc<dyn Notifier> = match &config.notification_webhook_url {
        Some(url) if !url.is_empty() => {
            info!("Alerts will be posted to {}", url);
            Arc::new(WebhookNotifier::new(url.clone())?)
        }
        _ => {
            warn!("No notification_webhook_url configured, alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let dispatcher = Arc::new(AlertDispatcher::new(store.clone(), notifier));
    // Keep the scheduler handle alive for the lifetime of the process.
    let _alert_scheduler = dispatcher.start(config.alert_interval()).await?;

    let state = AppState::new(config.clone(), store);
    if let Err(e) = start_web_server(state).await {
        error!("Web server failed: {}", e);
        return Err(e);
    }

    Ok(())
}
