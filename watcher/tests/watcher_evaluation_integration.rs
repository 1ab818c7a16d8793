//! End-to-end evaluation of watches: probe, assess, persist

mod common;

use chrono::Utc;
use common::fixtures::*;
use std::sync::Arc;
use std::time::Duration;
use watcher::database::{Database, WatchRecord, WatchStore};
use watcher::errors::WatcherError;
use watcher::health::HealthVerdict;
use watcher::probe::{NodeEndpoint, NodeProbe, ProbeCache};
use watcher::scheduler::{EvaluationOutcome, WatchEvaluator, WatchScheduler, WorkerPool};

const SUBSCRIBER: i64 = subscribers::ALICE;

struct Harness {
    database: Arc<Database>,
    evaluator: Arc<WatchEvaluator>,
    cache: Arc<ProbeCache>,
    _reference: MockNodeServer,
}

async fn harness(reference_chain_id: Option<u64>) -> Harness {
    let reference = MockNodeServer::start().await;
    match reference_chain_id {
        Some(chain_id) => reference.mock_ledger(chain_id).await,
        None => reference.mock_ledger_failure(503).await,
    }

    let database = memory_store(0).await;
    let probe = Arc::new(
        NodeProbe::new(Duration::from_secs(1), Duration::from_secs(2), 10).unwrap(),
    );
    let cache = Arc::new(ProbeCache::new());
    let evaluator = Arc::new(WatchEvaluator::new(
        as_store(&database),
        probe,
        cache.clone(),
        reference.reference_endpoint(),
        Duration::ZERO,
        Duration::ZERO,
    ));

    Harness {
        database,
        evaluator,
        cache,
        _reference: reference,
    }
}

async fn register(database: &Database, endpoint: &NodeEndpoint) -> WatchRecord {
    let record = WatchRecord::new(SUBSCRIBER, endpoint.host.clone()).with_ports(
        endpoint.api_port,
        endpoint.metrics_port,
        endpoint.seed_port,
    );
    database.upsert(&record).await.unwrap();
    record
}

#[tokio::test]
async fn test_healthy_node_is_ok() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger(5).await;
    node.mock_metrics(100, 95).await;
    let seed = SeedListener::start().await;

    let record = register(&h.database, &node.endpoint(Some(seed.port))).await;
    let outcome = h.evaluator.evaluate(record).await.unwrap();

    assert_eq!(outcome, EvaluationOutcome::Changed);
    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(stored.verdict, HealthVerdict::Healthy);
    assert!(stored.errors.is_empty());
    assert!(stored.checked >= stored.modified);
    assert_eq!(stored.to_string(), format!("✅ {} - OK", LOCALHOST));
}

#[tokio::test]
async fn test_all_ports_closed() {
    let h = harness(Some(5)).await;
    let endpoint = NodeEndpoint {
        host: LOCALHOST.to_string(),
        protocol: watcher::probe::Protocol::Http,
        api_port: closed_port().await,
        metrics_port: Some(closed_port().await),
        seed_port: Some(closed_port().await),
    };

    let record = register(&h.database, &endpoint).await;
    h.evaluator.evaluate(record).await.unwrap();

    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(stored.verdict, HealthVerdict::Unhealthy);
    assert_eq!(
        stored.errors,
        vec![
            "API port is closed",
            "Metrics port is closed",
            "Seed port is closed"
        ]
    );
}

#[tokio::test]
async fn test_chain_mismatch_is_out_of_date() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger(3).await;
    node.mock_metrics(100, 100).await;

    let record = register(&h.database, &node.endpoint(None)).await;
    h.evaluator.evaluate(record).await.unwrap();

    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(stored.errors, vec!["Node is out of date. Update it"]);
}

#[tokio::test]
async fn test_lagging_node_is_not_synced() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger(5).await;
    node.mock_metrics(100, 110).await;

    let record = register(&h.database, &node.endpoint(None)).await;
    h.evaluator.evaluate(record).await.unwrap();

    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(stored.errors, vec!["Not synced"]);
}

#[tokio::test]
async fn test_repeated_evaluation_is_idempotent() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger(5).await;
    node.mock_metrics(100, 110).await;

    let record = register(&h.database, &node.endpoint(None)).await;
    h.evaluator.evaluate(record.clone()).await.unwrap();
    let first = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;
    let outcome = h.evaluator.evaluate(record).await.unwrap();
    let second = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();

    assert_eq!(outcome, EvaluationOutcome::Unchanged);
    assert_eq!(second.modified, first.modified);
    assert!(second.checked > first.checked);
    assert_eq!(second.errors, first.errors);
}

#[tokio::test]
async fn test_reference_unavailable_writes_nothing() {
    let h = harness(None).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger(5).await;

    let record = register(&h.database, &node.endpoint(None)).await;
    let result = h.evaluator.evaluate(record).await;

    assert!(matches!(result, Err(WatcherError::ReferenceUnavailable { .. })));
    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(stored.verdict, HealthVerdict::Unknown);
    assert_eq!(stored.checked.timestamp(), 0);
}

#[tokio::test]
async fn test_target_probe_failure_writes_nothing() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger_failure(500).await;

    let record = register(&h.database, &node.endpoint(None)).await;
    let result = h.evaluator.evaluate(record).await;

    assert!(matches!(result, Err(WatcherError::Probe(_))));
    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(stored.checked.timestamp(), 0);
}

#[tokio::test]
async fn test_deleted_watch_is_skipped() {
    let h = harness(Some(5)).await;
    let record = WatchRecord::new(SUBSCRIBER, LOCALHOST);

    let outcome = h.evaluator.evaluate(record).await.unwrap();

    assert_eq!(outcome, EvaluationOutcome::Removed);
    assert!(h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().is_none());
}

#[tokio::test]
async fn test_watch_deleted_during_evaluation_stays_deleted() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_slow_ledger(5, Duration::from_millis(600)).await;
    node.mock_metrics(100, 100).await;

    let record = register(&h.database, &node.endpoint(None)).await;
    let evaluator = h.evaluator.clone();
    let evaluation = tokio::spawn(async move { evaluator.evaluate(record).await });

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(h.database.delete(SUBSCRIBER, LOCALHOST).await.unwrap());

    let outcome = evaluation.await.unwrap().unwrap();
    assert_eq!(outcome, EvaluationOutcome::Removed);
    assert!(h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().is_none());
}

#[tokio::test]
async fn test_alert_sent_during_evaluation_is_kept() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_slow_ledger(5, Duration::from_millis(600)).await;
    node.mock_metrics(100, 50).await;

    let endpoint = node.endpoint(None);
    let lagging = evaluated_record(SUBSCRIBER, LOCALHOST, &["Not synced"], Utc::now())
        .with_ports(endpoint.api_port, endpoint.metrics_port, endpoint.seed_port);
    h.database.upsert(&lagging).await.unwrap();
    let stored = h.database.find(SUBSCRIBER, LOCALHOST).await.unwrap().unwrap();
    assert_eq!(h.database.query_alarmable().await.unwrap().len(), 1);

    let evaluator = h.evaluator.clone();
    let evaluation = tokio::spawn(async move { evaluator.evaluate(stored).await });

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(h
        .database
        .mark_alarm_sent(SUBSCRIBER, LOCALHOST, lagging.modified, Utc::now())
        .await
        .unwrap());

    let outcome = evaluation.await.unwrap().unwrap();
    assert_eq!(outcome, EvaluationOutcome::Unchanged);
    assert!(h.database.query_alarmable().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scheduler_tick_submits_only_stale_watches() {
    let h = harness(Some(5)).await;
    let node = MockNodeServer::start().await;
    node.mock_ledger(5).await;
    node.mock_metrics(10, 10).await;

    let stale = register(&h.database, &node.endpoint(None)).await;
    let mut fresh = healthy_record(SUBSCRIBER, hosts::NODE_1);
    fresh.checked = Utc::now();
    h.database.upsert(&fresh).await.unwrap();

    let scheduler = WatchScheduler::new(
        as_store(&h.database),
        h.evaluator.clone(),
        WorkerPool::new(2, 10),
        h.cache.clone(),
        Duration::from_secs(10),
        Duration::from_secs(300),
        Duration::from_secs(60),
    );

    let summary = scheduler.tick().await.unwrap();
    assert_eq!(summary.due, 1);
    assert_eq!(summary.submitted, 1);
    assert_eq!(summary.rejected, 0);

    for _ in 0..200 {
        if scheduler.pool().pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let evaluated = h
        .database
        .find(stale.subscriber_id, &stale.host)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(evaluated.verdict, HealthVerdict::Healthy);

    let next = scheduler.tick().await.unwrap();
    assert_eq!(next.due, 0);
}
