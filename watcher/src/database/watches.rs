//! SQLite implementation of the watch store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, warn};

use super::records::WatchRecord;
use super::store::WatchStore;
use super::Database;
use crate::errors::StoreError;
use crate::health::HealthVerdict;

const SELECT_COLUMNS: &str = r#"
    SELECT subscriber_id, host, api_port, metrics_port, seed_port,
           is_ok, modified, checked, errors, alarm_sent
    FROM watches
"#;

fn millis_to_datetime(column: &str, millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StoreError::Serialization {
        reason: format!("{} timestamp {} out of range", column, millis),
    })
}

fn to_port(column: &str, value: i64) -> Result<u16, StoreError> {
    u16::try_from(value).map_err(|_| StoreError::Serialization {
        reason: format!("{} {} is not a valid port", column, value),
    })
}

fn row_to_record(row: &SqliteRow) -> Result<WatchRecord, StoreError> {
    let metrics_port: Option<i64> = row.try_get("metrics_port")?;
    let seed_port: Option<i64> = row.try_get("seed_port")?;
    let errors: String = row.try_get("errors")?;

    Ok(WatchRecord {
        subscriber_id: row.try_get("subscriber_id")?,
        host: row.try_get("host")?,
        api_port: to_port("api_port", row.try_get("api_port")?)?,
        metrics_port: metrics_port.map(|p| to_port("metrics_port", p)).transpose()?,
        seed_port: seed_port.map(|p| to_port("seed_port", p)).transpose()?,
        verdict: HealthVerdict::from_flag(row.try_get("is_ok")?),
        modified: millis_to_datetime("modified", row.try_get("modified")?)?,
        checked: millis_to_datetime("checked", row.try_get("checked")?)?,
        errors: serde_json::from_str(&errors)?,
        alarm_sent: millis_to_datetime("alarm_sent", row.try_get("alarm_sent")?)?,
    })
}

fn rows_to_records(rows: &[SqliteRow]) -> Result<Vec<WatchRecord>, StoreError> {
    rows.iter().map(row_to_record).collect()
}

#[async_trait]
impl WatchStore for Database {
    async fn query_by_staleness(&self, max_age: Duration) -> Result<Vec<WatchRecord>, StoreError> {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let cutoff = Utc::now().timestamp_millis().saturating_sub(max_age_ms);

        let sql = format!("{} WHERE checked < ? ORDER BY checked ASC", SELECT_COLUMNS);
        let rows = sqlx::query(&sql).bind(cutoff).fetch_all(&self.pool).await?;

        debug!("{} watches checked before {}", rows.len(), cutoff);
        rows_to_records(&rows)
    }

    async fn query_alarmable(&self) -> Result<Vec<WatchRecord>, StoreError> {
        let sql = format!(
            "{} WHERE is_ok = 0 AND alarm_sent < modified ORDER BY subscriber_id, host",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows_to_records(&rows)
    }

    async fn query_by_subscriber(
        &self,
        subscriber_id: i64,
    ) -> Result<Vec<WatchRecord>, StoreError> {
        let sql = format!("{} WHERE subscriber_id = ? ORDER BY host", SELECT_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(subscriber_id)
            .fetch_all(&self.pool)
            .await?;
        rows_to_records(&rows)
    }

    async fn find(
        &self,
        subscriber_id: i64,
        host: &str,
    ) -> Result<Option<WatchRecord>, StoreError> {
        let sql = format!("{} WHERE subscriber_id = ? AND host = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(subscriber_id)
            .bind(host)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn upsert(&self, record: &WatchRecord) -> Result<(), StoreError> {
        let errors = serde_json::to_string(&record.errors)?;
        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM watches WHERE subscriber_id = ? AND host = ?",
        )
        .bind(record.subscriber_id)
        .bind(&record.host)
        .fetch_one(&mut *tx)
        .await?;

        let limit = self.max_watches_per_subscriber;
        if exists == 0 && limit > 0 {
            let watched: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM watches WHERE subscriber_id = ?")
                    .bind(record.subscriber_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if watched as usize >= limit {
                warn!(
                    "Subscriber {} is at the limit of {} watches",
                    record.subscriber_id, limit
                );
                return Err(StoreError::QuotaExceeded {
                    subscriber_id: record.subscriber_id,
                    limit,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO watches (
                subscriber_id, host, api_port, metrics_port, seed_port,
                is_ok, modified, checked, errors, alarm_sent
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(subscriber_id, host) DO UPDATE SET
                api_port = excluded.api_port,
                metrics_port = excluded.metrics_port,
                seed_port = excluded.seed_port,
                is_ok = excluded.is_ok,
                modified = excluded.modified,
                checked = excluded.checked,
                errors = excluded.errors,
                alarm_sent = excluded.alarm_sent
            "#,
        )
        .bind(record.subscriber_id)
        .bind(&record.host)
        .bind(i64::from(record.api_port))
        .bind(record.metrics_port.map(i64::from))
        .bind(record.seed_port.map(i64::from))
        .bind(record.verdict.as_flag())
        .bind(record.modified.timestamp_millis())
        .bind(record.checked.timestamp_millis())
        .bind(errors)
        .bind(record.alarm_sent.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Stored watch {}", record.key());
        Ok(())
    }

    async fn update_status(&self, record: &WatchRecord) -> Result<bool, StoreError> {
        let errors = serde_json::to_string(&record.errors)?;
        let result = sqlx::query(
            r#"
            UPDATE watches
            SET is_ok = ?, errors = ?, modified = ?, checked = ?
            WHERE subscriber_id = ? AND host = ?
            "#,
        )
        .bind(record.verdict.as_flag())
        .bind(errors)
        .bind(record.modified.timestamp_millis())
        .bind(record.checked.timestamp_millis())
        .bind(record.subscriber_id)
        .bind(&record.host)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, subscriber_id: i64, host: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM watches WHERE subscriber_id = ? AND host = ?")
            .bind(subscriber_id)
            .bind(host)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_alarm_sent(
        &self,
        subscriber_id: i64,
        host: &str,
        modified: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE watches SET alarm_sent = ? WHERE subscriber_id = ? AND host = ? AND modified = ?",
        )
        .bind(at.timestamp_millis())
        .bind(subscriber_id)
        .bind(host)
        .bind(modified.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
