// Subscription endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::common::{api_error, store_error, ApiResponse, ApiResult};
use crate::constants::ports;
use crate::database::WatchRecord;
use crate::web::AppState;

/// Longest DNS name
const MAX_HOST_LENGTH: usize = 253;

#[derive(Debug, Deserialize)]
pub struct AddWatchRequest {
    pub subscriber_id: i64,
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Missing means the default port, `null` means not monitored
    #[serde(default = "default_metrics_port")]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_seed_port")]
    pub seed_port: Option<u16>,
}

fn default_api_port() -> u16 {
    ports::API
}

fn default_metrics_port() -> Option<u16> {
    Some(ports::METRICS)
}

fn default_seed_port() -> Option<u16> {
    Some(ports::SEED)
}

#[derive(Debug, Serialize)]
pub struct WatchListResponse {
    pub watches: Vec<WatchRecord>,
    /// Same listing as shown to chat users
    pub text: String,
}

fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("Host must not be empty".to_string());
    }
    if host.len() > MAX_HOST_LENGTH {
        return Err(format!("Host is longer than {} characters", MAX_HOST_LENGTH));
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(format!("Invalid host: {}", host));
    }
    Ok(())
}

pub async fn list_watches(
    Path(subscriber_id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<WatchListResponse> {
    let watches = state
        .store
        .query_by_subscriber(subscriber_id)
        .await
        .map_err(store_error)?;

    let text = if watches.is_empty() {
        "No nodes are being watched right now".to_string()
    } else {
        watches
            .iter()
            .map(|watch| watch.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(Json(ApiResponse::success(WatchListResponse { watches, text })))
}

pub async fn add_watch(
    State(state): State<AppState>,
    Json(request): Json<AddWatchRequest>,
) -> ApiResult<WatchRecord> {
    let host = request.host.trim().to_string();
    validate_host(&host).map_err(|message| api_error(StatusCode::BAD_REQUEST, message))?;

    // Re-adding a host keeps its status and only changes the ports.
    let existing = state
        .store
        .find(request.subscriber_id, &host)
        .await
        .map_err(store_error)?;
    let record = existing
        .unwrap_or_else(|| WatchRecord::new(request.subscriber_id, host.clone()))
        .with_ports(request.api_port, request.metrics_port, request.seed_port);

    state.store.upsert(&record).await.map_err(store_error)?;

    info!("Subscriber {} watches {}", request.subscriber_id, host);
    Ok(Json(
        ApiResponse::success(record)
            .with_message(format!("Successfully added node watch: {}", host)),
    ))
}

pub async fn delete_watch(
    Path((subscriber_id, host)): Path<(i64, String)>,
    State(state): State<AppState>,
) -> ApiResult<()> {
    let deleted = state
        .store
        .delete(subscriber_id, &host)
        .await
        .map_err(store_error)?;

    if !deleted {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Node {} is not being watched", host),
        ));
    }

    info!("Subscriber {} stopped watching {}", subscriber_id, host);
    Ok(Json(
        ApiResponse::success(()).with_message(format!("Successfully deleted node watch: {}", host)),
    ))
}
