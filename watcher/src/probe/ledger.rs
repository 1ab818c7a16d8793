//! Ledger information fetch from the node's REST API root

use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::types::LedgerInfo;
use crate::errors::ProbeError;

/// Fetch chain id, epoch, ledger version and timestamp from `url`
pub async fn fetch_ledger_info(
    client: &HttpClient,
    url: &str,
    deadline: Duration,
) -> Result<LedgerInfo, ProbeError> {
    debug!("Updating ledger version from {}", url);

    let response = timeout(deadline, client.get(url).send())
        .await
        .map_err(|_| ProbeError::Timeout {
            url: url.to_string(),
        })?
        .map_err(|e| ProbeError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if response.status() != StatusCode::OK {
        return Err(ProbeError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response
        .json::<LedgerInfo>()
        .await
        .map_err(|e| ProbeError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
}
