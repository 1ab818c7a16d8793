// Liveness and help endpoints

use axum::response::Json;
use serde::Serialize;

use super::common::{ApiResponse, ApiResult};

const COMMANDS: &[(&str, &str)] = &[
    ("GET /api/help", "Get the available commands"),
    (
        "POST /api/watches",
        "Add your node's IP or host name to the watcher (e.g. {\"subscriber_id\": 1, \"host\": \"1.1.1.1\"})",
    ),
    (
        "DELETE /api/watches/{subscriber_id}/{host}",
        "Delete a node watch (e.g. DELETE /api/watches/1/1.1.1.1)",
    ),
    ("GET /api/watches/{subscriber_id}", "Get your nodes' statuses"),
];

#[derive(Debug, Serialize)]
pub struct HelpEntry {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct HelpResponse {
    pub commands: Vec<HelpEntry>,
    pub text: String,
}

pub async fn liveness() -> ApiResult<&'static str> {
    Ok(Json(ApiResponse::success("ok")))
}

pub async fn help() -> ApiResult<HelpResponse> {
    let commands: Vec<HelpEntry> = COMMANDS
        .iter()
        .map(|(command, description)| HelpEntry {
            command: command.to_string(),
            description: description.to_string(),
        })
        .collect();

    let text = commands
        .iter()
        .map(|entry| format!("{} - {}", entry.command, entry.description))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Json(ApiResponse::success(HelpResponse { commands, text })))
}
