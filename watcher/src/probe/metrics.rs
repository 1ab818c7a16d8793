//! Prometheus text exposition parsing and sync status derivation
//!
//! Only the parts of the format the watcher needs are understood: `# HELP`
//! and `# TYPE` comments (which name the current family), and sample lines
//! of the form `name{label="value",...} value [timestamp]`.

use reqwest::{Client as HttpClient, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::types::SyncStatus;
use crate::constants::probe::{EXECUTED_SAMPLE, SYNCED_SAMPLE, SYNC_METRIC_FAMILY, SYNC_TYPE_LABEL};
use crate::errors::ProbeError;

/// Suffixes under which summary/histogram/counter samples are exposed
const FAMILY_SUFFIXES: &[&str] = &["_bucket", "_sum", "_count", "_total", "_created", "_info"];

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// First sample whose `label` equals `value`
    pub fn sample_with_label(&self, label: &str, value: &str) -> Option<&Sample> {
        self.samples
            .iter()
            .find(|sample| sample.labels.get(label).map(String::as_str) == Some(value))
    }
}

/// Parse an exposition document into families, keeping document order
pub fn parse_exposition(text: &str) -> Result<Vec<MetricFamily>, String> {
    let mut families: Vec<MetricFamily> = Vec::new();
    let mut declared: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            let mut parts = comment.split_whitespace();
            if let (Some("HELP" | "TYPE"), Some(name)) = (parts.next(), parts.next()) {
                declared = Some(name.to_string());
            }
            continue;
        }

        let sample =
            parse_sample(line).map_err(|e| format!("line {}: {}: {}", index + 1, e, line))?;
        let family_name = family_of(&sample.name, declared.as_deref());

        match families.iter_mut().find(|family| family.name == family_name) {
            Some(family) => family.samples.push(sample),
            None => families.push(MetricFamily {
                name: family_name,
                samples: vec![sample],
            }),
        }
    }

    Ok(families)
}

fn family_of(sample_name: &str, declared: Option<&str>) -> String {
    if let Some(family) = declared {
        if sample_name == family {
            return family.to_string();
        }
        if let Some(suffix) = sample_name.strip_prefix(family) {
            if FAMILY_SUFFIXES.contains(&suffix) {
                return family.to_string();
            }
        }
    }
    sample_name.to_string()
}

fn parse_sample(line: &str) -> Result<Sample, String> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .ok_or_else(|| "missing sample value".to_string())?;
    let name = &line[..name_end];
    if name.is_empty() {
        return Err("missing metric name".to_string());
    }

    let mut rest = &line[name_end..];
    let mut labels = BTreeMap::new();
    if rest.starts_with('{') {
        let (parsed, remainder) = parse_labels(&rest[1..])?;
        labels = parsed;
        rest = remainder;
    }

    let value_token = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| "missing sample value".to_string())?;
    let value = value_token
        .parse::<f64>()
        .map_err(|e| format!("invalid value '{}': {}", value_token, e))?;

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
    })
}

/// Parse `key="value",...}` returning the labels and the text after `}`
fn parse_labels(input: &str) -> Result<(BTreeMap<String, String>, &str), String> {
    let mut labels = BTreeMap::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ' ' || c == ',');
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }

        let eq = rest
            .find('=')
            .ok_or_else(|| "label without value".to_string())?;
        let key = rest[..eq].trim().to_string();
        rest = rest[eq + 1..].trim_start();

        let body = rest
            .strip_prefix('"')
            .ok_or_else(|| format!("label '{}' value is not quoted", key))?;

        let mut value = String::new();
        let mut chars = body.char_indices();
        let mut closed_at = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                '"' => {
                    closed_at = Some(i);
                    break;
                }
                other => value.push(other),
            }
        }

        let closed_at = closed_at.ok_or_else(|| format!("label '{}' is unterminated", key))?;
        labels.insert(key, value);
        rest = &body[closed_at + 1..];
    }
}

/// Derive the sync status from parsed metrics
///
/// A missing sync family means the node does not expose the signal and
/// yields `Unknown`. A family lacking one of the two samples is a failure.
pub fn sync_status(
    host: &str,
    families: &[MetricFamily],
    out_of_sync_threshold: u64,
) -> Result<SyncStatus, ProbeError> {
    let Some(family) = families.iter().find(|f| f.name == SYNC_METRIC_FAMILY) else {
        debug!("{} does not expose {}", host, SYNC_METRIC_FAMILY);
        return Ok(SyncStatus::Unknown);
    };

    let synced = family
        .sample_with_label(SYNC_TYPE_LABEL, SYNCED_SAMPLE)
        .ok_or_else(|| missing(host, SYNCED_SAMPLE))?;
    let executed = family
        .sample_with_label(SYNC_TYPE_LABEL, EXECUTED_SAMPLE)
        .ok_or_else(|| missing(host, EXECUTED_SAMPLE))?;

    let lag = (synced.value - executed.value).abs();
    if lag < out_of_sync_threshold as f64 {
        Ok(SyncStatus::Synced)
    } else {
        debug!("{} lags by {} versions", host, lag);
        Ok(SyncStatus::Lagging)
    }
}

fn missing(host: &str, sample: &str) -> ProbeError {
    ProbeError::MissingSyncSamples {
        host: host.to_string(),
        missing: sample.to_string(),
    }
}

/// Fetch the metrics endpoint and derive the sync status
pub async fn fetch_sync_status(
    client: &HttpClient,
    host: &str,
    url: &str,
    deadline: Duration,
    out_of_sync_threshold: u64,
) -> Result<SyncStatus, ProbeError> {
    debug!("Updating synced status from {}", url);

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

    let body = response.text().await.map_err(|e| ProbeError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let families = parse_exposition(&body).map_err(|reason| ProbeError::InvalidResponse {
        url: url.to_string(),
        reason,
    })?;

    sync_status(host, &families, out_of_sync_threshold)
}
