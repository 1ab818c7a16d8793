//! Health verdict and assessment types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored health verdict of a watched node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthVerdict {
    /// Never evaluated
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthVerdict {
    /// Database representation: `NULL`, `true` or `false`
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            HealthVerdict::Unknown => None,
            HealthVerdict::Healthy => Some(true),
            HealthVerdict::Unhealthy => Some(false),
        }
    }

    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => HealthVerdict::Unknown,
            Some(true) => HealthVerdict::Healthy,
            Some(false) => HealthVerdict::Unhealthy,
        }
    }
}

impl From<bool> for HealthVerdict {
    fn from(is_healthy: bool) -> Self {
        if is_healthy {
            HealthVerdict::Healthy
        } else {
            HealthVerdict::Unhealthy
        }
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthVerdict::Unknown => write!(f, "unknown"),
            HealthVerdict::Healthy => write!(f, "healthy"),
            HealthVerdict::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of comparing a target probe with the reference probe
///
/// `errors` is sorted and empty exactly when `is_healthy` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthAssessment {
    pub is_healthy: bool,
    pub errors: Vec<String>,
}

impl HealthAssessment {
    pub fn from_errors(mut errors: Vec<String>) -> Self {
        errors.sort();
        Self {
            is_healthy: errors.is_empty(),
            errors,
        }
    }

    pub fn verdict(&self) -> HealthVerdict {
        HealthVerdict::from(self.is_healthy)
    }
}
