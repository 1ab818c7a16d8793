use crate::constants::health_errors;
use crate::errors::WatcherError;
use crate::probe::{ProbeResult, SyncStatus};

use super::types::HealthAssessment;

/// Chain id of a usable reference probe
///
/// A reference that failed or returned no ledger info cannot anchor the
/// out-of-date comparison.
pub fn check_reference(reference: &ProbeResult) -> Result<u64, WatcherError> {
    if let Some(e) = &reference.error {
        return Err(WatcherError::ReferenceUnavailable {
            reason: e.to_string(),
        });
    }

    reference
        .chain_id()
        .ok_or_else(|| WatcherError::ReferenceUnavailable {
            reason: format!("{} returned no ledger info", reference.host),
        })
}

/// Compare a target probe against the reference probe
///
/// Every rule is applied; the resulting errors are sorted.
pub fn evaluate(target: &ProbeResult, reference: &ProbeResult) -> HealthAssessment {
    let mut errors = Vec::new();

    if !target.seed_port_open {
        errors.push(health_errors::SEED_PORT_CLOSED.to_string());
    }

    if !target.metrics_port_open {
        errors.push(health_errors::METRICS_PORT_CLOSED.to_string());
    } else if target.sync == SyncStatus::Lagging {
        errors.push(health_errors::NOT_SYNCED.to_string());
    }

    if !target.api_port_open {
        errors.push(health_errors::API_PORT_CLOSED.to_string());
    } else if let (Some(chain_id), Some(reference_chain_id)) =
        (target.chain_id(), reference.chain_id())
    {
        if chain_id != reference_chain_id {
            errors.push(health_errors::OUT_OF_DATE.to_string());
        }
    }

    HealthAssessment::from_errors(errors)
}
