//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (cap > 0, status codes in range)
//! - Check simulated replica endpoints have a host
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DiagnosticsSettings → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::DiagnosticsSettings;
use crate::diagnostics::request::extract_host;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("report.max_supplemental_entries must be at least 1")]
    ZeroSupplementalCap,

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),

    #[error("simulation.replicas must not be empty")]
    NoReplicas,

    #[error("replica {index}: endpoint '{endpoint}' has no host")]
    ReplicaWithoutHost { index: usize, endpoint: String },

    #[error("replica {index}: status code {status_code} out of range")]
    InvalidStatusCode { index: usize, status_code: u16 },
}

/// Check a parsed configuration.
pub fn validate_config(settings: &DiagnosticsSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.report.max_supplemental_entries == 0 {
        errors.push(ValidationError::ZeroSupplementalCap);
    }

    let level = settings.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            settings.observability.log_level.clone(),
        ));
    }

    if settings.simulation.replicas.is_empty() {
        errors.push(ValidationError::NoReplicas);
    }
    for (index, replica) in settings.simulation.replicas.iter().enumerate() {
        if extract_host(&replica.endpoint).is_none() {
            errors.push(ValidationError::ReplicaWithoutHost {
                index,
                endpoint: replica.endpoint.clone(),
            });
        }
        if !(100..=599).contains(&replica.status_code) {
            errors.push(ValidationError::InvalidStatusCode {
                index,
                status_code: replica.status_code,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
