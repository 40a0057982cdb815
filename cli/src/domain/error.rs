//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors surfaced by the provisioning orchestrator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// Malformed adapter settings. Raised before any cloud call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A backend lookup needed to build the batch failed.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// One or more instances could not be launched or managed.
    #[error("{0}")]
    CommandFailed(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl ProvisionError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

// ── Gateway errors ────────────────────────────────────────────────────────────

/// Errors returned by the compute gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend answered with a non-success HTTP status.
    #[error("compute API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("compute API transport error: {0}")]
    Transport(String),

    #[error("invalid compute API response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether the backend reported the resource as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

// ── Record errors ─────────────────────────────────────────────────────────────

/// Errors related to node and profile records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Node '{0}' not found.")]
    NodeNotFound(String),

    #[error("Hardware profile '{0}' not found.")]
    HardwareProfileNotFound(String),

    #[error("Software profile '{0}' not found.")]
    SoftwareProfileNotFound(String),

    #[error("Adapter configuration profile '{0}' not found.")]
    AdapterProfileNotFound(String),

    #[error("Hardware profile '{profile}' cannot name {count} more node(s): name format '{format}' yields no unused names")]
    NamesExhausted {
        profile: String,
        format: String,
        count: usize,
    },
}
