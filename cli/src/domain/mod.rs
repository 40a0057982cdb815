//! Domain layer: pure provisioning types, validation, and rendering.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod backoff;
pub mod config;
pub mod error;
pub mod launch;
pub mod metadata;
pub mod network;
pub mod operation;
pub mod request;

pub use config::{AdapterConfig, ImageSelector, ResolvedConfig};
pub use error::{GatewayError, ProvisionError, RecordError};
pub use launch::{LaunchSpec, Placement};
pub use operation::{Instance, Operation, OperationStatus};
pub use request::{ProvisionRequest, RequestStatus};
