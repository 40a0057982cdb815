//! Lifecycle operations on existing instances: delete, reset, stop, start.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::Result;
use nodefleet_common::Node;

use crate::application::ports::ComputeGateway;
use crate::application::services::poller::await_operation;
use crate::domain::config::ResolvedConfig;
use crate::domain::error::ProvisionError;
use crate::domain::launch::Placement;

/// Project and zone of the node's instance. Values recorded on the instance
/// mapping take precedence over the profile's.
#[must_use]
pub fn placement_for(config: &ResolvedConfig, node: &Node) -> Placement {
    let mapping = node.instance.as_ref();
    Placement {
        project: mapping
            .and_then(|m| m.project())
            .unwrap_or(&config.project)
            .to_string(),
        zone: mapping
            .and_then(|m| m.zone())
            .unwrap_or(&config.zone)
            .to_string(),
    }
}

/// Issues an instance delete without waiting for it.
///
/// An absent instance is logged and treated as deleted.
///
/// # Errors
///
/// Returns [`ProvisionError::CommandFailed`] for any other gateway failure.
pub async fn delete_instance(
    gateway: &impl ComputeGateway,
    placement: &Placement,
    instance_name: &str,
) -> Result<(), ProvisionError> {
    tracing::debug!(instance = %instance_name, zone = %placement.zone, "deleting instance");
    match gateway.delete_instance(placement, instance_name).await {
        Ok(operation) => {
            tracing::debug!(instance = %instance_name, operation = %operation.name, "delete submitted");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!(instance = %instance_name, "instance not found");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(instance = %instance_name, error = %e, "delete failed");
            Err(ProvisionError::CommandFailed(format!(
                "Error deleting Compute Engine instance [{instance_name}]"
            )))
        }
    }
}

/// Resets an instance and waits for the reset to complete.
///
/// # Errors
///
/// Returns [`ProvisionError::CommandFailed`] for any gateway failure other
/// than an absent instance.
pub async fn reboot(
    gateway: &impl ComputeGateway,
    placement: &Placement,
    instance_name: &str,
    polling_interval: Duration,
) -> Result<(), ProvisionError> {
    let failed = |e: &dyn std::fmt::Display| {
        tracing::debug!(instance = %instance_name, error = %e, "reset failed");
        ProvisionError::CommandFailed(format!(
            "Error rebooting Compute Engine instance [{instance_name}]"
        ))
    };

    let operation = match gateway.reset_instance(placement, instance_name).await {
        Ok(operation) => operation,
        Err(e) if e.is_not_found() => {
            tracing::warn!(instance = %instance_name, "instance not found");
            return Ok(());
        }
        Err(e) => return Err(failed(&e)),
    };

    await_operation(gateway, &placement.project, operation, polling_interval)
        .await
        .map_err(|e| failed(&e))?;
    tracing::debug!(instance = %instance_name, "instance rebooted");
    Ok(())
}

/// Issues a stop without waiting for it.
///
/// # Errors
///
/// Returns [`ProvisionError::CommandFailed`] if the request is rejected.
pub async fn shutdown(
    gateway: &impl ComputeGateway,
    placement: &Placement,
    instance_name: &str,
) -> Result<(), ProvisionError> {
    tracing::debug!(instance = %instance_name, "stopping instance");
    gateway
        .stop_instance(placement, instance_name)
        .await
        .map(drop)
        .map_err(|e| {
            ProvisionError::CommandFailed(format!(
                "Error stopping Compute Engine instance [{instance_name}]: {e}"
            ))
        })
}

/// Issues a start without waiting for it.
///
/// # Errors
///
/// Returns [`ProvisionError::CommandFailed`] if the request is rejected.
pub async fn startup(
    gateway: &impl ComputeGateway,
    placement: &Placement,
    instance_name: &str,
) -> Result<(), ProvisionError> {
    tracing::debug!(instance = %instance_name, "starting instance");
    gateway
        .start_instance(placement, instance_name)
        .await
        .map(drop)
        .map_err(|e| {
            ProvisionError::CommandFailed(format!(
                "Error starting Compute Engine instance [{instance_name}]: {e}"
            ))
        })
}
