//! Builds instance launch specifications.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use nodefleet_common::Node;

use crate::application::ports::{ComputeGateway, LocalFs};
use crate::domain::config::{ImageSelector, ResolvedConfig};
use crate::domain::error::ProvisionError;
use crate::domain::launch::{
    DiskSpec, GuestAccelerator, HostMaintenance, INSTANCE_TAG, LaunchSpec, Scheduling,
    accelerator_type_url, disk_type_url, machine_type_url,
};
use crate::domain::metadata;
use crate::domain::network::{NetworkInterfaceSpec, resolve_network_interfaces};

/// Extra argument that requests preemptible instances.
pub const PREEMPTIBLE_ARG: &str = "preemptible";

/// Launch arguments shared by every instance of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLaunchArgs {
    pub source_image: String,
    pub network_interfaces: Vec<NetworkInterfaceSpec>,
    pub preemptible: bool,
    pub accelerators: Vec<GuestAccelerator>,
}

/// Resolves the batch-wide launch arguments once.
///
/// # Errors
///
/// Returns [`ProvisionError::OperationFailed`] when the image lookup fails
/// and [`ProvisionError::Configuration`] for bad network definitions.
pub async fn batch_launch_args(
    gateway: &impl ComputeGateway,
    config: &ResolvedConfig,
    extra_args: &BTreeMap<String, String>,
) -> Result<BatchLaunchArgs> {
    let source_image = resolve_image(gateway, config).await?;
    let network_interfaces =
        resolve_network_interfaces(&config.project, &config.region, &config.networks)?;
    let preemptible = extra_args.contains_key(PREEMPTIBLE_ARG);
    let accelerators = config
        .accelerators
        .iter()
        .map(|a| GuestAccelerator {
            accelerator_type: accelerator_type_url(&config.project, &config.zone, &a.accelerator_type),
            count: a.count,
        })
        .collect();

    tracing::debug!(preemptible, image = %source_image, "resolved batch launch arguments");

    Ok(BatchLaunchArgs {
        source_image,
        network_interfaces,
        preemptible,
        accelerators,
    })
}

/// Resolves the configured image selector to an image URL.
///
/// Unqualified names and families are looked up in the configured project.
///
/// # Errors
///
/// Returns [`ProvisionError::OperationFailed`] if the gateway lookup fails.
pub async fn resolve_image(
    gateway: &impl ComputeGateway,
    config: &ResolvedConfig,
) -> Result<String, ProvisionError> {
    match &config.image {
        ImageSelector::Url(url) => Ok(url.clone()),
        ImageSelector::Name { project, name } => {
            let project = project.as_deref().unwrap_or(&config.project);
            gateway.image_by_name(project, name).await.map_err(|e| {
                ProvisionError::OperationFailed(format!(
                    "Error retrieving image [{project}/{name}]: {e}"
                ))
            })
        }
        ImageSelector::Family { project, family } => {
            let project = project.as_deref().unwrap_or(&config.project);
            gateway.image_from_family(project, family).await.map_err(|e| {
                ProvisionError::OperationFailed(format!(
                    "Error retrieving image family [{project}/{family}]: {e}"
                ))
            })
        }
    }
}

/// Reads the configured local files and assembles the instance metadata.
///
/// # Errors
///
/// Returns an error if a configured file exists but cannot be read.
pub fn instance_metadata(
    fs: &dyn LocalFs,
    config: &ResolvedConfig,
    node: &Node,
) -> Result<Vec<(String, String)>> {
    let ssh_key = match &config.ssh_public_key {
        Some(path) => {
            let key = fs
                .read_optional(path)
                .with_context(|| format!("reading public SSH key {}", path.display()))?;
            if key.is_none() {
                tracing::info!(path = %path.display(), "public SSH key not found");
            }
            key
        }
        None => None,
    };

    let startup_script = match &config.startup_script_template {
        Some(path) => {
            let template = fs
                .read_optional(path)
                .with_context(|| format!("reading startup script template {}", path.display()))?;
            if template.is_none() {
                tracing::warn!(
                    path = %path.display(),
                    "startup script template does not exist, instances will start without one"
                );
            }
            template.map(|t| metadata::render_startup_script(&t, config))
        }
        None => {
            tracing::warn!(
                hardware_profile = %node.hardware_profile,
                "startup script template not defined"
            );
            None
        }
    };

    Ok(metadata::instance_metadata(
        config,
        &node.name,
        ssh_key.as_deref(),
        startup_script,
    ))
}

/// Assembles the launch spec of one instance.
#[must_use]
pub fn build(
    config: &ResolvedConfig,
    instance_name: &str,
    batch: &BatchLaunchArgs,
    metadata: Vec<(String, String)>,
    disks: Vec<DiskSpec>,
) -> LaunchSpec {
    let scheduling = if batch.preemptible || !batch.accelerators.is_empty() {
        Some(Scheduling {
            preemptible: batch.preemptible,
            on_host_maintenance: (!batch.accelerators.is_empty())
                .then_some(HostMaintenance::Terminate),
        })
    } else {
        None
    };

    let tags = std::iter::once(INSTANCE_TAG.to_string())
        .chain(config.tags.iter().cloned())
        .collect();

    LaunchSpec {
        name: instance_name.to_string(),
        machine_type: machine_type_url(&config.project, &config.zone, &config.machine_type),
        source_image: batch.source_image.clone(),
        disk_type: disk_type_url(&config.project, &config.zone, config.ssd),
        disks,
        network_interfaces: batch.network_interfaces.clone(),
        metadata,
        tags,
        scheduling,
        accelerators: batch.accelerators.clone(),
    }
}
