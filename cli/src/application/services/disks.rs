//! Persistent disk provisioning ahead of instance creation, and catalogue
//! release on teardown.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use nodefleet_common::{Node, disk_volume_name, instance_name_from_host_name};

use crate::application::ports::{ComputeGateway, StorageCatalog};
use crate::application::services::poller::await_operation;
use crate::domain::config::ResolvedConfig;
use crate::domain::launch::{DiskSpec, Placement, disk_type_url};

/// Index of the boot disk; it is created along with the instance.
pub const BOOT_DISK_INDEX: u32 = 1;

/// Creates the node's added data disks in ascending index order, waiting for
/// each, and registers every processed disk with the catalogue.
///
/// The returned list always starts with the boot disk. When the catalogue
/// yields none, its size comes from `disksize`. On failure the data disks
/// already created are deleted again.
///
/// # Errors
///
/// Returns an error if the catalogue or a disk creation fails.
pub async fn provision(
    gateway: &impl ComputeGateway,
    catalog: &impl StorageCatalog,
    config: &ResolvedConfig,
    node: &Node,
    instance_name: &str,
) -> Result<Vec<DiskSpec>> {
    let changes = catalog
        .discover_changes(node, false)
        .await
        .with_context(|| format!("discovering storage changes for {}", node.name))?;

    let placement = config.placement();
    let disk_type = disk_type_url(&config.project, &config.zone, config.ssd);
    let mut disks = Vec::with_capacity(changes.added.len() + 1);
    let mut boot: Option<DiskSpec> = None;

    let created = async {
        for (&index, disk) in &changes.added {
            if !disk.is_default_adapter() {
                tracing::debug!(node = %node.name, index, adapter = %disk.adapter, "skipping non-default storage");
                continue;
            }

            let name = disk_volume_name(instance_name, index);
            let size_gb = disk.size_gb();

            if index == BOOT_DISK_INDEX {
                boot = Some(DiskSpec { name, size_gb, source_link: None });
            } else {
                tracing::debug!(node = %node.name, volume = %name, size_gb, "creating data disk");
                let request = DiskSpec { name: name.clone(), size_gb, source_link: None };
                let operation = gateway
                    .create_disk(&placement, &request, &disk_type)
                    .await
                    .with_context(|| format!("creating persistent disk [{name}]"))?;
                let done = await_operation(gateway, &config.project, operation, config.polling_interval)
                    .await
                    .with_context(|| format!("waiting for persistent disk [{name}]"))?;
                if let Some(summary) = done.error_summary() {
                    anyhow::bail!("Error creating persistent disk [{name}]: {summary}");
                }
                let link = done
                    .target_link
                    .with_context(|| format!("persistent disk [{name}] has no target link"))?;
                disks.push(DiskSpec { name, size_gb, source_link: Some(link) });
            }

            catalog
                .add_drive(node, index, disk)
                .await
                .with_context(|| format!("registering disk {index} of {}", node.name))?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = created {
        discard(gateway, &placement, &disks).await;
        return Err(e);
    }

    let boot = boot.unwrap_or_else(|| DiskSpec {
        name: disk_volume_name(instance_name, BOOT_DISK_INDEX),
        size_gb: config.disksize_gb,
        source_link: None,
    });
    disks.insert(0, boot);
    Ok(disks)
}

/// Best-effort deletion of created data disks that never got attached to an
/// instance. Failures are logged and otherwise ignored.
pub async fn discard(gateway: &impl ComputeGateway, placement: &Placement, disks: &[DiskSpec]) {
    for disk in disks.iter().filter(|d| d.source_link.is_some()) {
        tracing::debug!(volume = %disk.name, "deleting unattached persistent disk");
        if let Err(e) = gateway.delete_disk(placement, &disk.name).await {
            tracing::warn!(volume = %disk.name, error = %e, "failed to delete persistent disk");
        }
    }
}

/// Removes the node's default-adapter disks from the catalogue.
///
/// Attached backend disks are deleted along with their instance.
///
/// # Errors
///
/// Returns an error if the catalogue fails.
pub async fn release(catalog: &impl StorageCatalog, node: &Node) -> Result<()> {
    let changes = catalog
        .discover_changes(node, true)
        .await
        .with_context(|| format!("discovering removed storage for {}", node.name))?;

    let instance = instance_name_from_host_name(&node.name);
    for (&index, disk) in &changes.removed {
        if !disk.is_default_adapter() {
            continue;
        }
        tracing::debug!(volume = %disk_volume_name(instance, index), "removing persistent disk from catalogue");
        catalog
            .delete_drive(node, index)
            .await
            .with_context(|| format!("releasing disk {index} of {}", node.name))?;
    }
    Ok(())
}
