//! The compute resource adapter: the capability surface the cluster manager
//! drives to add, remove, and power-cycle nodes.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use nodefleet_common::{Node, format_node_list};

use crate::application::ports::{
    ClusterRegistrar, ComputeGateway, ConfigProfiles, LocalFs, NodeRepository, ProgressReporter,
    StorageCatalog,
};
use crate::application::services::{disks, node_ops};
use crate::domain::config::{DEFAULT_PROFILE, ResolvedConfig};
use crate::domain::error::ProvisionError;

/// Request to add `count` nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddNodesRequest {
    pub count: usize,
    pub hardware_profile: String,
    pub software_profile: Option<String>,
    /// Adapter configuration profile; `default` when unset.
    pub adapter_profile: Option<String>,
    /// Free-form `key[=value]` arguments, e.g. `preemptible`.
    pub extra_args: BTreeMap<String, String>,
}

impl AddNodesRequest {
    #[must_use]
    pub fn adapter_profile(&self) -> &str {
        self.adapter_profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }
}

/// Operations a resource adapter offers the cluster manager.
#[allow(async_fn_in_trait)]
pub trait ResourceAdapter {
    /// Provision a batch of nodes and return those that launched.
    async fn start(&self, request: &AddNodesRequest) -> Result<Vec<Node>>;
    /// Delete the nodes' instances and release their catalogued disks.
    async fn delete_nodes(&self, nodes: &[Node]) -> Result<()>;
    /// Reset the nodes' instances and wait for each reset.
    async fn reboot_nodes(&self, nodes: &[Node]) -> Result<()>;
    /// Request a stop of each node's instance.
    async fn shutdown_nodes(&self, nodes: &[Node]) -> Result<()>;
    /// Request a start of each node's instance.
    async fn startup_nodes(&self, nodes: &[Node]) -> Result<()>;
}

/// Loads adapter profile `name` and validates it.
///
/// # Errors
///
/// Returns an error if the profile is unknown or invalid.
pub fn resolve_profile(profiles: &dyn ConfigProfiles, name: &str) -> Result<ResolvedConfig> {
    let raw = profiles.profile(name)?;
    raw.validate(name)
        .with_context(|| format!("validating adapter profile [{name}]"))
}

/// [`ResourceAdapter`] for a compute backend, composed purely of ports.
pub struct ComputeAdapter<'a, G, N, S, R> {
    pub gateway: &'a G,
    pub nodes: &'a N,
    pub storage: &'a S,
    pub registrar: &'a R,
    pub profiles: &'a dyn ConfigProfiles,
    pub fs: &'a dyn LocalFs,
    pub reporter: &'a dyn ProgressReporter,
}

impl<G, N, S, R> ComputeAdapter<'_, G, N, S, R>
where
    G: ComputeGateway,
    N: NodeRepository,
    S: StorageCatalog,
    R: ClusterRegistrar,
{
    /// Loads and validates adapter profile `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is unknown or invalid.
    pub fn resolve_config(&self, name: &str) -> Result<ResolvedConfig> {
        resolve_profile(self.profiles, name)
    }

    /// Config of the profile a node was launched with, or `None` when the
    /// node has no instance.
    fn config_for_node(&self, node: &Node) -> Result<Option<ResolvedConfig>> {
        let Some(mapping) = &node.instance else {
            tracing::debug!(node = %node.name, "node has no associated instance");
            return Ok(None);
        };
        self.resolve_config(&mapping.adapter_profile)
            .with_context(|| format!("loading adapter profile for {}", node.name))
            .map(Some)
    }
}

impl<G, N, S, R> ResourceAdapter for ComputeAdapter<'_, G, N, S, R>
where
    G: ComputeGateway,
    N: NodeRepository,
    S: StorageCatalog,
    R: ClusterRegistrar,
{
    async fn start(&self, request: &AddNodesRequest) -> Result<Vec<Node>> {
        if request.software_profile.is_none() {
            return Err(ProvisionError::UnsupportedOperation(
                "Software profile must be specified for compute nodes".to_string(),
            )
            .into());
        }
        let config = self.resolve_config(request.adapter_profile())?;
        self.provision_batch(&config, request).await
    }

    async fn delete_nodes(&self, nodes: &[Node]) -> Result<()> {
        tracing::debug!(nodes = %format_node_list(nodes), "delete_nodes");
        for node in nodes {
            let Some(config) = self.config_for_node(node)? else {
                continue;
            };
            let placement = node_ops::placement_for(&config, node);
            self.reporter.step(&format!("Deleting instance for {}", node.name));
            node_ops::delete_instance(self.gateway, &placement, node.host_name()).await?;
            disks::release(self.storage, node).await?;
        }
        Ok(())
    }

    async fn reboot_nodes(&self, nodes: &[Node]) -> Result<()> {
        tracing::debug!(nodes = %format_node_list(nodes), "reboot_nodes");
        for node in nodes {
            let Some(config) = self.config_for_node(node)? else {
                continue;
            };
            let placement = node_ops::placement_for(&config, node);
            self.reporter.step(&format!("Rebooting {}", node.name));
            node_ops::reboot(
                self.gateway,
                &placement,
                node.host_name(),
                config.polling_interval,
            )
            .await?;
        }
        Ok(())
    }

    async fn shutdown_nodes(&self, nodes: &[Node]) -> Result<()> {
        tracing::debug!(nodes = %format_node_list(nodes), "shutdown_nodes");
        for node in nodes {
            let Some(config) = self.config_for_node(node)? else {
                continue;
            };
            let placement = node_ops::placement_for(&config, node);
            self.reporter.step(&format!("Stopping {}", node.name));
            node_ops::shutdown(self.gateway, &placement, node.host_name()).await?;
        }
        Ok(())
    }

    async fn startup_nodes(&self, nodes: &[Node]) -> Result<()> {
        tracing::debug!(nodes = %format_node_list(nodes), "startup_nodes");
        for node in nodes {
            let Some(config) = self.config_for_node(node)? else {
                continue;
            };
            let placement = node_ops::placement_for(&config, node);
            self.reporter.step(&format!("Starting {}", node.name));
            node_ops::startup(self.gateway, &placement, node.host_name()).await?;
        }
        Ok(())
    }
}
