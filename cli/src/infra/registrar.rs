//! Cluster registration through an external hook command.
//!
//! The hook is invoked as `<hook> <name> <hardware-profile> <software-profile> <ip>`
//! once a node's instance is running. Without a hook, registration only logs.

use anyhow::{Result, bail};
use nodefleet_common::Node;

use crate::application::ports::{ClusterRegistrar, CommandRunner, HostRegistration};

/// `ClusterRegistrar` that shells out to an optional hook.
pub struct HookRegistrar<C: CommandRunner> {
    runner: C,
    pre_add_host_hook: Option<String>,
}

impl<C: CommandRunner> HookRegistrar<C> {
    #[must_use]
    pub fn new(runner: C, pre_add_host_hook: Option<String>) -> Self {
        Self {
            runner,
            pre_add_host_hook,
        }
    }
}

impl<C: CommandRunner> ClusterRegistrar for HookRegistrar<C> {
    async fn pre_add_host(&self, host: &HostRegistration) -> Result<()> {
        let Some(hook) = self.pre_add_host_hook.as_deref() else {
            tracing::debug!(node = %host.name, ip = %host.ip, "no pre-add-host hook configured");
            return Ok(());
        };

        let output = self
            .runner
            .run(
                hook,
                &[
                    host.name.as_str(),
                    host.hardware_profile.as_str(),
                    host.software_profile.as_str(),
                    host.ip.as_str(),
                ],
            )
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("pre-add-host hook failed for {}: {}", host.name, stderr.trim());
        }
        tracing::info!(node = %host.name, ip = %host.ip, "pre-add-host hook completed");
        Ok(())
    }

    async fn node_provisioned(&self, node: &Node) -> Result<()> {
        tracing::info!(node = %node.name, ip = node.boot_ip().unwrap_or_default(), "node provisioned");
        Ok(())
    }
}
