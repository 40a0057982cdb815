//! Post-launch setup of a running instance.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use nodefleet_common::{Nic, NodeState};

use crate::application::ports::{ClusterRegistrar, ComputeGateway, HostRegistration};
use crate::domain::config::ResolvedConfig;
use crate::domain::request::ProvisionRequest;

/// Outcome of [`after_launch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostLaunch {
    /// The node was updated and registered with the cluster.
    Registered,
    /// The instance no longer exists; nothing was done.
    Vanished,
}

/// Records the instance's boot address on the request's node and registers
/// it with the cluster.
///
/// # Errors
///
/// Returns an error if the instance lookup fails for any reason other than
/// absence, if it has no internal address, or if registration fails.
pub async fn after_launch(
    gateway: &impl ComputeGateway,
    registrar: &impl ClusterRegistrar,
    config: &ResolvedConfig,
    request: &mut ProvisionRequest,
) -> Result<PostLaunch> {
    let instance_name = request.instance_name().to_string();

    let instance = match gateway.get_instance(&config.placement(), &instance_name).await {
        Ok(instance) => instance,
        Err(e) if e.is_not_found() => {
            tracing::error!(instance = %instance_name, "instance went away after launching, nothing to do");
            return Ok(PostLaunch::Vanished);
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("fetching instance [{instance_name}]")));
        }
    };

    let ip = instance
        .internal_ip()
        .with_context(|| format!("instance [{instance_name}] has no internal IP address"))?
        .to_string();

    let node = request.node_mut();
    node.state = NodeState::Installed;
    node.nics.push(Nic { ip: ip.clone(), boot: true });

    let registration = HostRegistration {
        name: node.name.clone(),
        hardware_profile: node.hardware_profile.clone(),
        software_profile: node.software_profile.clone(),
        ip,
    };
    registrar
        .pre_add_host(&registration)
        .await
        .with_context(|| format!("registering node {}", registration.name))?;

    tracing::info!(node = %registration.name, ip = %registration.ip, "node registered");
    Ok(PostLaunch::Registered)
}
