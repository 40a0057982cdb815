//! Batch provisioning: build, submit, wait, post-process, reconcile.
//!
//! Every submitted request ends either committed as a provisioned node or
//! fully rolled back: instance deleted, catalogue entries released, node
//! record removed.

use anyhow::{Context, Result};
use nodefleet_common::{InstanceMapping, METADATA_SCHEDULING, METADATA_ZONE, Node, NodeState, format_node_list};

use crate::application::ports::{
    ClusterRegistrar, ComputeGateway, NodeRepository, StorageCatalog,
};
use crate::application::services::adapter::{AddNodesRequest, ComputeAdapter};
use crate::application::services::launch_spec::{self, BatchLaunchArgs};
use crate::application::services::post_launch::{PostLaunch, after_launch};
use crate::application::services::poller::await_operation;
use crate::application::services::worker_pool::{MAX_WORKERS, run_pool};
use crate::application::services::{disks, node_ops};
use crate::domain::config::ResolvedConfig;
use crate::domain::error::ProvisionError;
use crate::domain::request::{ProvisionRequest, RequestStatus};

impl<G, N, S, R> ComputeAdapter<'_, G, N, S, R>
where
    G: ComputeGateway,
    N: NodeRepository,
    S: StorageCatalog,
    R: ClusterRegistrar,
{
    /// Provisions `request.count` nodes and returns the ones that launched.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::CommandFailed`] when no instance launched,
    /// or the error that aborted the batch after reconciliation ran.
    pub async fn provision_batch(
        &self,
        config: &ResolvedConfig,
        request: &AddNodesRequest,
    ) -> Result<Vec<Node>> {
        let nodes = self.create_node_records(config, request).await?;
        tracing::debug!(nodes = %format_node_list(&nodes), "initialized nodes");

        let mut requests = match build_requests(&nodes) {
            Ok(requests) => requests,
            Err(e) => {
                tracing::error!(error = %e, "error building node request queue");
                for node in &nodes {
                    self.discard_node(node).await;
                }
                self.nodes.commit().await?;
                return Err(e);
            }
        };

        let total = requests.len();
        if let Err(e) = self.launch_instances(config, request, &mut requests).await {
            self.reconcile(config, requests).await?;
            return Err(e);
        }

        let provisioned = self.reconcile(config, requests).await?;
        let completed = provisioned.len();
        if completed == 0 {
            return Err(ProvisionError::CommandFailed(format!(
                "Fatal error launching instances: none of {total} requested instances launched successfully"
            ))
            .into());
        }
        if completed < total {
            let message =
                format!("only {completed} of {total} requested instances launched successfully");
            tracing::warn!("{message}");
            self.reporter.warn(&message);
        } else {
            self.reporter
                .success(&format!("{completed} instance(s) launched successfully"));
        }
        Ok(provisioned)
    }

    async fn create_node_records(
        &self,
        config: &ResolvedConfig,
        request: &AddNodesRequest,
    ) -> Result<Vec<Node>> {
        let hardware = self.nodes.hardware_profile(&request.hardware_profile).await?;
        let software_name = request
            .software_profile
            .as_deref()
            .context("software profile is required")?;
        let software = self.nodes.software_profile(software_name).await?;

        tracing::info!(count = request.count, "creating nodes for mapping to compute instances");
        self.reporter
            .step(&format!("Creating {} node record(s)", request.count));

        let names = self
            .nodes
            .generate_node_names(&hardware, request.count, config.randomize_hostname)
            .await?;
        let nodes: Vec<Node> = names
            .iter()
            .map(|name| {
                let mut node = Node::new(name, &hardware.name, &software.name);
                node.vcpus = config.vcpus;
                node
            })
            .collect();

        self.nodes.add_nodes(&nodes).await?;
        self.nodes.commit().await?;
        Ok(nodes)
    }

    /// Builds and submits every request in order. The first failure aborts
    /// the loop; already submitted instances are left to reconciliation.
    async fn launch_instances(
        &self,
        config: &ResolvedConfig,
        add_request: &AddNodesRequest,
        requests: &mut [ProvisionRequest],
    ) -> Result<()> {
        let batch = launch_spec::batch_launch_args(self.gateway, config, &add_request.extra_args)
            .await?;

        for request in requests.iter_mut() {
            self.submit(config, add_request, &batch, request).await?;
        }

        let submitted: Vec<&mut ProvisionRequest> = requests
            .iter_mut()
            .filter(|r| r.status() == RequestStatus::Submitted)
            .collect();
        self.reporter
            .step(&format!("Waiting for {} instance(s) to launch", submitted.len()));
        run_pool(submitted, MAX_WORKERS, |request| {
            self.wait_for_instance(config, request)
        })
        .await;
        Ok(())
    }

    async fn submit(
        &self,
        config: &ResolvedConfig,
        add_request: &AddNodesRequest,
        batch: &BatchLaunchArgs,
        request: &mut ProvisionRequest,
    ) -> Result<()> {
        let instance_name = request.instance_name().to_string();

        let metadata = launch_spec::instance_metadata(self.fs, config, request.node())
            .with_context(|| format!("getting metadata for instance [{instance_name}]"))?;
        let disks = disks::provision(
            self.gateway,
            self.storage,
            config,
            request.node(),
            &instance_name,
        )
        .await?;
        let spec = launch_spec::build(config, &instance_name, batch, metadata, disks);

        self.reporter.step(&format!("Launching instance {instance_name}"));
        let placement = config.placement();
        let operation = match self.gateway.create_instance(&placement, &spec).await {
            Ok(operation) => operation,
            Err(e) => {
                disks::discard(self.gateway, &placement, spec.data_disks()).await;
                return Err(e).with_context(|| format!("Error launching instance [{instance_name}]"));
            }
        };

        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert(
            METADATA_ZONE.to_string(),
            operation.zone_name().unwrap_or(&config.zone).to_string(),
        );
        if batch.preemptible {
            metadata.insert(METADATA_SCHEDULING.to_string(), "preemptible".to_string());
        }
        request.node_mut().instance = Some(InstanceMapping {
            instance: instance_name,
            adapter_profile: add_request.adapter_profile().to_string(),
            metadata,
        });
        request.submit(operation)?;
        Ok(())
    }

    /// Waits for one submitted request and runs post-launch setup. Never
    /// fails: problems are recorded on the request.
    async fn wait_for_instance(&self, config: &ResolvedConfig, request: &mut ProvisionRequest) {
        let Some(operation) = request.operation().cloned() else {
            return;
        };
        let instance_name = request.instance_name().to_string();

        let done = match await_operation(
            self.gateway,
            &config.project,
            operation,
            config.polling_interval,
        )
        .await
        {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(instance = %instance_name, error = %e, "polling instance operation failed");
                mark_failed(request, e.to_string());
                return;
            }
        };

        let summary = done.error_summary();
        request.record_result(done);
        if let Some(summary) = summary {
            tracing::error!(instance = %instance_name, "compute backend error: \"{summary}\"");
            mark_failed(request, summary);
            return;
        }

        match after_launch(self.gateway, self.registrar, config, request).await {
            Ok(PostLaunch::Registered) => {
                if let Err(e) = request.succeed() {
                    tracing::error!(error = %e, "unexpected request state");
                }
            }
            Ok(PostLaunch::Vanished) => {}
            Err(e) => {
                let message = format!("Internal error: post-launch action for VM [{instance_name}]");
                tracing::error!(instance = %instance_name, error = %format!("{e:#}"), "{message}");
                mark_failed(request, format!("{message} ({e:#})"));

                let placement = node_ops::placement_for(config, request.node());
                match node_ops::delete_instance(self.gateway, &placement, &instance_name).await {
                    Ok(()) => request.mark_instance_deleted(),
                    Err(e) => tracing::error!(instance = %instance_name, error = %e, "cleanup delete failed"),
                }
            }
        }
    }

    /// Commits successful requests and rolls back the rest.
    async fn reconcile(
        &self,
        config: &ResolvedConfig,
        requests: Vec<ProvisionRequest>,
    ) -> Result<Vec<Node>> {
        let mut provisioned = Vec::new();

        for request in requests {
            if request.status() == RequestStatus::Success {
                let mut node = request.into_node();
                node.state = NodeState::Provisioned;
                if let Err(e) = self.nodes.update_node(&node).await {
                    tracing::error!(node = %node.name, error = %format!("{e:#}"), "updating node record failed");
                }
                if let Err(e) = self.registrar.node_provisioned(&node).await {
                    tracing::error!(node = %node.name, error = %format!("{e:#}"), "provisioned notification failed");
                }
                provisioned.push(node);
                continue;
            }

            tracing::error!(
                instance = %request.instance_name(),
                node = %request.node().name,
                message = request.message().unwrap_or_default(),
                "cleaning up failed instance"
            );
            if request.has_instance() {
                let placement = node_ops::placement_for(config, request.node());
                if let Err(e) =
                    node_ops::delete_instance(self.gateway, &placement, request.instance_name()).await
                {
                    tracing::error!(instance = %request.instance_name(), error = %e, "rollback delete failed");
                }
            }
            self.discard_node(request.node()).await;
        }

        self.nodes.commit().await?;
        Ok(provisioned)
    }

    /// Releases catalogue entries and deletes the node record. Errors are
    /// logged so the remaining cleanup still runs.
    async fn discard_node(&self, node: &Node) {
        if let Err(e) = disks::release(self.storage, node).await {
            tracing::error!(node = %node.name, error = %format!("{e:#}"), "releasing storage failed");
        }
        if let Err(e) = self.nodes.delete_node(&node.name).await {
            tracing::error!(node = %node.name, error = %format!("{e:#}"), "deleting node record failed");
        }
    }
}

fn build_requests(nodes: &[Node]) -> Result<Vec<ProvisionRequest>> {
    nodes
        .iter()
        .cloned()
        .map(|node| ProvisionRequest::new(node).map_err(anyhow::Error::from))
        .collect()
}

fn mark_failed(request: &mut ProvisionRequest, message: String) {
    if let Err(e) = request.fail(message) {
        tracing::error!(error = %e, "unexpected request state");
    }
}
