//! `nodefleet delete-nodes`: delete instances and remove node records.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::NodeRepository;
use crate::application::ResourceAdapter;
use crate::commands::lookup_nodes;
use crate::infra::gateway::DEFAULT_REQUEST_TIMEOUT;

/// Arguments for the delete-nodes command.
#[derive(Args, Debug, Clone)]
pub struct DeleteNodesArgs {
    /// Node names to delete
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Run `nodefleet delete-nodes`.
///
/// Records are removed only after every instance delete was accepted.
///
/// # Errors
///
/// Returns an error if a node is unknown or an instance delete fails.
pub async fn run(app: &AppContext, args: &DeleteNodesArgs) -> Result<()> {
    let nodes = lookup_nodes(&app.store, &args.names).await?;

    let gateway = app.gateway(DEFAULT_REQUEST_TIMEOUT)?;
    let reporter = app.reporter();
    app.adapter(&gateway, &reporter).delete_nodes(&nodes).await?;

    for node in &nodes {
        app.store.delete_node(&node.name).await?;
    }
    app.store.commit().await?;

    app.output
        .success(&format!("Deleted {} node(s)", nodes.len()));
    Ok(())
}
