//! `nodefleet nodes`: list node records.

use anyhow::Result;
use clap::Args;
use nodefleet_common::{Node, NodeState};

use crate::app::AppContext;
use crate::application::ports::NodeRepository;
use crate::output::{HumanRenderer, JsonRenderer};

/// Arguments for the nodes command.
#[derive(Args, Debug, Clone, Default)]
pub struct NodesArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Only show nodes in this state
    #[arg(long, value_enum)]
    pub state: Option<NodeState>,
}

/// Run `nodefleet nodes`.
///
/// # Errors
///
/// Returns an error if the fleet file cannot be read or serialized.
pub async fn run(app: &AppContext, args: &NodesArgs) -> Result<()> {
    let nodes = filter_nodes(app.store.list_nodes().await?, args.state);
    if args.json {
        JsonRenderer.render_nodes(&nodes)
    } else {
        HumanRenderer::new(&app.output).render_nodes(&nodes);
        Ok(())
    }
}

fn filter_nodes(nodes: Vec<Node>, state: Option<NodeState>) -> Vec<Node> {
    match state {
        Some(state) => nodes.into_iter().filter(|n| n.state == state).collect(),
        None => nodes,
    }
}
