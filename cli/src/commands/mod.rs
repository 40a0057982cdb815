//! Command implementations

pub mod add_nodes;
pub mod config;
pub mod delete_nodes;
pub mod nodes;
pub mod power;

use anyhow::Result;
use nodefleet_common::Node;

use crate::application::ports::NodeRepository;

/// Fetches the records of `names`, failing on the first unknown node.
///
/// # Errors
///
/// Returns [`crate::domain::RecordError::NodeNotFound`] for an unknown name.
pub async fn lookup_nodes(repo: &impl NodeRepository, names: &[String]) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(names.len());
    for name in names {
        nodes.push(repo.get_node(name).await?);
    }
    Ok(nodes)
}
