//! `nodefleet reboot|shutdown|startup`: power operations on existing nodes.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ResourceAdapter;
use crate::commands::lookup_nodes;
use crate::infra::gateway::DEFAULT_REQUEST_TIMEOUT;

/// Arguments shared by the power commands.
#[derive(Args, Debug, Clone)]
pub struct PowerArgs {
    /// Node names
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Which power operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Reset and wait for completion.
    Reboot,
    Shutdown,
    Startup,
}

impl PowerAction {
    fn past_tense(self) -> &'static str {
        match self {
            Self::Reboot => "Rebooted",
            Self::Shutdown => "Shutdown requested for",
            Self::Startup => "Startup requested for",
        }
    }
}

/// Run a power command.
///
/// # Errors
///
/// Returns an error if a node is unknown or the backend rejects a request.
pub async fn run(app: &AppContext, action: PowerAction, args: &PowerArgs) -> Result<()> {
    let nodes = lookup_nodes(&app.store, &args.names).await?;

    let gateway = app.gateway(DEFAULT_REQUEST_TIMEOUT)?;
    let reporter = app.reporter();
    let adapter = app.adapter(&gateway, &reporter);

    match action {
        PowerAction::Reboot => adapter.reboot_nodes(&nodes).await?,
        PowerAction::Shutdown => adapter.shutdown_nodes(&nodes).await?,
        PowerAction::Startup => adapter.startup_nodes(&nodes).await?,
    }

    app.output
        .success(&format!("{} {} node(s)", action.past_tense(), nodes.len()));
    Ok(())
}
