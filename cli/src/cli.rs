//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{ApiFlags, AppContext, AppFlags, OutputFlags};
use crate::commands;
use crate::commands::power::PowerAction;
use crate::infra::gateway::DEFAULT_API_URL;

/// Batch provisioning of cluster nodes on a cloud compute backend
#[derive(Parser)]
#[command(
    name = "nodefleet",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Compute API base URL
    #[arg(long, global = true, env = "NODEFLEET_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Bearer token for the compute API
    #[arg(long, global = true, env = "NODEFLEET_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Command run as `<hook> <name> <hardware> <software> <ip>` for each launched node
    #[arg(long, global = true, env = "NODEFLEET_PRE_ADD_HOST_HOOK")]
    pub pre_add_host_hook: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision a batch of nodes
    AddNodes(commands::add_nodes::AddNodesArgs),

    /// Delete nodes and their instances
    DeleteNodes(commands::delete_nodes::DeleteNodesArgs),

    /// Reset node instances and wait for completion
    Reboot(commands::power::PowerArgs),

    /// Stop node instances
    Shutdown(commands::power::PowerArgs),

    /// Start node instances
    Startup(commands::power::PowerArgs),

    /// List node records
    Nodes(commands::nodes::NodesArgs),

    /// Inspect adapter configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            quiet,
            no_color,
            verbose: _,
            api_url,
            access_token,
            pre_add_host_hook,
            command,
        } = self;

        let app = AppContext::new(AppFlags {
            output: OutputFlags { no_color, quiet },
            api: ApiFlags {
                url: api_url,
                access_token,
            },
            pre_add_host_hook,
        })?;

        match command {
            Command::AddNodes(args) => commands::add_nodes::run(&app, &args).await?,
            Command::DeleteNodes(args) => commands::delete_nodes::run(&app, &args).await?,
            Command::Reboot(args) => commands::power::run(&app, PowerAction::Reboot, &args).await?,
            Command::Shutdown(args) => {
                commands::power::run(&app, PowerAction::Shutdown, &args).await?;
            }
            Command::Startup(args) => {
                commands::power::run(&app, PowerAction::Startup, &args).await?;
            }
            Command::Nodes(args) => commands::nodes::run(&app, &args).await?,
            Command::Config(cmd) => return commands::config::run(&app, &cmd),
        }
        Ok(ExitCode::SUCCESS)
    }
}
