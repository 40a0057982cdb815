//! `nodefleet add-nodes`: provision a batch of nodes.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::adapter::resolve_profile;
use crate::application::{AddNodesRequest, ResourceAdapter};
use crate::output::HumanRenderer;

/// Arguments for the add-nodes command.
#[derive(Args, Debug, Clone)]
pub struct AddNodesArgs {
    /// Number of nodes to provision
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,

    /// Hardware profile naming the nodes
    #[arg(long)]
    pub hardware_profile: String,

    /// Software profile installed on the nodes
    #[arg(long)]
    pub software_profile: Option<String>,

    /// Adapter configuration profile [default: default]
    #[arg(long)]
    pub adapter_profile: Option<String>,

    /// Extra adapter argument as `key[=value]`, e.g. `preemptible`
    #[arg(long = "extra-arg", value_name = "KEY[=VALUE]")]
    pub extra_args: Vec<String>,
}

impl AddNodesArgs {
    /// Converts the arguments to a provisioning request.
    ///
    /// # Errors
    ///
    /// Returns an error if the count is zero or an extra argument has an
    /// empty key.
    pub fn to_request(&self) -> Result<AddNodesRequest> {
        if self.count == 0 {
            bail!("--count must be at least 1");
        }
        Ok(AddNodesRequest {
            count: self.count,
            hardware_profile: self.hardware_profile.clone(),
            software_profile: self.software_profile.clone(),
            adapter_profile: self.adapter_profile.clone(),
            extra_args: parse_extra_args(&self.extra_args)?,
        })
    }
}

/// Parses `key[=value]` pairs. A bare key maps to an empty value.
///
/// # Errors
///
/// Returns an error if a key is empty.
pub fn parse_extra_args(args: &[String]) -> Result<BTreeMap<String, String>> {
    args.iter()
        .map(|arg| {
            let (key, value) = arg.split_once('=').unwrap_or((arg.as_str(), ""));
            let key = key.trim();
            if key.is_empty() {
                bail!("invalid extra argument '{arg}': key must not be empty");
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Run `nodefleet add-nodes`.
///
/// # Errors
///
/// Returns an error if the profile is invalid or no instance launched.
pub async fn run(app: &AppContext, args: &AddNodesArgs) -> Result<()> {
    let request = args.to_request()?;
    let config = resolve_profile(&app.profiles, request.adapter_profile())?;

    let gateway = app.gateway(config.create_timeout)?;
    let reporter = app.reporter();
    let adapter = app.adapter(&gateway, &reporter);

    let nodes = adapter.start(&request).await?;
    HumanRenderer::new(&app.output).render_nodes(&nodes);
    Ok(())
}
