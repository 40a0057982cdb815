//! `nodefleet config`: inspect adapter configuration profiles.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigProfiles;
use crate::application::services::adapter::resolve_profile;
use crate::output::HumanRenderer;

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Validate adapter profiles
    Check {
        /// Profile to validate; all profiles when omitted
        profile: Option<String>,
    },
    /// Print the path of the adapter profiles file
    Path,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the profiles file cannot be read.
pub fn run(app: &AppContext, cmd: &ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Check { profile } => check(app, &app.profiles, profile.as_deref()),
        ConfigCommand::Path => {
            println!("{}", app.profiles.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(app: &AppContext, profiles: &dyn ConfigProfiles, only: Option<&str>) -> Result<ExitCode> {
    let names = match only {
        Some(name) => vec![name.to_string()],
        None => profiles.profile_names()?,
    };
    if names.is_empty() {
        app.output.warn("No adapter profiles configured");
        return Ok(ExitCode::FAILURE);
    }

    let renderer = HumanRenderer::new(&app.output);
    let mut all_valid = true;
    for name in &names {
        match resolve_profile(profiles, name) {
            Ok(config) => renderer.render_profile(&config),
            Err(e) => {
                all_valid = false;
                renderer.render_profile_error(name, &e);
            }
        }
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
