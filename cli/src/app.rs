//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is constructed once in `Cli::run()` and owns the output
//! context and every production port implementation. Commands borrow what
//! they need and assemble a [`ComputeAdapter`] per invocation.

use std::time::Duration;

use anyhow::Result;

use crate::application::ComputeAdapter;
use crate::infra::command_runner::{DEFAULT_HOOK_TIMEOUT, TokioCommandRunner};
use crate::infra::config::YamlConfigProfiles;
use crate::infra::fs::StdFs;
use crate::infra::gateway::HttpComputeGateway;
use crate::infra::node_store::JsonNodeStore;
use crate::infra::registrar::HookRegistrar;
use crate::output::{OutputContext, TerminalReporter};

/// Adapter wired to the production ports.
pub type FleetAdapter<'a> = ComputeAdapter<
    'a,
    HttpComputeGateway,
    JsonNodeStore,
    JsonNodeStore,
    HookRegistrar<TokioCommandRunner>,
>;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Compute API connection settings.
pub struct ApiFlags {
    pub url: String,
    /// Bearer token; requests are unauthenticated when unset.
    pub access_token: Option<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub api: ApiFlags,
    /// Command run for each node once its instance is up.
    pub pre_add_host_hook: Option<String>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    pub profiles: YamlConfigProfiles,
    pub store: JsonNodeStore,
    pub registrar: HookRegistrar<TokioCommandRunner>,
    pub fs: StdFs,
    api: ApiFlags,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// fleet file cannot be parsed.
    pub fn new(flags: AppFlags) -> Result<Self> {
        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            profiles: YamlConfigProfiles::from_env()?,
            store: JsonNodeStore::open_default()?,
            registrar: HookRegistrar::new(
                TokioCommandRunner::new(DEFAULT_HOOK_TIMEOUT),
                flags.pre_add_host_hook,
            ),
            fs: StdFs,
            api: flags.api,
        })
    }

    /// Compute API client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn gateway(&self, timeout: Duration) -> Result<HttpComputeGateway> {
        HttpComputeGateway::new(&self.api.url, self.api.access_token.clone(), timeout)
    }

    /// Terminal reporter over this context's output.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Adapter over the production ports and `gateway`.
    #[must_use]
    pub fn adapter<'a>(
        &'a self,
        gateway: &'a HttpComputeGateway,
        reporter: &'a TerminalReporter<'a>,
    ) -> FleetAdapter<'a> {
        ComputeAdapter {
            gateway,
            nodes: &self.store,
            storage: &self.store,
            registrar: &self.registrar,
            profiles: &self.profiles,
            fs: &self.fs,
            reporter,
        }
    }
}
