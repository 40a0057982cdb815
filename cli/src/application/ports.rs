//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the common crate, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;
use nodefleet_common::{DiskChanges, HardwareProfile, Node, SoftwareProfile, StorageDisk};

use crate::domain::config::AdapterConfig;
use crate::domain::error::GatewayError;
use crate::domain::launch::{DiskSpec, LaunchSpec, Placement};
use crate::domain::operation::{Instance, Operation};

// ── Compute Gateway Port ──────────────────────────────────────────────────────

/// Calls against the compute backend.
///
/// A `404` from `get_instance` or `delete_instance` means the instance is
/// already absent; callers check [`GatewayError::is_not_found`].
#[allow(async_fn_in_trait)]
pub trait ComputeGateway {
    /// Submit an instance creation.
    async fn create_instance(
        &self,
        placement: &Placement,
        spec: &LaunchSpec,
    ) -> Result<Operation, GatewayError>;
    /// Submit a persistent disk creation.
    async fn create_disk(
        &self,
        placement: &Placement,
        disk: &DiskSpec,
        disk_type: &str,
    ) -> Result<Operation, GatewayError>;
    /// Submit a persistent disk deletion.
    async fn delete_disk(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError>;
    /// Fetch an operation. Zonal when `zone` is set, otherwise global.
    async fn get_operation(
        &self,
        project: &str,
        name: &str,
        zone: Option<&str>,
    ) -> Result<Operation, GatewayError>;
    async fn get_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Instance, GatewayError>;
    async fn delete_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError>;
    async fn reset_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError>;
    async fn stop_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError>;
    async fn start_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError>;
    /// Self link of the image `name` in `project`.
    async fn image_by_name(&self, project: &str, name: &str) -> Result<String, GatewayError>;
    /// Self link of the newest image of `family` in `project`.
    async fn image_from_family(&self, project: &str, family: &str)
    -> Result<String, GatewayError>;
}

// ── Record Ports ──────────────────────────────────────────────────────────────

/// Persistent node records and profiles.
///
/// Mutations are staged until [`NodeRepository::commit`].
#[allow(async_fn_in_trait)]
pub trait NodeRepository {
    async fn hardware_profile(&self, name: &str) -> Result<HardwareProfile>;
    async fn software_profile(&self, name: &str) -> Result<SoftwareProfile>;
    /// Generate `count` unused node names for `profile`.
    async fn generate_node_names(
        &self,
        profile: &HardwareProfile,
        count: usize,
        randomize: bool,
    ) -> Result<Vec<String>>;
    async fn add_nodes(&self, nodes: &[Node]) -> Result<()>;
    async fn update_node(&self, node: &Node) -> Result<()>;
    async fn delete_node(&self, name: &str) -> Result<()>;
    async fn get_node(&self, name: &str) -> Result<Node>;
    async fn list_nodes(&self) -> Result<Vec<Node>>;
    /// Persist all staged mutations at once.
    async fn commit(&self) -> Result<()>;
}

/// Block storage catalogue.
#[allow(async_fn_in_trait)]
pub trait StorageCatalog {
    /// Disks `node` should gain, or lose when `removing`.
    async fn discover_changes(&self, node: &Node, removing: bool) -> Result<DiskChanges>;
    async fn add_drive(&self, node: &Node, index: u32, disk: &StorageDisk) -> Result<()>;
    async fn delete_drive(&self, node: &Node, index: u32) -> Result<()>;
}

// ── Cluster Registration Port ─────────────────────────────────────────────────

/// A running node handed to the cluster manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRegistration {
    pub name: String,
    pub hardware_profile: String,
    pub software_profile: String,
    pub ip: String,
}

/// Cluster manager callbacks.
#[allow(async_fn_in_trait)]
pub trait ClusterRegistrar {
    /// Register a node whose instance is running.
    async fn pre_add_host(&self, host: &HostRegistration) -> Result<()>;
    /// Notify that a node was committed as provisioned.
    async fn node_provisioned(&self, node: &Node) -> Result<()>;
}

// ── Configuration and Filesystem Ports ────────────────────────────────────────

/// Lookup of adapter configuration profiles.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigProfiles {
    /// Raw settings of profile `name`.
    fn profile(&self, name: &str) -> Result<AdapterConfig>;
    /// Names of all configured profiles.
    fn profile_names(&self) -> Result<Vec<String>>;
}

/// Read access to optional local files.
pub trait LocalFs {
    /// Contents of `path`, or `None` when it does not exist.
    fn read_optional(&self, path: &Path) -> Result<Option<String>>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
