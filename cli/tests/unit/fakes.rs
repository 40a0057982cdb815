//! In-memory fakes for every application port.
//!
//! Each fake records the calls it receives so tests can assert on ordering
//! and completeness without any network or filesystem I/O.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use nodefleet_cli::application::ports::{
    ClusterRegistrar, ComputeGateway, ConfigProfiles, HostRegistration, LocalFs, NodeRepository,
    ProgressReporter, StorageCatalog,
};
use nodefleet_cli::application::ComputeAdapter;
use nodefleet_cli::domain::config::AdapterConfig;
use nodefleet_cli::domain::error::{GatewayError, RecordError};
use nodefleet_cli::domain::launch::{DiskSpec, LaunchSpec, Placement};
use nodefleet_cli::domain::operation::{
    Instance, InstanceNetworkInterface, Operation, OperationError, OperationErrorEntry,
    OperationStatus,
};
use nodefleet_common::{
    DEFAULT_STORAGE_ADAPTER, DiskChanges, DiskRequirement, HardwareProfile, Node, SoftwareProfile,
    StorageDisk, expand_name_format,
};

pub const PROJECT: &str = "fleet-project";
pub const ZONE: &str = "us-east1-b";

// ── Operation helpers ────────────────────────────────────────────────────────

pub fn zone_url(zone: &str) -> String {
    format!("https://www.googleapis.com/compute/v1/projects/{PROJECT}/zones/{zone}")
}

pub fn done_op(name: &str) -> Operation {
    Operation {
        name: name.to_string(),
        status: OperationStatus::Done,
        zone: Some(zone_url(ZONE)),
        target_link: None,
        error: None,
    }
}

pub fn running_op(name: &str) -> Operation {
    Operation {
        status: OperationStatus::Running,
        ..done_op(name)
    }
}

pub fn failed_op(name: &str, message: &str) -> Operation {
    Operation {
        error: Some(OperationError {
            errors: vec![OperationErrorEntry {
                code: "QUOTA_EXCEEDED".to_string(),
                message: message.to_string(),
            }],
        }),
        ..done_op(name)
    }
}

fn not_found(what: &str) -> GatewayError {
    GatewayError::Status {
        status: 404,
        message: format!("The resource '{what}' was not found"),
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────────

/// How the fake backend treats one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceBehaviour {
    /// Launches and reports an internal IP.
    Healthy,
    /// The insert call itself is rejected.
    RejectCreate,
    /// The operation completes with an error payload.
    OperationError(String),
    /// The instance is gone by the time it is described.
    Vanish,
    /// The instance has no network address.
    NoIp,
}

#[derive(Default)]
pub struct FakeGateway {
    /// Every call as `method:argument`, in order.
    pub calls: RefCell<Vec<String>>,
    pub launched: RefCell<Vec<(Placement, LaunchSpec)>>,
    pub behaviours: RefCell<BTreeMap<String, InstanceBehaviour>>,
    /// `RUNNING` responses returned before an operation reports `DONE`.
    pub pending_polls: Cell<usize>,
    pub image_error: Cell<bool>,
    /// Instance names whose delete returns 404.
    pub missing: RefCell<BTreeSet<String>>,
    pub delete_error: Cell<bool>,
    pub disk_error: Cell<bool>,
    /// Disk names whose creation reports an operation error.
    pub failing_disks: RefCell<BTreeSet<String>>,
    pub reset_error: Cell<bool>,
    polls: RefCell<BTreeMap<String, usize>>,
}

impl FakeGateway {
    pub fn with_behaviour(self, instance: &str, behaviour: InstanceBehaviour) -> Self {
        self.behaviours
            .borrow_mut()
            .insert(instance.to_string(), behaviour);
        self
    }

    fn behaviour(&self, instance: &str) -> InstanceBehaviour {
        self.behaviours
            .borrow()
            .get(instance)
            .cloned()
            .unwrap_or(InstanceBehaviour::Healthy)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    /// Calls whose method matches `method`, argument only.
    pub fn calls_to(&self, method: &str) -> Vec<String> {
        let prefix = format!("{method}:");
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    fn pending_or_done(&self, op: Operation) -> Operation {
        if self.pending_polls.get() > 0 {
            Operation {
                status: OperationStatus::Running,
                ..op
            }
        } else {
            op
        }
    }
}

impl ComputeGateway for FakeGateway {
    async fn create_instance(
        &self,
        placement: &Placement,
        spec: &LaunchSpec,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("create_instance:{}", spec.name));
        if self.behaviour(&spec.name) == InstanceBehaviour::RejectCreate {
            return Err(GatewayError::Status {
                status: 400,
                message: "Invalid value for field 'resource.machineType'".to_string(),
            });
        }
        self.launched
            .borrow_mut()
            .push((placement.clone(), spec.clone()));
        let name = format!("op-insert-{}", spec.name);
        let op = match self.behaviour(&spec.name) {
            InstanceBehaviour::OperationError(message) => failed_op(&name, &message),
            _ => done_op(&name),
        };
        Ok(self.pending_or_done(op))
    }

    async fn create_disk(
        &self,
        _placement: &Placement,
        disk: &DiskSpec,
        _disk_type: &str,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("create_disk:{}", disk.name));
        if self.disk_error.get() || self.failing_disks.borrow().contains(&disk.name) {
            return Ok(failed_op(&format!("op-disk-{}", disk.name), "disk quota"));
        }
        Ok(Operation {
            target_link: Some(format!("{}/disks/{}", zone_url(ZONE), disk.name)),
            ..done_op(&format!("op-disk-{}", disk.name))
        })
    }

    async fn delete_disk(
        &self,
        _placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("delete_disk:{name}"));
        if self.delete_error.get() {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(running_op(&format!("op-delete-disk-{name}")))
    }

    async fn get_operation(
        &self,
        project: &str,
        name: &str,
        zone: Option<&str>,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("get_operation:{name}"));
        assert_eq!(project, PROJECT);

        let mut polls = self.polls.borrow_mut();
        let seen = polls.entry(name.to_string()).or_default();
        *seen += 1;

        let mut op = done_op(name);
        op.zone = zone.map(zone_url);
        if *seen < self.pending_polls.get() {
            op.status = OperationStatus::Running;
            return Ok(op);
        }
        if let Some(instance) = name.strip_prefix("op-insert-") {
            if let InstanceBehaviour::OperationError(message) = self.behaviour(instance) {
                return Ok(failed_op(name, &message));
            }
        }
        Ok(op)
    }

    async fn get_instance(
        &self,
        _placement: &Placement,
        name: &str,
    ) -> Result<Instance, GatewayError> {
        self.record(format!("get_instance:{name}"));
        let index = self
            .launched
            .borrow()
            .iter()
            .position(|(_, spec)| spec.name == name)
            .ok_or_else(|| not_found(name))?;
        let network_ip = match self.behaviour(name) {
            InstanceBehaviour::Vanish => return Err(not_found(name)),
            InstanceBehaviour::NoIp => None,
            _ => Some(format!("10.0.0.{}", index + 2)),
        };
        Ok(Instance {
            name: name.to_string(),
            status: "RUNNING".to_string(),
            network_interfaces: vec![InstanceNetworkInterface { network_ip }],
        })
    }

    async fn delete_instance(
        &self,
        placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("delete_instance:{name}@{}", placement.zone));
        if self.missing.borrow().contains(name) {
            return Err(not_found(name));
        }
        if self.delete_error.get() {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(running_op(&format!("op-delete-{name}")))
    }

    async fn reset_instance(
        &self,
        _placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("reset_instance:{name}"));
        if self.missing.borrow().contains(name) {
            return Err(not_found(name));
        }
        if self.reset_error.get() {
            return Err(GatewayError::Status {
                status: 500,
                message: "backend error".to_string(),
            });
        }
        Ok(self.pending_or_done(done_op(&format!("op-reset-{name}"))))
    }

    async fn stop_instance(
        &self,
        _placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("stop_instance:{name}"));
        Ok(running_op(&format!("op-stop-{name}")))
    }

    async fn start_instance(
        &self,
        _placement: &Placement,
        name: &str,
    ) -> Result<Operation, GatewayError> {
        self.record(format!("start_instance:{name}"));
        Ok(running_op(&format!("op-start-{name}")))
    }

    async fn image_by_name(&self, project: &str, name: &str) -> Result<String, GatewayError> {
        self.record(format!("image_by_name:{project}/{name}"));
        if self.image_error.get() {
            return Err(not_found(name));
        }
        Ok(format!("https://www.googleapis.com/compute/v1/projects/{project}/global/images/{name}"))
    }

    async fn image_from_family(
        &self,
        project: &str,
        family: &str,
    ) -> Result<String, GatewayError> {
        self.record(format!("image_from_family:{project}/{family}"));
        if self.image_error.get() {
            return Err(not_found(family));
        }
        Ok(format!(
            "https://www.googleapis.com/compute/v1/projects/{project}/global/images/{family}-v1"
        ))
    }
}

// ── Node repository and storage catalogue ────────────────────────────────────

/// Node records with staged and committed views, plus a disk catalogue.
pub struct FakeRepo {
    pub hardware: BTreeMap<String, HardwareProfile>,
    pub software: BTreeMap<String, SoftwareProfile>,
    pub staged: RefCell<BTreeMap<String, Node>>,
    pub committed: RefCell<BTreeMap<String, Node>>,
    pub commits: Cell<usize>,
    pub drives: RefCell<BTreeMap<(String, u32), StorageDisk>>,
    pub released: RefCell<Vec<(String, u32)>>,
    counter: Cell<u64>,
}

impl Default for FakeRepo {
    fn default() -> Self {
        let mut hardware = BTreeMap::new();
        hardware.insert(
            "compute".to_string(),
            HardwareProfile {
                name: "compute".to_string(),
                name_format: "compute-#NN".to_string(),
            },
        );
        let mut software = BTreeMap::new();
        software.insert(
            "centos".to_string(),
            SoftwareProfile {
                name: "centos".to_string(),
                disks: vec![
                    disk(3, 100_000, DEFAULT_STORAGE_ADAPTER),
                    disk(1, 30_000, DEFAULT_STORAGE_ADAPTER),
                    disk(2, 50_000, DEFAULT_STORAGE_ADAPTER),
                    disk(4, 10_000, "iscsi"),
                ],
            },
        );
        software.insert(
            "minimal".to_string(),
            SoftwareProfile {
                name: "minimal".to_string(),
                disks: Vec::new(),
            },
        );
        Self {
            hardware,
            software,
            staged: RefCell::new(BTreeMap::new()),
            committed: RefCell::new(BTreeMap::new()),
            commits: Cell::new(0),
            drives: RefCell::new(BTreeMap::new()),
            released: RefCell::new(Vec::new()),
            counter: Cell::new(0),
        }
    }
}

fn disk(index: u32, size_mb: u64, adapter: &str) -> DiskRequirement {
    DiskRequirement {
        index,
        size_mb,
        adapter: adapter.to_string(),
    }
}

impl FakeRepo {
    pub fn with_hardware(mut self, name: &str, name_format: &str) -> Self {
        self.hardware.insert(
            name.to_string(),
            HardwareProfile {
                name: name.to_string(),
                name_format: name_format.to_string(),
            },
        );
        self
    }

    /// Seeds a committed node.
    pub fn with_node(self, node: Node) -> Self {
        self.staged
            .borrow_mut()
            .insert(node.name.clone(), node.clone());
        self.committed.borrow_mut().insert(node.name.clone(), node);
        self
    }

    pub fn committed_names(&self) -> Vec<String> {
        self.committed.borrow().keys().cloned().collect()
    }

    pub fn committed_node(&self, name: &str) -> Node {
        self.committed.borrow()[name].clone()
    }

    pub fn drive_count(&self, node: &str) -> usize {
        self.drives
            .borrow()
            .keys()
            .filter(|(n, _)| n == node)
            .count()
    }
}

impl NodeRepository for FakeRepo {
    async fn hardware_profile(&self, name: &str) -> Result<HardwareProfile> {
        self.hardware
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::HardwareProfileNotFound(name.to_string()).into())
    }

    async fn software_profile(&self, name: &str) -> Result<SoftwareProfile> {
        self.software
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::SoftwareProfileNotFound(name.to_string()).into())
    }

    async fn generate_node_names(
        &self,
        profile: &HardwareProfile,
        count: usize,
        _randomize: bool,
    ) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(count);
        while names.len() < count {
            self.counter.set(self.counter.get() + 1);
            let name = expand_name_format(&profile.name_format, self.counter.get());
            if !self.staged.borrow().contains_key(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn add_nodes(&self, nodes: &[Node]) -> Result<()> {
        let mut staged = self.staged.borrow_mut();
        for node in nodes {
            staged.insert(node.name.clone(), node.clone());
        }
        Ok(())
    }

    async fn update_node(&self, node: &Node) -> Result<()> {
        let mut staged = self.staged.borrow_mut();
        let Some(slot) = staged.get_mut(&node.name) else {
            bail!(RecordError::NodeNotFound(node.name.clone()));
        };
        *slot = node.clone();
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<()> {
        self.staged
            .borrow_mut()
            .remove(name)
            .map(drop)
            .ok_or_else(|| RecordError::NodeNotFound(name.to_string()).into())
    }

    async fn get_node(&self, name: &str) -> Result<Node> {
        self.staged
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::NodeNotFound(name.to_string()).into())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.staged.borrow().values().cloned().collect())
    }

    async fn commit(&self) -> Result<()> {
        *self.committed.borrow_mut() = self.staged.borrow().clone();
        self.commits.set(self.commits.get() + 1);
        Ok(())
    }
}

impl StorageCatalog for FakeRepo {
    async fn discover_changes(&self, node: &Node, removing: bool) -> Result<DiskChanges> {
        let drives = self.drives.borrow();
        if removing {
            let removed = drives
                .iter()
                .filter(|((n, _), _)| *n == node.name)
                .map(|((_, index), disk)| (*index, disk.clone()))
                .collect();
            return Ok(DiskChanges {
                added: BTreeMap::new(),
                removed,
            });
        }
        let profile = self
            .software
            .get(&node.software_profile)
            .ok_or_else(|| RecordError::SoftwareProfileNotFound(node.software_profile.clone()))?;
        let added = profile
            .disks
            .iter()
            .filter(|d| !drives.contains_key(&(node.name.clone(), d.index)))
            .map(|d| {
                (
                    d.index,
                    StorageDisk {
                        adapter: d.adapter.clone(),
                        size_mb: d.size_mb,
                        san_volume: None,
                    },
                )
            })
            .collect();
        Ok(DiskChanges {
            added,
            removed: BTreeMap::new(),
        })
    }

    async fn add_drive(&self, node: &Node, index: u32, disk: &StorageDisk) -> Result<()> {
        self.drives
            .borrow_mut()
            .insert((node.name.clone(), index), disk.clone());
        Ok(())
    }

    async fn delete_drive(&self, node: &Node, index: u32) -> Result<()> {
        self.drives.borrow_mut().remove(&(node.name.clone(), index));
        self.released.borrow_mut().push((node.name.clone(), index));
        Ok(())
    }
}

// ── Registrar ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeRegistrar {
    pub registered: RefCell<Vec<HostRegistration>>,
    pub provisioned: RefCell<Vec<String>>,
    /// Node names whose registration fails.
    pub reject: RefCell<BTreeSet<String>>,
}

impl ClusterRegistrar for FakeRegistrar {
    async fn pre_add_host(&self, host: &HostRegistration) -> Result<()> {
        if self.reject.borrow().contains(&host.name) {
            bail!("cluster refused {}", host.name);
        }
        self.registered.borrow_mut().push(host.clone());
        Ok(())
    }

    async fn node_provisioned(&self, node: &Node) -> Result<()> {
        self.provisioned.borrow_mut().push(node.name.clone());
        Ok(())
    }
}

// ── Config, filesystem, reporter ─────────────────────────────────────────────

pub fn adapter_config() -> AdapterConfig {
    AdapterConfig {
        zone: Some(ZONE.to_string()),
        project: Some(PROJECT.to_string()),
        machine_type: Some("n1-standard-2".to_string()),
        image: Some("centos-7".to_string()),
        sleeptime: 1,
        ..AdapterConfig::default()
    }
}

pub struct FakeProfiles {
    pub profiles: BTreeMap<String, AdapterConfig>,
}

impl Default for FakeProfiles {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("default".to_string(), adapter_config());
        Self { profiles }
    }
}

impl FakeProfiles {
    pub fn with(mut self, name: &str, config: AdapterConfig) -> Self {
        self.profiles.insert(name.to_string(), config);
        self
    }
}

impl ConfigProfiles for FakeProfiles {
    fn profile(&self, name: &str) -> Result<AdapterConfig> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::AdapterProfileNotFound(name.to_string()).into())
    }

    fn profile_names(&self) -> Result<Vec<String>> {
        Ok(self.profiles.keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeFs {
    pub files: BTreeMap<PathBuf, String>,
}

impl FakeFs {
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.to_string());
        self
    }
}

impl LocalFs for FakeFs {
    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub steps: RefCell<Vec<String>>,
    pub successes: RefCell<Vec<String>>,
    pub warnings: RefCell<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.borrow_mut().push(message.to_string());
    }
    fn success(&self, message: &str) {
        self.successes.borrow_mut().push(message.to_string());
    }
    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// All fakes plus an adapter over them.
#[derive(Default)]
pub struct Harness {
    pub gateway: FakeGateway,
    pub repo: FakeRepo,
    pub registrar: FakeRegistrar,
    pub profiles: FakeProfiles,
    pub fs: FakeFs,
    pub reporter: RecordingReporter,
}

impl Harness {
    pub fn adapter(&self) -> ComputeAdapter<'_, FakeGateway, FakeRepo, FakeRepo, FakeRegistrar> {
        ComputeAdapter {
            gateway: &self.gateway,
            nodes: &self.repo,
            storage: &self.repo,
            registrar: &self.registrar,
            profiles: &self.profiles,
            fs: &self.fs,
            reporter: &self.reporter,
        }
    }
}
