//! Instance launch specification types and backend resource URLs.

use serde::{Deserialize, Serialize};

use crate::domain::error::ProvisionError;
use crate::domain::network::NetworkInterfaceSpec;

/// Prefix of fully qualified compute resource URLs.
pub const COMPUTE_API_URL: &str = "https://www.googleapis.com/compute/v1/projects/";

/// Network tag applied to every instance launched by nodefleet.
pub const INSTANCE_TAG: &str = "nodefleet";

/// Project and zone an API call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub project: String,
    pub zone: String,
}

#[must_use]
pub fn machine_type_url(project: &str, zone: &str, machine_type: &str) -> String {
    format!("{COMPUTE_API_URL}{project}/zones/{zone}/machineTypes/{machine_type}")
}

#[must_use]
pub fn disk_type_url(project: &str, zone: &str, ssd: bool) -> String {
    let disk_type = if ssd { "pd-ssd" } else { "pd-standard" };
    format!("{COMPUTE_API_URL}{project}/zones/{zone}/diskTypes/{disk_type}")
}

/// Project-relative accelerator type path, as the backend expects it in
/// `guestAccelerators`.
#[must_use]
pub fn accelerator_type_url(project: &str, zone: &str, accelerator_type: &str) -> String {
    format!("/projects/{project}/zones/{zone}/acceleratorTypes/{accelerator_type}")
}

/// A disk attached to an instance at launch.
///
/// Index 1 is the boot disk and has no `source_link`; it is created along
/// with the instance. Data disks reference a disk created beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSpec {
    pub name: String,
    pub size_gb: u64,
    pub source_link: Option<String>,
}

/// Accelerator requested in configuration (`type:count`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accelerator {
    pub accelerator_type: String,
    pub count: u32,
}

/// Parses `type:count[,type:count...]`.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] when an entry does not have
/// exactly two fields or the count is not a number.
pub fn parse_accelerators(value: &str) -> Result<Vec<Accelerator>, ProvisionError> {
    value
        .split(',')
        .map(|entry| {
            let parts: Vec<&str> = entry.trim().split(':').collect();
            let [accelerator_type, count] = parts.as_slice() else {
                return Err(ProvisionError::config(format!(
                    "Invalid accelerator configuration: [{entry}]"
                )));
            };
            let count = count.parse().map_err(|_| {
                ProvisionError::config(format!("Invalid accelerator count: [{entry}]"))
            })?;
            Ok(Accelerator {
                accelerator_type: (*accelerator_type).to_string(),
                count,
            })
        })
        .collect()
}

/// Accelerator expanded to its type path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestAccelerator {
    pub accelerator_type: String,
    pub count: u32,
}

/// Behaviour of an instance during host maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMaintenance {
    Migrate,
    Terminate,
}

/// Scheduling options; omitted entirely when all defaults apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scheduling {
    pub preemptible: bool,
    pub on_host_maintenance: Option<HostMaintenance>,
}

/// Fully resolved instance creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub name: String,
    pub machine_type: String,
    pub source_image: String,
    pub disk_type: String,
    /// Boot disk first, then data disks in index order.
    pub disks: Vec<DiskSpec>,
    pub network_interfaces: Vec<NetworkInterfaceSpec>,
    pub metadata: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub scheduling: Option<Scheduling>,
    pub accelerators: Vec<GuestAccelerator>,
}

impl LaunchSpec {
    #[must_use]
    pub fn boot_disk(&self) -> Option<&DiskSpec> {
        self.disks.first()
    }

    #[must_use]
    pub fn data_disks(&self) -> &[DiskSpec] {
        self.disks.get(1..).unwrap_or_default()
    }

    #[must_use]
    pub fn is_preemptible(&self) -> bool {
        self.scheduling.is_some_and(|s| s.preemptible)
    }

    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
