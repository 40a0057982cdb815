//! JSON request and response bodies of the compute REST API.

use serde::{Deserialize, Serialize};

use crate::domain::launch::{DiskSpec, HostMaintenance, LaunchSpec};

// ── Instance insert ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceBody<'a> {
    pub name: &'a str,
    pub machine_type: &'a str,
    pub tags: Tags<'a>,
    pub disks: Vec<AttachedDisk<'a>>,
    pub network_interfaces: Vec<NetworkInterfaceBody<'a>>,
    pub metadata: MetadataBody<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<SchedulingBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guest_accelerators: Vec<GuestAcceleratorBody<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Tags<'a> {
    pub items: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk<'a> {
    #[serde(rename = "type")]
    pub disk_type: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub boot: bool,
    pub mode: &'static str,
    pub auto_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize_params: Option<InitializeParams<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams<'a> {
    pub source_image: &'a str,
    pub disk_size_gb: u64,
    pub disk_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceBody<'a> {
    pub network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Serialize)]
pub struct AccessConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
}

impl AccessConfig {
    const EXTERNAL_NAT: Self = Self {
        kind: "ONE_TO_ONE_NAT",
        name: "External NAT",
    };
}

#[derive(Debug, Serialize)]
pub struct MetadataBody<'a> {
    pub kind: &'static str,
    pub items: Vec<MetadataItem<'a>>,
}

#[derive(Debug, Serialize)]
pub struct MetadataItem<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingBody {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub preemptible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_host_maintenance: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestAcceleratorBody<'a> {
    pub accelerator_type: &'a str,
    pub accelerator_count: u32,
}

impl<'a> From<&'a LaunchSpec> for InstanceBody<'a> {
    fn from(spec: &'a LaunchSpec) -> Self {
        let mut disks = Vec::with_capacity(spec.disks.len());
        if let Some(boot) = spec.boot_disk() {
            disks.push(AttachedDisk {
                disk_type: "PERSISTENT",
                boot: true,
                mode: "READ_WRITE",
                auto_delete: true,
                source: None,
                initialize_params: Some(InitializeParams {
                    source_image: &spec.source_image,
                    disk_size_gb: boot.size_gb,
                    disk_type: &spec.disk_type,
                }),
            });
        }
        disks.extend(spec.data_disks().iter().map(|disk| AttachedDisk {
            disk_type: "PERSISTENT",
            boot: false,
            mode: "READ_WRITE",
            auto_delete: true,
            source: disk.source_link.as_deref(),
            initialize_params: None,
        }));

        Self {
            name: &spec.name,
            machine_type: &spec.machine_type,
            tags: Tags { items: &spec.tags },
            disks,
            network_interfaces: spec
                .network_interfaces
                .iter()
                .map(|nic| NetworkInterfaceBody {
                    network: &nic.network,
                    subnetwork: nic.subnetwork.as_deref(),
                    access_configs: if nic.external_access {
                        vec![AccessConfig::EXTERNAL_NAT]
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
            metadata: MetadataBody {
                kind: "compute#metadata",
                items: spec
                    .metadata
                    .iter()
                    .map(|(key, value)| MetadataItem { key, value })
                    .collect(),
            },
            scheduling: spec.scheduling.map(|s| SchedulingBody {
                preemptible: s.preemptible,
                on_host_maintenance: s.on_host_maintenance.map(|m| match m {
                    HostMaintenance::Migrate => "MIGRATE",
                    HostMaintenance::Terminate => "TERMINATE",
                }),
            }),
            guest_accelerators: spec
                .accelerators
                .iter()
                .map(|a| GuestAcceleratorBody {
                    accelerator_type: &a.accelerator_type,
                    accelerator_count: a.count,
                })
                .collect(),
        }
    }
}

// ── Disk insert ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskBody<'a> {
    pub kind: &'static str,
    pub name: &'a str,
    pub size_gb: u64,
    #[serde(rename = "type")]
    pub disk_type: &'a str,
}

impl<'a> DiskBody<'a> {
    #[must_use]
    pub fn new(disk: &'a DiskSpec, disk_type: &'a str) -> Self {
        Self {
            kind: "compute#disk",
            name: &disk.name,
            size_gb: disk.size_gb,
            disk_type,
        }
    }
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub self_link: String,
}

/// Error envelope of a non-success response.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
