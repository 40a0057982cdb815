use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instance metadata key holding the zone the instance was launched in.
pub const METADATA_ZONE: &str = "zone";
/// Instance metadata key holding the project the instance was launched in.
pub const METADATA_PROJECT: &str = "project";
/// Instance metadata key recording the scheduling class of the instance.
pub const METADATA_SCHEDULING: &str = "gce:scheduling";

/// Lifecycle state of a node record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Record exists, instance not yet confirmed running.
    #[default]
    Launching,
    /// Instance is running and registered with the cluster.
    Installed,
    /// Batch committed the node.
    Provisioned,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Launching => "launching",
            Self::Installed => "installed",
            Self::Provisioned => "provisioned",
        };
        f.write_str(s)
    }
}

/// Network interface attached to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Nic {
    pub ip: String,
    /// Interface used for provisioning.
    #[serde(default)]
    pub boot: bool,
}

/// Mapping of a node to its cloud instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceMapping {
    /// Instance name at the cloud backend.
    pub instance: String,
    /// Adapter configuration profile the instance was launched with.
    pub adapter_profile: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl InstanceMapping {
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.metadata.get(METADATA_ZONE).map(String::as_str)
    }

    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.metadata.get(METADATA_PROJECT).map(String::as_str)
    }

    /// Whether the instance was launched as preemptible.
    #[must_use]
    pub fn is_preemptible(&self) -> bool {
        self.metadata
            .get(METADATA_SCHEDULING)
            .is_some_and(|v| v == "preemptible")
    }
}

/// A cluster node record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    /// Host name, possibly fully qualified.
    pub name: String,
    #[serde(default)]
    pub state: NodeState,
    pub hardware_profile: String,
    pub software_profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<u32>,
    #[serde(default)]
    pub nics: Vec<Nic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceMapping>,
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// New node record in the `Launching` state.
    #[must_use]
    pub fn new(name: &str, hardware_profile: &str, software_profile: &str) -> Self {
        Self {
            name: name.to_string(),
            state: NodeState::Launching,
            hardware_profile: hardware_profile.to_string(),
            software_profile: software_profile.to_string(),
            vcpus: None,
            nics: Vec::new(),
            instance: None,
            created_at: Utc::now(),
        }
    }

    /// Host part of the node name.
    #[must_use]
    pub fn host_name(&self) -> &str {
        crate::names::instance_name_from_host_name(&self.name)
    }

    /// Address of the boot interface, if one is recorded.
    #[must_use]
    pub fn boot_ip(&self) -> Option<&str> {
        self.nics.iter().find(|n| n.boot).map(|n| n.ip.as_str())
    }
}
