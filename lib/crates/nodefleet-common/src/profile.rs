//! Hardware and software profiles referenced by node records.

use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_STORAGE_ADAPTER;

/// Hardware profile: where and how nodes are named.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareProfile {
    pub name: String,
    /// Host name pattern; `#` characters are replaced by a zero-padded counter.
    #[serde(default = "default_name_format")]
    pub name_format: String,
}

fn default_name_format() -> String {
    "compute-#NN".to_string()
}

/// Software profile: what runs on the node, including its disk layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftwareProfile {
    pub name: String,
    #[serde(default)]
    pub disks: Vec<DiskRequirement>,
}

/// One disk a node of this profile should have.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskRequirement {
    /// Disk number, starting at 1 for the boot disk.
    pub index: u32,
    pub size_mb: u64,
    #[serde(default = "default_adapter")]
    pub adapter: String,
}

fn default_adapter() -> String {
    DEFAULT_STORAGE_ADAPTER.to_string()
}
