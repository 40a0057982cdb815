//! Storage catalog records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Storage adapter whose disks are managed by the compute backend.
pub const DEFAULT_STORAGE_ADAPTER: &str = "default";

/// A disk tracked (or to be tracked) by the storage catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageDisk {
    pub adapter: String,
    pub size_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san_volume: Option<String>,
}

impl StorageDisk {
    /// Whether this disk belongs to the compute backend's own storage path.
    #[must_use]
    pub fn is_default_adapter(&self) -> bool {
        self.adapter == DEFAULT_STORAGE_ADAPTER
    }

    /// Size in GB as the compute backend counts it.
    #[must_use]
    pub fn size_gb(&self) -> u64 {
        self.size_mb / 1000
    }
}

/// Disk delta between what a node should have and what is catalogued.
///
/// Keys are disk indices; iteration order is ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskChanges {
    pub added: BTreeMap<u32, StorageDisk>,
    pub removed: BTreeMap<u32, StorageDisk>,
}
