//! Long-running operations and instance descriptions returned by the backend.

use serde::{Deserialize, Serialize};

/// Lifecycle of a backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

/// One entry of an operation's error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub errors: Vec<OperationErrorEntry>,
}

/// Handle to an asynchronous backend task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    pub status: OperationStatus,
    /// Zone URL for zonal operations; absent for global ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl Operation {
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    /// Last path segment of the zone URL.
    #[must_use]
    pub fn zone_name(&self) -> Option<&str> {
        self.zone.as_deref().and_then(|z| z.rsplit('/').next())
    }

    /// `message (code), ...` when the operation carries an error payload.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        self.error.as_ref().map(|e| {
            e.errors
                .iter()
                .map(|entry| format!("{} ({})", entry.message, entry.code))
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

/// Network interface of a live instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceNetworkInterface {
    #[serde(default, rename = "networkIP", skip_serializing_if = "Option::is_none")]
    pub network_ip: Option<String>,
}

/// Live instance description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub network_interfaces: Vec<InstanceNetworkInterface>,
}

impl Instance {
    /// Internal address of the first network interface.
    #[must_use]
    pub fn internal_ip(&self) -> Option<&str> {
        self.network_interfaces
            .first()
            .and_then(|nic| nic.network_ip.as_deref())
    }
}
