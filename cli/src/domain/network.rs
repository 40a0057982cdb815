//! Network definitions and interface resolution.
//!
//! A definition has the form `network[:subnet[:flags]]`. `network` may be
//! qualified as `project/network` and `subnet` as `region/subnet`. Flags are
//! `;`-separated and matched by case-insensitive prefix.

use serde::{Deserialize, Serialize};

use crate::domain::error::ProvisionError;
use crate::domain::launch::COMPUTE_API_URL;

/// Name of the backend's default network.
pub const DEFAULT_NETWORK: &str = "default";

/// One configured network definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDefinition {
    pub network: String,
    pub subnet: Option<String>,
    pub flags: Option<String>,
}

impl NetworkDefinition {
    /// Splits `network[:subnet[:flags]]`. Values with more than two `:` are
    /// taken whole as the network name.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let parts: Vec<&str> = value.split(':').collect();
        match parts.as_slice() {
            [network, subnet, flags] => Self {
                network: (*network).to_string(),
                subnet: Some((*subnet).to_string()),
                flags: Some((*flags).to_string()),
            },
            [network, subnet] => Self {
                network: (*network).to_string(),
                subnet: Some((*subnet).to_string()),
                flags: None,
            },
            _ => Self {
                network: value.to_string(),
                subnet: None,
                flags: None,
            },
        }
    }
}

/// Flags parsed from the third field of a network definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkFlags {
    /// `Some(true)` for `ext`, `Some(false)` for `noext`, `None` when unset.
    pub external: Option<bool>,
    pub primary: bool,
}

/// Parses network flags. Later flags win.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] for an unrecognised flag.
pub fn parse_network_flags(args: Option<&str>) -> Result<NetworkFlags, ProvisionError> {
    let mut flags = NetworkFlags::default();
    let Some(args) = args else {
        return Ok(flags);
    };
    for arg in args.split(';').filter(|a| !a.is_empty()) {
        let lower = arg.to_ascii_lowercase();
        if lower.starts_with("ext") {
            flags.external = Some(true);
        } else if lower.starts_with("noext") {
            flags.external = Some(false);
        } else if lower.starts_with("pri") {
            flags.primary = true;
        } else {
            return Err(ProvisionError::config(format!("Invalid network flag: [{arg}]")));
        }
    }
    Ok(flags)
}

/// Resolved network interface for an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceSpec {
    /// Fully qualified network URL.
    pub network: String,
    /// Fully qualified subnetwork URL.
    pub subnetwork: Option<String>,
    /// Whether the interface gets a one-to-one NAT access config.
    pub external_access: bool,
}

/// Checks every definition's flags and that at most one is primary.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] on an unrecognised flag or a
/// second primary interface.
pub fn validate_network_definitions(definitions: &[NetworkDefinition]) -> Result<(), ProvisionError> {
    let mut primary: Option<&str> = None;
    for def in definitions {
        if !parse_network_flags(def.flags.as_deref())?.primary {
            continue;
        }
        if let Some(existing) = primary {
            return Err(ProvisionError::config(format!(
                "Only one interface may be primary: {existing} is already marked as primary"
            )));
        }
        primary = Some(&def.network);
    }
    Ok(())
}

/// Resolves network definitions into interface specs.
///
/// At most one definition may carry the `primary` flag. A lone interface on
/// the default network, or one not explicitly marked `noext`, gets external
/// access.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] on a second primary interface or
/// an unrecognised flag.
pub fn resolve_network_interfaces(
    default_project: &str,
    default_region: &str,
    definitions: &[NetworkDefinition],
) -> Result<Vec<NetworkInterfaceSpec>, ProvisionError> {
    validate_network_definitions(definitions)?;
    let mut interfaces = Vec::with_capacity(definitions.len());

    for def in definitions {
        let flags = parse_network_flags(def.flags.as_deref())?;
        let (project, network) = split_forward_slash(&def.network, default_project);
        let subnetwork = def.subnet.as_deref().map(|subnet| {
            let (region, subnet) = split_forward_slash(subnet, default_region);
            format!("{COMPUTE_API_URL}{project}/regions/{region}/subnetworks/{subnet}")
        });

        interfaces.push(NetworkInterfaceSpec {
            network: format!("{COMPUTE_API_URL}{project}/global/networks/{network}"),
            subnetwork,
            external_access: flags.external == Some(true),
        });
    }

    if let ([def], Some(first)) = (definitions, interfaces.first_mut()) {
        let flags = parse_network_flags(def.flags.as_deref())?;
        if def.network == DEFAULT_NETWORK || flags.external.unwrap_or(true) {
            first.external_access = true;
        }
    }

    Ok(interfaces)
}

/// `(default, value)` unless `value` is `qualifier/value`.
fn split_forward_slash<'a>(value: &'a str, default: &'a str) -> (&'a str, &'a str) {
    value.split_once('/').unwrap_or((default, value))
}
