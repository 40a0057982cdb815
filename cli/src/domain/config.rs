//! Adapter configuration profiles and their validation.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ProvisionError;
use crate::domain::launch::{Accelerator, Placement, parse_accelerators};
use crate::domain::network::{DEFAULT_NETWORK, NetworkDefinition, validate_network_definitions};

// ── Constants ────────────────────────────────────────────────────────────────

/// Profile used when a request names none.
pub const DEFAULT_PROFILE: &str = "default";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-zA-Z0-9_-]{1,128}$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// All adapter profiles, keyed by profile name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterProfiles {
    #[serde(default)]
    pub profiles: BTreeMap<String, AdapterConfig>,
}

/// Raw settings of one adapter profile as stored in `adapters.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub zone: Option<String>,
    pub project: Option<String>,
    #[serde(rename = "type")]
    pub machine_type: Option<String>,
    pub image: Option<String>,
    pub image_family: Option<String>,
    pub image_url: Option<String>,
    pub network: Option<String>,
    pub networks: Option<Vec<String>>,
    /// Boot disk size in GB.
    #[serde(default = "default_disksize")]
    pub disksize: u64,
    #[serde(default = "default_true")]
    pub ssd: bool,
    /// Base polling interval in seconds.
    #[serde(default = "default_sleeptime")]
    pub sleeptime: u64,
    /// Request timeout in seconds.
    #[serde(default = "default_createtimeout")]
    pub createtimeout: u64,
    pub accelerators: Option<String>,
    pub tags: Option<String>,
    pub vcpus: Option<u32>,
    #[serde(default = "default_ssh_user")]
    pub default_ssh_user: String,
    pub ssh_public_key: Option<PathBuf>,
    pub startup_script_template: Option<PathBuf>,
    #[serde(default)]
    pub default_scopes: Vec<String>,
    #[serde(default)]
    pub override_dns_domain: bool,
    pub dns_domain: Option<String>,
    pub dns_options: Option<String>,
    #[serde(default)]
    pub dns_nameservers: Vec<String>,
    pub installer_hostname: Option<String>,
    pub installer_ip: Option<String>,
    #[serde(default)]
    pub randomize_hostname: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            zone: None,
            project: None,
            machine_type: None,
            image: None,
            image_family: None,
            image_url: None,
            network: None,
            networks: None,
            disksize: default_disksize(),
            ssd: true,
            sleeptime: default_sleeptime(),
            createtimeout: default_createtimeout(),
            accelerators: None,
            tags: None,
            vcpus: None,
            default_ssh_user: default_ssh_user(),
            ssh_public_key: None,
            startup_script_template: None,
            default_scopes: Vec::new(),
            override_dns_domain: false,
            dns_domain: None,
            dns_options: None,
            dns_nameservers: Vec::new(),
            installer_hostname: None,
            installer_ip: None,
            randomize_hostname: false,
        }
    }
}

fn default_disksize() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_sleeptime() -> u64 {
    5
}

fn default_createtimeout() -> u64 {
    600
}

fn default_ssh_user() -> String {
    "centos".to_string()
}

// ── Resolved config ──────────────────────────────────────────────────────────

/// How the boot image is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelector {
    /// `[project/]name`
    Name {
        project: Option<String>,
        name: String,
    },
    /// `[project/]family`
    Family {
        project: Option<String>,
        family: String,
    },
    /// Used verbatim.
    Url(String),
}

impl ImageSelector {
    fn parse_qualified(value: &str) -> (Option<String>, String) {
        match value.split_once('/') {
            Some((project, name)) => (Some(project.to_string()), name.to_string()),
            None => (None, value.to_string()),
        }
    }
}

/// DNS settings rendered into the startup script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsSettings {
    pub override_domain: bool,
    pub domain: Option<String>,
    pub options: Option<String>,
    pub nameservers: Vec<String>,
}

/// Validated adapter profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub profile: String,
    pub zone: String,
    pub region: String,
    pub project: String,
    pub machine_type: String,
    pub image: ImageSelector,
    pub networks: Vec<NetworkDefinition>,
    pub disksize_gb: u64,
    pub ssd: bool,
    pub polling_interval: Duration,
    pub create_timeout: Duration,
    pub accelerators: Vec<Accelerator>,
    pub tags: Vec<String>,
    pub vcpus: Option<u32>,
    pub default_ssh_user: String,
    pub ssh_public_key: Option<PathBuf>,
    pub startup_script_template: Option<PathBuf>,
    pub default_scopes: Vec<String>,
    pub dns: DnsSettings,
    pub installer_hostname: Option<String>,
    pub installer_ip: Option<String>,
    pub randomize_hostname: bool,
}

impl ResolvedConfig {
    #[must_use]
    pub fn placement(&self) -> Placement {
        Placement {
            project: self.project.clone(),
            zone: self.zone.clone(),
        }
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

impl AdapterConfig {
    /// Checks the profile and resolves derived settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Configuration`] for any missing or malformed
    /// setting. No backend call is made.
    pub fn validate(&self, profile: &str) -> Result<ResolvedConfig, ProvisionError> {
        let zone = required(self.zone.as_deref(), "zone", profile)?;
        let project = required(self.project.as_deref(), "project", profile)?;
        let machine_type = required(self.machine_type.as_deref(), "type", profile)?;

        let region = match zone.rsplit_once('-') {
            Some((region, suffix)) if !region.is_empty() && !suffix.is_empty() => region,
            _ => {
                return Err(ProvisionError::config(format!(
                    "Invalid format for 'zone' setting: {zone}"
                )));
            }
        };

        let image = self.image_selector()?;
        let networks = self.network_definitions()?;
        let accelerators = match self.accelerators.as_deref() {
            Some(value) if !value.trim().is_empty() => parse_accelerators(value)?,
            _ => Vec::new(),
        };
        let tags = parse_tags(self.tags.as_deref())?;
        validate_scopes(&self.default_scopes)?;

        let dns = DnsSettings {
            override_domain: self.override_dns_domain,
            domain: self.dns_domain.clone().or_else(|| {
                self.installer_hostname
                    .as_deref()
                    .and_then(|h| h.split_once('.'))
                    .map(|(_, domain)| domain.to_string())
            }),
            options: self.dns_options.clone(),
            nameservers: if self.dns_nameservers.is_empty() {
                self.installer_ip.iter().cloned().collect()
            } else {
                self.dns_nameservers.clone()
            },
        };

        Ok(ResolvedConfig {
            profile: profile.to_string(),
            zone: zone.to_string(),
            region: region.to_string(),
            project: project.to_string(),
            machine_type: machine_type.to_string(),
            image,
            networks,
            disksize_gb: self.disksize,
            ssd: self.ssd,
            polling_interval: Duration::from_secs(self.sleeptime),
            create_timeout: Duration::from_secs(self.createtimeout),
            accelerators,
            tags,
            vcpus: self.vcpus,
            default_ssh_user: self.default_ssh_user.clone(),
            ssh_public_key: self.ssh_public_key.clone(),
            startup_script_template: self.startup_script_template.clone(),
            default_scopes: self.default_scopes.clone(),
            dns,
            installer_hostname: self.installer_hostname.clone(),
            installer_ip: self.installer_ip.clone(),
            randomize_hostname: self.randomize_hostname,
        })
    }

    fn image_selector(&self) -> Result<ImageSelector, ProvisionError> {
        match (&self.image, &self.image_family, &self.image_url) {
            (Some(image), None, None) => {
                let (project, name) = ImageSelector::parse_qualified(image);
                Ok(ImageSelector::Name { project, name })
            }
            (None, Some(family), None) => {
                let (project, family) = ImageSelector::parse_qualified(family);
                Ok(ImageSelector::Family { project, family })
            }
            (None, None, Some(url)) => Ok(ImageSelector::Url(url.clone())),
            (None, None, None) => Err(ProvisionError::config(
                "One of 'image', 'image_family', or 'image_url' must be specified",
            )),
            _ => Err(ProvisionError::config(
                "'image', 'image_family', and 'image_url' are mutually exclusive",
            )),
        }
    }

    fn network_definitions(&self) -> Result<Vec<NetworkDefinition>, ProvisionError> {
        let values: Vec<&str> = match (&self.network, &self.networks) {
            (Some(_), Some(_)) => {
                return Err(ProvisionError::config(
                    "'network' and 'networks' settings are mutually exclusive",
                ));
            }
            (Some(network), None) => vec![network.as_str()],
            (None, Some(networks)) if !networks.is_empty() => {
                networks.iter().map(String::as_str).collect()
            }
            _ => vec![DEFAULT_NETWORK],
        };
        let definitions: Vec<NetworkDefinition> =
            values.into_iter().map(NetworkDefinition::parse).collect();
        validate_network_definitions(&definitions)?;
        Ok(definitions)
    }
}

fn required<'a>(
    value: Option<&'a str>,
    key: &str,
    profile: &str,
) -> Result<&'a str, ProvisionError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ProvisionError::config(format!(
            "Required setting '{key}' missing from profile [{profile}]"
        ))
    })
}

/// Splits whitespace-separated tags and validates each.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] for a tag outside
/// `[a-zA-Z0-9_-]{1,128}`.
pub fn parse_tags(value: Option<&str>) -> Result<Vec<String>, ProvisionError> {
    value
        .unwrap_or_default()
        .split_whitespace()
        .map(|tag| {
            if TAG_RE.is_match(tag) {
                Ok(tag.to_string())
            } else {
                Err(ProvisionError::config(format!("Invalid tag: [{tag}]")))
            }
        })
        .collect()
}

/// Requires every scope to be an absolute http(s) URL.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] naming the first bad scope.
pub fn validate_scopes(scopes: &[String]) -> Result<(), ProvisionError> {
    for scope in scopes {
        let ok = url::Url::parse(scope)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host());
        if !ok {
            return Err(ProvisionError::config(format!(
                "Invalid URL specified in 'default_scopes': {scope}"
            )));
        }
    }
    Ok(())
}
