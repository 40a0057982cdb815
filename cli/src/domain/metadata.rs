//! Instance metadata and startup script rendering.

use crate::domain::config::{DnsSettings, ResolvedConfig};

pub const SSH_KEYS_KEY: &str = "sshKeys";
pub const STARTUP_SCRIPT_KEY: &str = "startup-script";
pub const HOSTNAME_KEY: &str = "hostname";
pub const INSTALLER_HOSTNAME_KEY: &str = "nodefleet_installer_public_hostname";
pub const INSTALLER_IP_KEY: &str = "nodefleet_installer_public_ipaddress";

/// Template lines starting with this marker are replaced by the settings block.
pub const SETTINGS_MARKER: &str = "### SETTINGS";

/// Replaces every `### SETTINGS` line of `template` with the settings block.
#[must_use]
pub fn render_startup_script(template: &str, config: &ResolvedConfig) -> String {
    let block = settings_block(config);
    let mut script = String::with_capacity(template.len() + block.len());
    for line in template.split_inclusive('\n') {
        if line.starts_with(SETTINGS_MARKER) {
            script.push_str(&block);
        } else {
            script.push_str(line);
        }
    }
    script
}

fn settings_block(config: &ResolvedConfig) -> String {
    let DnsSettings {
        override_domain,
        domain,
        options,
        nameservers,
    } = &config.dns;
    let nameservers = nameservers.join(" ");
    format!(
        "installerHostName = '{}'\n\
         installerIpAddress = '{}'\n\
         \n\
         # DNS settings\n\
         override_dns_domain = {}\n\
         dns_options = {}\n\
         dns_search = {}\n\
         dns_nameservers = {}\n",
        config.installer_hostname.as_deref().unwrap_or_default(),
        config.installer_ip.as_deref().unwrap_or_default(),
        if *override_domain { "True" } else { "False" },
        quoted_or_none(options.as_deref()),
        quoted_or_none(domain.as_deref()),
        quoted_or_none(Some(nameservers.as_str()).filter(|s| !s.is_empty())),
    )
}

fn quoted_or_none(value: Option<&str>) -> String {
    value.map_or_else(|| "None".to_string(), |v| format!("'{v}'"))
}

/// Assembles per-instance metadata.
///
/// `ssh_public_key` and `startup_script` are the already-read contents of the
/// configured files, when present.
#[must_use]
pub fn instance_metadata(
    config: &ResolvedConfig,
    node_name: &str,
    ssh_public_key: Option<&str>,
    startup_script: Option<String>,
) -> Vec<(String, String)> {
    let mut metadata = Vec::new();
    if let Some(key) = ssh_public_key {
        metadata.push((
            SSH_KEYS_KEY.to_string(),
            format!("{}:{}", config.default_ssh_user, key.trim_end()),
        ));
    }
    if let Some(hostname) = &config.installer_hostname {
        metadata.push((INSTALLER_HOSTNAME_KEY.to_string(), hostname.clone()));
    }
    if let Some(ip) = &config.installer_ip {
        metadata.push((INSTALLER_IP_KEY.to_string(), ip.clone()));
    }
    if let Some(script) = startup_script {
        metadata.push((STARTUP_SCRIPT_KEY.to_string(), script));
    }
    if config.dns.override_domain {
        metadata.push((HOSTNAME_KEY.to_string(), node_name.to_string()));
    }
    metadata
}
