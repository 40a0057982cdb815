//! Naming helpers shared by the adapter and the storage catalog.

use thiserror::Error;

use crate::types::Node;

/// Errors raised by name validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Invalid instance name '{0}': must match ^[a-z]([-a-z0-9]{{0,61}}[a-z0-9])?$")]
    InvalidInstanceName(String),
}

/// Host part of a (possibly fully qualified) host name.
#[must_use]
pub fn instance_name_from_host_name(host_name: &str) -> &str {
    host_name.split_once('.').map_or(host_name, |(host, _)| host)
}

/// Persistent volume name for disk `index` of `instance_name`.
#[must_use]
pub fn disk_volume_name(instance_name: &str, index: u32) -> String {
    format!("{instance_name}-disk-{index:02}")
}

/// Validates an instance name against the compute backend's naming rules.
///
/// # Errors
///
/// Returns [`NameError::InvalidInstanceName`] when the name is empty, longer
/// than 63 characters, or contains characters outside `[-a-z0-9]`.
pub fn validate_instance_name(name: &str) -> Result<(), NameError> {
    let bytes = name.as_bytes();
    let valid = !bytes.is_empty()
        && bytes.len() <= 63
        && bytes[0].is_ascii_lowercase()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.last() != Some(&b'-');
    if valid {
        Ok(())
    } else {
        Err(NameError::InvalidInstanceName(name.to_string()))
    }
}

/// Node list suitable for log lines: `a b c`, or `first..last` past three.
#[must_use]
pub fn format_node_list(nodes: &[Node]) -> String {
    match nodes {
        [first, .., last] if nodes.len() > 3 => format!("{}..{}", first.name, last.name),
        _ => nodes
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Expands a hardware profile name format such as `compute-#NN`.
///
/// A `#` followed by one or more `N` is replaced by `counter`, zero-padded to
/// the number of `N`s. Everything else is copied verbatim.
#[must_use]
pub fn expand_name_format(format: &str, counter: u64) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '#' || chars.peek() != Some(&'N') {
            out.push(c);
            continue;
        }
        let mut width = 0;
        while chars.next_if_eq(&'N').is_some() {
            width += 1;
        }
        out.push_str(&format!("{counter:0width$}"));
    }
    out
}
