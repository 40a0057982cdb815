//! JSON-file implementation of the `NodeRepository` and `StorageCatalog`
//! ports.
//!
//! Mutations are staged in memory and written by `commit` with an atomic
//! write (temp file + rename) inside `tokio::task::spawn_blocking`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nodefleet_common::{
    DiskChanges, HardwareProfile, Node, SoftwareProfile, StorageDisk, expand_name_format,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::application::ports::{NodeRepository, StorageCatalog};
use crate::domain::error::RecordError;

/// Everything persisted in the fleet file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetState {
    #[serde(default)]
    pub hardware_profiles: BTreeMap<String, HardwareProfile>,
    #[serde(default)]
    pub software_profiles: BTreeMap<String, SoftwareProfile>,
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,
    /// Catalogued drives per node name, keyed by disk index.
    #[serde(default)]
    pub drives: BTreeMap<String, BTreeMap<u32, StorageDisk>>,
    /// Last name counter used per hardware profile.
    #[serde(default)]
    pub name_counters: BTreeMap<String, u64>,
}

/// Node store backed by `~/.nodefleet/fleet.json`.
pub struct JsonNodeStore {
    path: PathBuf,
    state: RefCell<FleetState>,
}

impl JsonNodeStore {
    /// Opens the store at the default path, honouring `NODEFLEET_STATE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// file exists but cannot be parsed.
    pub fn open_default() -> Result<Self> {
        let path = match std::env::var("NODEFLEET_STATE") {
            Ok(val) => PathBuf::from(val),
            Err(_) => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?
                .join(".nodefleet")
                .join("fleet.json"),
        };
        Self::open(path)
    }

    /// Opens the store at `path`. A missing file is an empty fleet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = load(&path)?;
        Ok(Self {
            path,
            state: RefCell::new(state),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the staged state.
    #[must_use]
    pub fn snapshot(&self) -> FleetState {
        self.state.borrow().clone()
    }
}

fn load(path: &Path) -> Result<FleetState> {
    if !path.exists() {
        return Ok(FleetState::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading fleet file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing fleet file {}", path.display()))
}

fn save(path: &Path, state: &FleetState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(state).context("serializing fleet state")?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &content)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
    }

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing fleet file {}", path.display()))
}

fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..5)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

impl NodeRepository for JsonNodeStore {
    async fn hardware_profile(&self, name: &str) -> Result<HardwareProfile> {
        self.state
            .borrow()
            .hardware_profiles
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::HardwareProfileNotFound(name.to_string()).into())
    }

    async fn software_profile(&self, name: &str) -> Result<SoftwareProfile> {
        self.state
            .borrow()
            .software_profiles
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::SoftwareProfileNotFound(name.to_string()).into())
    }

    async fn generate_node_names(
        &self,
        profile: &HardwareProfile,
        count: usize,
        randomize: bool,
    ) -> Result<Vec<String>> {
        let mut state = self.state.borrow_mut();
        let mut counter = state.name_counters.get(&profile.name).copied().unwrap_or(0);
        let mut names = Vec::with_capacity(count);

        // Each existing node can reject at most one candidate, so this bound
        // is only hit by a format that ignores the counter.
        let max_attempts = state.nodes.len() + count;
        let mut attempts = 0;
        while names.len() < count {
            if attempts == max_attempts {
                return Err(RecordError::NamesExhausted {
                    profile: profile.name.clone(),
                    format: profile.name_format.clone(),
                    count,
                }
                .into());
            }
            attempts += 1;
            counter += 1;
            let base = expand_name_format(&profile.name_format, counter);
            let name = if randomize {
                match base.split_once('.') {
                    Some((host, domain)) => format!("{host}-{}.{domain}", random_suffix()),
                    None => format!("{base}-{}", random_suffix()),
                }
            } else {
                base
            };
            if !state.nodes.contains_key(&name) && !names.contains(&name) {
                names.push(name);
            }
        }

        state.name_counters.insert(profile.name.clone(), counter);
        Ok(names)
    }

    async fn add_nodes(&self, nodes: &[Node]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        for node in nodes {
            state.nodes.insert(node.name.clone(), node.clone());
        }
        Ok(())
    }

    async fn update_node(&self, node: &Node) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .nodes
            .get_mut(&node.name)
            .ok_or_else(|| RecordError::NodeNotFound(node.name.clone()))?;
        *slot = node.clone();
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state
            .nodes
            .remove(name)
            .ok_or_else(|| RecordError::NodeNotFound(name.to_string()))?;
        state.drives.remove(name);
        Ok(())
    }

    async fn get_node(&self, name: &str) -> Result<Node> {
        self.state
            .borrow()
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::NodeNotFound(name.to_string()).into())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.state.borrow().nodes.values().cloned().collect())
    }

    async fn commit(&self) -> Result<()> {
        let path = self.path.clone();
        let state = self.snapshot();
        tokio::task::spawn_blocking(move || save(&path, &state))
            .await
            .context("fleet save task panicked")?
    }
}

impl StorageCatalog for JsonNodeStore {
    async fn discover_changes(&self, node: &Node, removing: bool) -> Result<DiskChanges> {
        let state = self.state.borrow();
        let catalogued = state.drives.get(&node.name);

        if removing {
            return Ok(DiskChanges {
                added: BTreeMap::new(),
                removed: catalogued.cloned().unwrap_or_default(),
            });
        }

        let profile = state
            .software_profiles
            .get(&node.software_profile)
            .ok_or_else(|| RecordError::SoftwareProfileNotFound(node.software_profile.clone()))?;
        let added = profile
            .disks
            .iter()
            .filter(|d| catalogued.is_none_or(|c| !c.contains_key(&d.index)))
            .map(|d| {
                (
                    d.index,
                    StorageDisk {
                        adapter: d.adapter.clone(),
                        size_mb: d.size_mb,
                        san_volume: None,
                    },
                )
            })
            .collect();
        Ok(DiskChanges {
            added,
            removed: BTreeMap::new(),
        })
    }

    async fn add_drive(&self, node: &Node, index: u32, disk: &StorageDisk) -> Result<()> {
        self.state
            .borrow_mut()
            .drives
            .entry(node.name.clone())
            .or_default()
            .insert(index, disk.clone());
        Ok(())
    }

    async fn delete_drive(&self, node: &Node, index: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(drives) = state.drives.get_mut(&node.name) {
            drives.remove(&index);
            if drives.is_empty() {
                state.drives.remove(&node.name);
            }
        }
        Ok(())
    }
}
