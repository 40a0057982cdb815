//! Infrastructure implementation of the `ConfigProfiles` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigProfiles;
use crate::domain::config::{AdapterConfig, AdapterProfiles};
use crate::domain::error::RecordError;

/// Adapter profiles read from a YAML file on disk.
pub struct YamlConfigProfiles {
    path: PathBuf,
}

impl YamlConfigProfiles {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses `NODEFLEET_CONFIG` if set, otherwise `~/.nodefleet/adapters.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        if let Ok(val) = std::env::var("NODEFLEET_CONFIG") {
            return Ok(Self::new(PathBuf::from(val)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::new(home.join(".nodefleet").join("adapters.yaml")))
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<AdapterProfiles> {
        if !self.path.exists() {
            return Ok(AdapterProfiles::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))
    }
}

impl ConfigProfiles for YamlConfigProfiles {
    fn profile(&self, name: &str) -> Result<AdapterConfig> {
        self.load()?
            .profiles
            .remove(name)
            .ok_or_else(|| RecordError::AdapterProfileNotFound(name.to_string()).into())
    }

    fn profile_names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.profiles.into_keys().collect())
    }
}
