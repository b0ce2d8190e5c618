//! TOML manifest describing the groups and units to order.
//!
//! Stands in for host-framework discovery:
//!
//! ```toml
//! [[group]]
//! name = "Api"
//! serialized = true
//! depends_on = ["Db"]
//!
//! [[unit]]
//! group = "Api"
//! name = "logout"
//! depends_on = ["login"]
//! ```

use std::path::Path;

use anyhow::Context;
use ordo_core::{Group, Unit};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupEntry>,
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default)]
    pub serialized: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid manifest.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Declared groups, in manifest order.
    pub fn groups(&self) -> Vec<Group> {
        self.groups
            .iter()
            .map(|entry| {
                Group::new(entry.name.clone())
                    .serialized(entry.serialized)
                    .depends_on(entry.depends_on.iter().cloned())
            })
            .collect()
    }

    /// Declared units, in manifest order.
    pub fn units(&self) -> Vec<Unit> {
        self.units
            .iter()
            .map(|entry| {
                Unit::new(entry.group.clone(), entry.name.clone())
                    .depends_on(entry.depends_on.iter().cloned())
            })
            .collect()
    }

    /// First declared group called `name`.
    pub fn group(&self, name: &str) -> Option<Group> {
        self.groups().into_iter().find(|g| g.name == name)
    }

    /// First declared unit matching `group` and `name`.
    pub fn unit(&self, group: &str, name: &str) -> Option<Unit> {
        self.units()
            .into_iter()
            .find(|u| u.group() == group && u.name() == name)
    }
}
