//! Configuration loading and management
//!
//! ```yaml
//! stores:
//!   casette:
//!     kind: custom_post_type
//!     container: casette
//!   settings:
//!     kind: option
//! ```

use crate::storage::builder::StoreKind;
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Store binding for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Strategy to build
    #[serde(default)]
    pub kind: StoreKind,

    /// Record container (record-backed stores only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Complete configuration: model name → store binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinderyConfig {
    #[serde(default)]
    pub stores: IndexMap<String, StoreConfig>,
}

impl BinderyConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Store binding for a model, if configured
    pub fn store_for(&self, model: &str) -> Option<&StoreConfig> {
        self.stores.get(model)
    }
}
