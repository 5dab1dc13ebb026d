use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileWorkflowConfig {
    #[serde(rename = "type")]
    pub workflow_type: Option<String>,
    pub theory: Option<String>,
    pub light_basis_set: Option<String>,
    pub heavy_basis_set: Option<String>,
    pub generic_basis_set: Option<String>,
    pub max_light_atomic_number: Option<u8>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileResourcesConfig {
    pub max_processors: Option<usize>,
    pub atoms_per_processor: Option<usize>,
    pub ram_per_processor: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileClusterConfig {
    pub wall_time: Option<String>,
    pub memory_headroom: Option<usize>,
    pub architecture: Option<String>,
    pub engine_command: Option<String>,
    pub submit_command: Option<String>,
    pub environment: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDeduplicationConfig {
    pub enabled: Option<bool>,
    pub rmsd_threshold: Option<f64>,
    pub symmetry: Option<bool>,
    pub removed_anchor_policy: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub workflow: Option<FileWorkflowConfig>,
    pub resources: Option<FileResourcesConfig>,
    pub cluster: Option<FileClusterConfig>,
    pub deduplication: Option<FileDeduplicationConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
