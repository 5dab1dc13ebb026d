use qmjob::engine::config::{DeduplicationConfig, GenerationConfig};
use std::path::PathBuf;

/// Per-run overrides applied to every loaded molecule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeOverrides {
    pub identifier: Option<String>,
    pub charge: Option<i32>,
    pub multiplicity: Option<u8>,
}

pub struct GenerateAppConfig {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub molecule: MoleculeOverrides,
    pub core_config: GenerationConfig,
}

pub struct DedupAppConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub core_config: DeduplicationConfig,
}
