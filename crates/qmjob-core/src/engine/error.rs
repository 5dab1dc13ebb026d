use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::molecule::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("Invalid resource input: {0}")]
    InvalidResourceInput(String),

    #[error("Inconsistent molecule data: {0}")]
    Model(#[from] ModelError),

    #[error(
        "Resource plan was computed for {planned} atoms but molecule '{molecule}' has {actual}"
    )]
    ResourcePlanMismatch {
        molecule: String,
        planned: usize,
        actual: usize,
    },

    #[error("Conformer {index} does not exist in molecule '{molecule}'")]
    ConformerNotFound { molecule: String, index: usize },

    #[error("Failed to write '{path}': {source}")]
    Persist {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize workflow parameters: {0}")]
    Provenance(String),

    #[error("Deduplication failed: {0}")]
    Dedup(#[from] DedupError),

    #[error("Generation for molecule '{0}' was cancelled")]
    Cancelled(String),

    #[error("'{0}' cannot be used as a file or directory name")]
    UnsafeName(String),

    #[error(
        "Molecule '{molecule}' would write into '{directory}', already used by an earlier molecule of this batch"
    )]
    DirectoryConflict { molecule: String, directory: String },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DedupError {
    #[error(
        "Candidate {index} has structural fingerprint {found}, expected {expected}; all candidates must be conformers of the same molecule"
    )]
    FingerprintMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Candidate {index} has {found} coordinates but its topology has {expected} atoms")]
    AtomCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Alignment of candidates {reference} and {target} failed: {reason}")]
    Alignment {
        reference: usize,
        target: usize,
        reason: String,
    },
}
