use crate::core::io::sdf::SdfRecord;
use crate::core::models::molecule::{Molecule, Topology};
use crate::engine::alignment::{AlignmentContext, KabschAligner};
use crate::engine::config::DeduplicationConfig;
use crate::engine::dedup::{Candidate, DuplicateSet, deduplicate};
use crate::engine::error::DedupError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::sync::atomic::AtomicBool;
use tracing::{info, instrument};

fn aligner_for(topology: &Topology, config: &DeduplicationConfig) -> KabschAligner {
    KabschAligner::new(AlignmentContext::for_topology(topology, config.symmetry))
}

/// Duplicate conformers of one molecule.
#[instrument(skip_all, name = "deduplicate_molecule", fields(molecule = molecule.label()))]
pub fn find_duplicates(
    molecule: &Molecule,
    config: &DeduplicationConfig,
    reporter: &ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> Result<DuplicateSet, DedupError> {
    reporter.report(Progress::PhaseStart {
        name: "Deduplication",
    });
    let candidates: Vec<Candidate<'_>> = molecule
        .conformers()
        .iter()
        .map(|conformer| Candidate {
            topology: molecule.topology(),
            coordinates: conformer.coordinates(),
        })
        .collect();
    let aligner = aligner_for(molecule.topology(), config);
    let result = deduplicate(&candidates, config, &aligner, reporter, cancel);
    reporter.report(Progress::PhaseFinish);
    result
}

/// Duplicate records of a conformer file.
///
/// Each record keeps its own topology, so records that do not describe the
/// same molecule are rejected with [`DedupError::FingerprintMismatch`].
#[instrument(skip_all, name = "deduplicate_records", fields(records = records.len()))]
pub fn find_duplicate_records(
    records: &[SdfRecord],
    config: &DeduplicationConfig,
    reporter: &ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> Result<DuplicateSet, DedupError> {
    let Some(first) = records.first() else {
        return Ok(DuplicateSet::empty());
    };
    reporter.report(Progress::PhaseStart {
        name: "Deduplication",
    });
    let candidates: Vec<Candidate<'_>> = records
        .iter()
        .map(|record| Candidate {
            topology: &record.topology,
            coordinates: record.conformer.coordinates(),
        })
        .collect();
    let aligner = aligner_for(&first.topology, config);
    let result = deduplicate(&candidates, config, &aligner, reporter, cancel);
    reporter.report(Progress::PhaseFinish);
    result
}

/// Records not listed in `duplicates`, in their original order.
pub fn retain_unique(records: &[SdfRecord], duplicates: &DuplicateSet) -> Vec<SdfRecord> {
    let unique: Vec<SdfRecord> = records
        .iter()
        .enumerate()
        .filter(|(index, _)| !duplicates.contains(*index))
        .map(|(_, record)| record.clone())
        .collect();
    info!(
        kept = unique.len(),
        removed = records.len() - unique.len(),
        "Filtered conformer records."
    );
    unique
}
