use crate::core::models::molecule::Topology;
use crate::core::topology::fingerprint::StructuralFingerprint;
use crate::engine::alignment::StructuralAligner;
use crate::engine::config::{DeduplicationConfig, RemovedAnchorPolicy};
use crate::engine::error::DedupError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One conformer presented for deduplication.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub topology: &'a Topology,
    pub coordinates: &'a [Point3<f64>],
}

/// Indices judged redundant, to be skipped during job generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DuplicateSet {
    indices: BTreeSet<usize>,
    completed: bool,
}

impl DuplicateSet {
    /// An empty set for a scan that finished.
    pub fn empty() -> Self {
        Self {
            indices: BTreeSet::new(),
            completed: true,
        }
    }

    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
            completed: true,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn indices(&self) -> &BTreeSet<usize> {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `false` when the scan was cancelled; the marks from every finished
    /// anchor row are still present.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

fn check_candidates(candidates: &[Candidate<'_>]) -> Result<(), DedupError> {
    let Some(first) = candidates.first() else {
        return Ok(());
    };
    let expected = StructuralFingerprint::of(first.topology);
    for (index, candidate) in candidates.iter().enumerate() {
        if index > 0 {
            let found = StructuralFingerprint::of(candidate.topology);
            if found != expected {
                return Err(DedupError::FingerprintMismatch {
                    index,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        if candidate.coordinates.len() != candidate.topology.atom_count() {
            return Err(DedupError::AtomCountMismatch {
                index,
                expected: candidate.topology.atom_count(),
                found: candidate.coordinates.len(),
            });
        }
    }
    Ok(())
}

fn align_row<A: StructuralAligner>(
    candidates: &[Candidate<'_>],
    anchor: usize,
    aligner: &A,
) -> Result<Vec<(usize, f64)>, DedupError> {
    let reference = candidates[anchor].coordinates;
    let align = |target: usize| {
        aligner
            .rmsd(reference, candidates[target].coordinates)
            .map(|rmsd| (target, rmsd))
            .map_err(|e| DedupError::Alignment {
                reference: anchor,
                target,
                reason: e.to_string(),
            })
    };

    #[cfg(not(feature = "parallel"))]
    let row = (anchor + 1..candidates.len()).map(align).collect();

    #[cfg(feature = "parallel")]
    let row = (anchor + 1..candidates.len())
        .into_par_iter()
        .map(align)
        .collect();

    row
}

/// Finds structurally redundant conformers by pairwise alignment.
///
/// Every candidate must share the same structural fingerprint; a mismatch is
/// reported before any alignment is attempted. A pair `(i, j)`, `i < j`, is a
/// duplicate when its post-alignment RMSD is strictly below the configured
/// threshold, in which case `j` is marked. Whether an anchor that has itself
/// been marked may still mark later conformers is set by
/// [`RemovedAnchorPolicy`]. The lowest index of each cluster is never marked.
///
/// Anchor rows are processed in order; the alignments of one row run in
/// parallel when the `parallel` feature is enabled. `cancel` is polled between
/// rows, so a cancelled scan returns only marks from fully processed rows.
#[instrument(skip_all, name = "deduplication", fields(candidates = candidates.len()))]
pub fn deduplicate<A: StructuralAligner>(
    candidates: &[Candidate<'_>],
    config: &DeduplicationConfig,
    aligner: &A,
    reporter: &ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> Result<DuplicateSet, DedupError> {
    check_candidates(candidates)?;

    let n = candidates.len();
    if n < 2 {
        return Ok(DuplicateSet::empty());
    }

    let threshold = config.rmsd_threshold();
    info!(threshold, "Comparing {} conformers pairwise.", n);
    reporter.report(Progress::TaskStart {
        total_steps: (n * (n - 1) / 2) as u64,
    });

    let mut marked = BTreeSet::new();
    let mut completed = true;

    for anchor in 0..n - 1 {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!(anchor, "Deduplication cancelled; returning partial result.");
            completed = false;
            break;
        }

        let row_len = (n - anchor - 1) as u64;
        let anchor_removed = marked.contains(&anchor);
        if anchor_removed && config.anchor_policy == RemovedAnchorPolicy::Inert {
            reporter.report(Progress::TaskAdvance { steps: row_len });
            continue;
        }

        for (target, rmsd) in align_row(candidates, anchor, aligner)? {
            if rmsd < threshold && marked.insert(target) {
                debug!(anchor, target, rmsd, "Marked conformer as duplicate.");
            }
        }
        reporter.report(Progress::TaskAdvance { steps: row_len });
    }

    reporter.report(Progress::TaskFinish);
    info!(
        duplicates = marked.len(),
        retained = n - marked.len(),
        "Deduplication finished."
    );

    Ok(DuplicateSet {
        indices: marked,
        completed,
    })
}
