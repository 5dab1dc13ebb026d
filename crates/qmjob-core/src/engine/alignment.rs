use crate::core::models::molecule::Topology;
use crate::core::topology::fingerprint::equivalence_classes;
use crate::core::utils::geometry::superpose;
use nalgebra::Point3;
use thiserror::Error;

const DEFAULT_MAX_REASSIGNMENTS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AlignmentError {
    #[error("coordinate sets differ in length ({reference} vs {target})")]
    LengthMismatch { reference: usize, target: usize },
    #[error("cannot align empty coordinate sets")]
    Empty,
    #[error("superposition did not converge")]
    Degenerate,
}

/// Rigid structural alignment returning the post-alignment RMSD.
///
/// Implementations must be thread-safe: the deduplicator calls `rmsd` for many
/// pairs concurrently.
pub trait StructuralAligner: Sync {
    fn rmsd(
        &self,
        reference: &[Point3<f64>],
        target: &[Point3<f64>],
    ) -> Result<f64, AlignmentError>;
}

/// Per-molecule alignment state, built once and shared by every pair.
///
/// Holds the groups of topologically equivalent atoms that may be permuted
/// during a symmetry-aware alignment. Singleton classes are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignmentContext {
    symmetry_classes: Vec<Vec<usize>>,
}

impl AlignmentContext {
    /// Context for a fixed atom-to-atom correspondence.
    pub fn rigid() -> Self {
        Self::default()
    }

    pub fn for_topology(topology: &Topology, symmetry: bool) -> Self {
        if !symmetry {
            return Self::rigid();
        }
        let symmetry_classes = equivalence_classes(topology)
            .into_iter()
            .filter(|class| class.len() > 1)
            .collect();
        Self { symmetry_classes }
    }

    pub fn symmetry_classes(&self) -> &[Vec<usize>] {
        &self.symmetry_classes
    }

    pub fn is_symmetric(&self) -> bool {
        !self.symmetry_classes.is_empty()
    }
}

/// Kabsch superposition, optionally refined by permuting equivalent atoms.
///
/// With symmetry classes present the aligner alternates between superposing
/// and reassigning each class's target atoms to their nearest reference
/// positions, until the assignment stops changing or the iteration cap is
/// reached. The lowest RMSD seen is returned.
#[derive(Debug, Clone)]
pub struct KabschAligner {
    context: AlignmentContext,
    max_reassignments: usize,
}

impl KabschAligner {
    pub fn new(context: AlignmentContext) -> Self {
        Self {
            context,
            max_reassignments: DEFAULT_MAX_REASSIGNMENTS,
        }
    }

    pub fn with_max_reassignments(mut self, max_reassignments: usize) -> Self {
        self.max_reassignments = max_reassignments;
        self
    }

    pub fn context(&self) -> &AlignmentContext {
        &self.context
    }

    fn reassign(
        &self,
        reference: &[Point3<f64>],
        moved_target: &[Point3<f64>],
        assignment: &[usize],
    ) -> Vec<usize> {
        let mut next = assignment.to_vec();
        for class in &self.context.symmetry_classes {
            let mut pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(class.len() * class.len());
            for &r in class {
                for &t in class {
                    pairs.push(((reference[r] - moved_target[t]).norm_squared(), r, t));
                }
            }
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut used_reference = Vec::with_capacity(class.len());
            let mut used_target = Vec::with_capacity(class.len());
            for (_, r, t) in pairs {
                if used_reference.contains(&r) || used_target.contains(&t) {
                    continue;
                }
                next[r] = t;
                used_reference.push(r);
                used_target.push(t);
                if used_reference.len() == class.len() {
                    break;
                }
            }
        }
        next
    }
}

impl StructuralAligner for KabschAligner {
    fn rmsd(
        &self,
        reference: &[Point3<f64>],
        target: &[Point3<f64>],
    ) -> Result<f64, AlignmentError> {
        if reference.len() != target.len() {
            return Err(AlignmentError::LengthMismatch {
                reference: reference.len(),
                target: target.len(),
            });
        }
        if reference.is_empty() {
            return Err(AlignmentError::Empty);
        }

        let initial = superpose(reference, target).ok_or(AlignmentError::Degenerate)?;
        if !self.context.is_symmetric() {
            return Ok(initial.rmsd);
        }

        // assignment[r] is the target atom placed at reference position r.
        let mut assignment: Vec<usize> = (0..target.len()).collect();
        let mut best = initial.rmsd;
        let mut current = initial;

        for _ in 0..self.max_reassignments {
            let moved: Vec<Point3<f64>> = target.iter().map(|p| current.apply(p)).collect();
            let next = self.reassign(reference, &moved, &assignment);
            if next == assignment {
                break;
            }
            assignment = next;

            let permuted: Vec<Point3<f64>> = assignment.iter().map(|&t| target[t]).collect();
            current = superpose(reference, &permuted).ok_or(AlignmentError::Degenerate)?;
            best = best.min(current.rmsd);
        }

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::Bond;
    use nalgebra::{Rotation3, Vector3};

    /// CH2BrCl; the two hydrogens are topologically equivalent and mirror
    /// images of each other through the C-Br-Cl plane.
    fn bromochloromethane() -> (Topology, Vec<Point3<f64>>) {
        let topology = Topology::new(
            ["C", "Cl", "Br", "H", "H"].iter().map(|s| s.to_string()).collect(),
            vec![
                Bond::new(0, 1, 1),
                Bond::new(0, 2, 1),
                Bond::new(0, 3, 1),
                Bond::new(0, 4, 1),
            ],
        )
        .unwrap();
        let coords = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.77),
            Point3::new(1.82, 0.0, -0.64),
            Point3::new(-0.52, 0.89, -0.36),
            Point3::new(-0.52, -0.89, -0.36),
        ];
        (topology, coords)
    }

    fn rotate_and_shift(coords: &[Point3<f64>]) -> Vec<Point3<f64>> {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 1.1)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), -0.4);
        let shift = Vector3::new(3.0, -2.0, 7.5);
        coords.iter().map(|p| rotation * p + shift).collect()
    }

    #[test]
    fn rigid_copy_aligns_to_zero() {
        let (_, coords) = bromochloromethane();
        let moved = rotate_and_shift(&coords);
        let aligner = KabschAligner::new(AlignmentContext::rigid());
        assert!(aligner.rmsd(&coords, &moved).unwrap() < 1e-8);
    }

    #[test]
    fn context_collects_only_multi_member_classes() {
        let (topology, _) = bromochloromethane();
        assert!(!AlignmentContext::for_topology(&topology, false).is_symmetric());
        let context = AlignmentContext::for_topology(&topology, true);
        assert_eq!(context.symmetry_classes(), &[vec![3, 4]]);
    }

    #[test]
    fn swapped_equivalent_atoms_need_symmetry() {
        let (topology, coords) = bromochloromethane();
        // Exchanging the hydrogens mirrors the labelled structure; no proper
        // rotation undoes that.
        let mut swapped = coords.clone();
        swapped.swap(3, 4);
        let swapped = rotate_and_shift(&swapped);

        let rigid = KabschAligner::new(AlignmentContext::rigid());
        assert!(rigid.rmsd(&coords, &swapped).unwrap() > 0.1);

        let symmetric = KabschAligner::new(AlignmentContext::for_topology(&topology, true));
        assert!(symmetric.rmsd(&coords, &swapped).unwrap() < 1e-6);
    }

    #[test]
    fn symmetric_rmsd_never_exceeds_rigid_rmsd() {
        let (topology, coords) = bromochloromethane();
        let mut perturbed = rotate_and_shift(&coords);
        perturbed[3].x += 0.3;
        perturbed[4].z -= 0.2;
        let rigid = KabschAligner::new(AlignmentContext::rigid())
            .rmsd(&coords, &perturbed)
            .unwrap();
        let symmetric = KabschAligner::new(AlignmentContext::for_topology(&topology, true))
            .rmsd(&coords, &perturbed)
            .unwrap();
        assert!(symmetric <= rigid + 1e-12);
    }

    #[test]
    fn mismatched_or_empty_inputs_are_errors() {
        let (_, coords) = bromochloromethane();
        let aligner = KabschAligner::new(AlignmentContext::rigid());
        assert_eq!(
            aligner.rmsd(&coords, &coords[..3]),
            Err(AlignmentError::LengthMismatch {
                reference: 5,
                target: 3
            })
        );
        assert_eq!(aligner.rmsd(&[], &[]), Err(AlignmentError::Empty));
    }
}
