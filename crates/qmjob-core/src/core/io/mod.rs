//! Provides input/output functionality for structure files.
//!
//! Conformer ensembles arrive as multi-record MDL SDF files, one record per
//! conformer of a single molecule. The [`traits::MoleculeFile`] trait gives a
//! uniform read/write API; [`sdf::assemble_molecule`] folds the records of one
//! file into a [`crate::core::models::molecule::Molecule`].

pub mod sdf;
pub mod traits;
