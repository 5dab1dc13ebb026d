//! # Core Module
//!
//! Stateless foundations of the library: molecule data models, graph identity,
//! geometry and structure-file I/O.
//!
//! - **Molecular Representation** ([`models`]) - Elements, topologies, conformers and molecules
//! - **Graph Identity** ([`topology`]) - Structural fingerprints and atom equivalence classes
//! - **Geometry** ([`utils`]) - RMSD and rigid-body superposition
//! - **File I/O** ([`io`]) - Multi-conformer SDF reading and writing
//!
//! Nothing in this module performs job generation; that lives in [`crate::engine`].

pub mod io;
pub mod models;
pub mod topology;
pub mod utils;
