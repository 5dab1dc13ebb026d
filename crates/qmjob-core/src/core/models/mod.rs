//! Data models for molecules, their topologies and conformers.
//!
//! A [`molecule::Molecule`] owns one [`molecule::Topology`] (elements, bonds,
//! formal charges) and any number of [`molecule::Conformer`]s, each a coordinate
//! array parallel to the element list. Conformers are never mutated after
//! construction; downstream components only read them.

pub mod element;
pub mod molecule;
