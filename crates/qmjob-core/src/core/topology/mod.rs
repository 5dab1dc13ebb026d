//! Graph-level identity of molecules.
//!
//! Provides an order-independent [`fingerprint::StructuralFingerprint`] used to
//! check that a batch of conformers really belongs to one molecule, and the
//! atom equivalence classes used for symmetry-aware structural alignment.

pub mod fingerprint;
