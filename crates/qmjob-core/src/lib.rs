//! # qmjob Core Library
//!
//! Preparation of quantum-chemistry batch jobs: checkpoint-chained input decks,
//! matching cluster submission scripts, and structural deduplication of
//! conformers before any expensive computation is queued.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Topology`,
//!   `Conformer`), the element table, structural fingerprints, rigid-body geometry,
//!   and SDF input/output.
//!
//! - **[`engine`]: The Logic Core.** Pure components that partition elements, build
//!   basis-set blocks, size resources, assemble task sequences, render decks and
//!   scripts, and deduplicate conformers by pairwise alignment.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into complete
//!   procedures: deduplicate, plan, and persist the jobs of one or many molecules.

pub mod core;
pub mod engine;
pub mod workflows;
