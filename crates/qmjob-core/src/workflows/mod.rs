//! # Workflows Module
//!
//! High-level entry points that compose the [`engine`](crate::engine)
//! components into complete procedures.
//!
//! ## Overview
//!
//! Workflows take validated configuration and in-memory molecules, report
//! progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter),
//! and keep pure planning separate from writing files.
//!
//! ## Architecture
//!
//! - **Job Generation** ([`generate`]) - Plans decks, scripts and the submit manifest for a
//!   molecule, then persists them; also drives multi-molecule batches
//! - **Deduplication** ([`deduplicate`]) - Screens the conformers of a molecule or the records
//!   of a conformer file for structural duplicates

pub mod deduplicate;
pub mod generate;
