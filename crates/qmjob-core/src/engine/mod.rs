//! # Engine Module
//!
//! The algorithmic core of job preparation: every decision that turns a
//! molecule and a configuration into input decks, submission scripts and a
//! list of redundant conformers.
//!
//! ## Overview
//!
//! Each component is a small, pure function over explicit inputs. Nothing here
//! touches the filesystem; the [`workflows`](crate::workflows) layer composes
//! these pieces and persists their output.
//!
//! ## Architecture
//!
//! - **Element Partitioning** ([`partition`]) - Light/heavy split of a molecule's elements
//! - **Basis Sets** ([`basis`]) - Job-level basis token and per-element basis block
//! - **Resources** ([`resources`]) - Processor and memory sizing from atom count
//! - **Task Sequences** ([`tasks`]) - Ordered, checkpoint-chained tasks per workflow type
//! - **Input Decks** ([`deck`]) - Rendering of the chained input deck
//! - **Cluster Scripts** ([`script`]) - Scheduler script and submit manifest
//! - **Alignment** ([`alignment`]) - Rigid and symmetry-aware structural alignment
//! - **Deduplication** ([`dedup`]) - Pairwise RMSD screening of conformers
//! - **Configuration** ([`config`]) - Typed, validated parameters
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine and deduplication error types

pub mod alignment;
pub mod basis;
pub mod config;
pub mod deck;
pub mod dedup;
pub mod error;
pub mod partition;
pub mod progress;
pub mod resources;
pub mod script;
pub mod tasks;
