//! Layered configuration: built-in defaults, then the TOML file, then
//! `--set KEY=VALUE` overrides, then explicit command-line flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
