use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The qmjob developers",
    version,
    about = "qmjob - Prepare chained quantum-chemistry input decks and cluster submission scripts from conformer ensembles.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate input decks, submission scripts and a submit manifest for one or more molecules.
    Generate(GenerateArgs),
    /// Find structurally duplicate conformers in a multi-record SDF file.
    Dedup(DedupArgs),
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    // --- Core Arguments ---
    /// Multi-record SDF files, one molecule per file, one record per conformer.
    #[arg(required = true, value_name = "SDF")]
    pub inputs: Vec<PathBuf>,

    /// Root directory for generated files; one subdirectory per molecule.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Workflow Overrides ---
    /// Workflow type: equilibrium, transition_state or test.
    #[arg(short, long, value_name = "TYPE")]
    pub workflow: Option<String>,

    /// Level of theory placed on every route line (e.g. 'APFD').
    #[arg(short, long, value_name = "METHOD")]
    pub theory: Option<String>,

    /// Basis set for elements at or below the light/heavy threshold.
    #[arg(long, value_name = "NAME")]
    pub light_basis_set: Option<String>,

    /// Basis set (and ECP) for heavy elements.
    #[arg(long, value_name = "NAME")]
    pub heavy_basis_set: Option<String>,

    /// Job-level basis keyword used when heavy elements are present.
    #[arg(long, value_name = "NAME")]
    pub generic_basis_set: Option<String>,

    /// Largest atomic number treated as a light element.
    #[arg(long, value_name = "Z")]
    pub max_light_atomic_number: Option<u8>,

    /// Scheduler wall-time limit (e.g. '23:59:00').
    #[arg(long, value_name = "HH:MM:SS")]
    pub wall_time: Option<String>,

    // --- Resource Overrides ---
    /// Upper bound on processors per job.
    #[arg(long, value_name = "INT")]
    pub max_processors: Option<usize>,

    /// Atoms handled per processor.
    #[arg(long, value_name = "INT")]
    pub atoms_per_processor: Option<usize>,

    /// Memory per processor, in GB.
    #[arg(long, value_name = "GB")]
    pub ram_per_processor: Option<usize>,

    // --- Molecule Overrides ---
    /// Identifier used in conformer and checkpoint names. Only valid with a single input.
    #[arg(long, value_name = "ID")]
    pub identifier: Option<String>,

    /// Net charge, overriding the sum of formal charges in the input.
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub charge: Option<i32>,

    /// Spin multiplicity, overriding the value inferred from the electron count.
    #[arg(long, value_name = "INT")]
    pub multiplicity: Option<u8>,

    // --- Deduplication Overrides ---
    /// Override `deduplication.enabled` from the config file.
    #[command(flatten)]
    pub deduplication: DeduplicationToggle,

    /// RMSD threshold (Å) below which two conformers are duplicates.
    #[arg(long, value_name = "FLOAT")]
    pub rmsd_threshold: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S resources.max-processors=8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive flags for enabling conformer deduplication before generation.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct DeduplicationToggle {
    /// Remove duplicate conformers before generating jobs.
    #[arg(long)]
    pub dedup: bool,
    /// Generate jobs for every conformer.
    #[arg(long)]
    pub no_dedup: bool,
}

/// Arguments for the `dedup` subcommand.
#[derive(Args, Debug, Default)]
pub struct DedupArgs {
    /// Multi-record SDF file holding the conformers of one molecule.
    #[arg(required = true, value_name = "SDF")]
    pub input: PathBuf,

    /// Write the retained conformers to this SDF file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// RMSD threshold (Å) below which two conformers are duplicates.
    #[arg(long, value_name = "FLOAT")]
    pub rmsd_threshold: Option<f64>,

    /// Compare atoms in fixed order, without permuting equivalent atoms.
    #[arg(long)]
    pub no_symmetry: bool,

    /// Whether a conformer already marked as duplicate can mark others: inert or propagate.
    #[arg(long, value_name = "POLICY")]
    pub anchor_policy: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
