use crate::cli::GenerateArgs;
use crate::config::builder::build_generate_config;
use crate::config::models::MoleculeOverrides;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use qmjob::core::io::sdf::{SdfFile, assemble_molecule};
use qmjob::core::io::traits::MoleculeFile;
use qmjob::core::models::molecule::Molecule;
use qmjob::engine::progress::ProgressReporter;
use qmjob::workflows;
use std::path::Path;
use tracing::{error, info};

/// Reads one SDF file as a single molecule and applies the run-wide overrides.
pub fn load_molecule(path: &Path, overrides: &MoleculeOverrides) -> Result<Molecule> {
    info!("Loading conformers from {:?}", path);
    let records = SdfFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut molecule =
        assemble_molecule(&records, overrides.identifier.as_deref()).map_err(|e| {
            CliError::FileParsing {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

    if let Some(charge) = overrides.charge {
        molecule = molecule.with_charge(charge);
    }
    if let Some(multiplicity) = overrides.multiplicity {
        molecule = molecule
            .with_multiplicity(multiplicity)
            .map_err(|e| CliError::Argument(e.to_string()))?;
    }
    info!(
        molecule = molecule.label(),
        conformers = molecule.conformers().len(),
        atoms = molecule.atom_count(),
        charge = molecule.charge(),
        multiplicity = molecule.multiplicity(),
        "Molecule loaded."
    );
    Ok(molecule)
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let app_config = build_generate_config(&args)?;
    let total = app_config.inputs.len();

    let mut molecules = Vec::with_capacity(total);
    let mut load_failures = 0;
    for path in &app_config.inputs {
        match load_molecule(path, &app_config.molecule) {
            Ok(molecule) => molecules.push(molecule),
            Err(e) => {
                error!("Skipping {:?}: {}", path, e);
                eprintln!("✗ {}: {}", path.display(), e);
                load_failures += 1;
            }
        }
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Generating {} workflow jobs for {} molecule(s)...",
        app_config.core_config.workflow.workflow_type,
        molecules.len()
    );
    let report = workflows::generate::run_batch(
        &molecules,
        &app_config.core_config,
        &app_config.output_dir,
        &reporter,
        None,
    );

    for summary in &report.generated {
        if summary.duplicates_skipped > 0 {
            println!(
                "✓ {}: {} job(s) written to {} ({} duplicate conformer(s) skipped)",
                summary.molecule,
                summary.jobs_written,
                summary.directory.display(),
                summary.duplicates_skipped
            );
        } else {
            println!(
                "✓ {}: {} job(s) written to {}",
                summary.molecule,
                summary.jobs_written,
                summary.directory.display()
            );
        }
    }
    for (molecule, e) in &report.failed {
        eprintln!("✗ {}: {}", molecule, e);
    }

    let failed = load_failures + report.failed.len();
    if failed > 0 {
        return Err(CliError::PartialFailure { failed, total });
    }
    println!(
        "Submit every job with: bash {}",
        app_config
            .output_dir
            .join(workflows::generate::MANIFEST_FILE)
            .display()
    );
    Ok(())
}
