use crate::cli::DedupArgs;
use crate::config::builder::build_dedup_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use qmjob::core::io::sdf::SdfFile;
use qmjob::core::io::traits::MoleculeFile;
use qmjob::engine::progress::ProgressReporter;
use qmjob::workflows::deduplicate::{find_duplicate_records, retain_unique};
use tracing::info;

pub fn run(args: DedupArgs) -> Result<()> {
    let app_config = build_dedup_config(&args)?;

    info!("Loading conformers from {:?}", &app_config.input);
    let records =
        SdfFile::read_from_path(&app_config.input).map_err(|e| CliError::FileParsing {
            path: app_config.input.clone(),
            source: e,
        })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Comparing {} conformer(s) (RMSD threshold {} Å)...",
        records.len(),
        app_config.core_config.rmsd_threshold()
    );
    let duplicates =
        find_duplicate_records(&records, &app_config.core_config, &reporter, None)?;

    if duplicates.is_empty() {
        println!("No duplicate conformers found.");
    } else {
        println!(
            "{} duplicate conformer(s): {}",
            duplicates.len(),
            duplicates
                .indices()
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if let Some(output) = &app_config.output {
        let unique = retain_unique(&records, &duplicates);
        SdfFile::write_to_path(&unique, output).map_err(|e| CliError::FileParsing {
            path: output.clone(),
            source: e,
        })?;
        println!(
            "✓ {} unique conformer(s) written to: {}",
            unique.len(),
            output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn water_record(y: f64, z: f64) -> String {
        format!(
            "\
water
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.1173 O   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000{:>10.4}{:>10.4} H   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000{:>10.4}{:>10.4} H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  1  3  1  0
M  END
$$$$
",
            y, z, -y, z
        )
    }

    #[test]
    fn writes_only_unique_conformers() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("confs.sdf");
        let output = dir.path().join("unique.sdf");
        let content = [
            water_record(0.7572, -0.4692),
            water_record(0.7572, -0.4692),
            water_record(1.4000, -1.6000),
        ]
        .concat();
        fs::write(&input, content).unwrap();

        run(DedupArgs {
            input,
            output: Some(output.clone()),
            ..Default::default()
        })
        .unwrap();

        let unique = SdfFile::read_from_path(&output).unwrap();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn missing_input_reports_the_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("absent.sdf");
        let err = run(DedupArgs {
            input: input.clone(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CliError::FileParsing { path, .. } if path == input));
    }
}
