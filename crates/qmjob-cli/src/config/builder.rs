use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileDeduplicationConfig};
use super::models::{DedupAppConfig, GenerateAppConfig, MoleculeOverrides};
use crate::cli::{DedupArgs, GenerateArgs};
use crate::error::{CliError, Result};
use qmjob::engine::config::{
    ClusterConfig, DeduplicationConfig, GenerationConfigBuilder, RemovedAnchorPolicy, WorkflowType,
};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

fn load_file_config(path: Option<&Path>, set_values: &[String]) -> Result<FileConfig> {
    let file_config = match path {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    apply_set_values(file_config, set_values)
}

fn build_deduplication(
    defaults: &DefaultsConfig,
    file: FileDeduplicationConfig,
    rmsd_threshold: Option<f64>,
    symmetry: Option<bool>,
    anchor_policy: Option<&str>,
) -> Result<DeduplicationConfig> {
    let anchor_policy = match anchor_policy.or(file.removed_anchor_policy.as_deref()) {
        Some(name) => RemovedAnchorPolicy::from_str(name)?,
        None => defaults.anchor_policy,
    };
    let config = DeduplicationConfig::new(
        rmsd_threshold
            .or(file.rmsd_threshold)
            .unwrap_or(defaults.rmsd_threshold),
        symmetry.or(file.symmetry).unwrap_or(defaults.symmetry),
        anchor_policy,
    )?;
    Ok(config)
}

pub fn build_generate_config(args: &GenerateArgs) -> Result<GenerateAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref(), &args.set_values)?;

    if args.identifier.is_some() && args.inputs.len() > 1 {
        return Err(CliError::Argument(
            "--identifier can only be used with a single input file".to_string(),
        ));
    }

    let workflow_file = file_config.workflow.take().unwrap_or_default();
    let workflow_type = match args
        .workflow
        .as_deref()
        .or(workflow_file.workflow_type.as_deref())
    {
        Some(name) => WorkflowType::from_str(name)?,
        None => defaults.workflow_type,
    };

    let resources_file = file_config.resources.take().unwrap_or_default();
    let cluster_file = file_config.cluster.take().unwrap_or_default();
    let dedup_file = file_config.deduplication.take().unwrap_or_default();

    let cluster = ClusterConfig {
        memory_headroom: cluster_file
            .memory_headroom
            .unwrap_or(defaults.cluster.memory_headroom),
        architecture: cluster_file
            .architecture
            .unwrap_or_else(|| defaults.cluster.architecture.clone()),
        engine_command: cluster_file
            .engine_command
            .unwrap_or_else(|| defaults.cluster.engine_command.clone()),
        submit_command: cluster_file
            .submit_command
            .unwrap_or_else(|| defaults.cluster.submit_command.clone()),
        environment: cluster_file
            .environment
            .unwrap_or_else(|| defaults.cluster.environment.clone()),
    };

    let deduplicate = match (args.deduplication.dedup, args.deduplication.no_dedup) {
        (true, false) => true,
        (false, true) => false,
        _ => dedup_file.enabled.unwrap_or(defaults.deduplicate),
    };
    let deduplication = if deduplicate {
        Some(build_deduplication(
            &defaults,
            dedup_file,
            args.rmsd_threshold,
            None,
            None,
        )?)
    } else {
        None
    };

    let core_config = GenerationConfigBuilder::new()
        .workflow_type(workflow_type)
        .theory(
            args.theory
                .clone()
                .or(workflow_file.theory)
                .unwrap_or(defaults.theory),
        )
        .light_basis_set(
            args.light_basis_set
                .clone()
                .or(workflow_file.light_basis_set)
                .unwrap_or(defaults.light_basis_set),
        )
        .heavy_basis_set(
            args.heavy_basis_set
                .clone()
                .or(workflow_file.heavy_basis_set)
                .unwrap_or(defaults.heavy_basis_set),
        )
        .generic_basis_set(
            args.generic_basis_set
                .clone()
                .or(workflow_file.generic_basis_set)
                .unwrap_or(defaults.generic_basis_set),
        )
        .max_light_atomic_number(
            args.max_light_atomic_number
                .or(workflow_file.max_light_atomic_number)
                .unwrap_or(defaults.max_light_atomic_number),
        )
        .wall_time(
            args.wall_time
                .clone()
                .or(cluster_file.wall_time)
                .unwrap_or(defaults.wall_time),
        )
        .max_processors(
            args.max_processors
                .or(resources_file.max_processors)
                .unwrap_or(defaults.max_processors),
        )
        .atoms_per_processor(
            args.atoms_per_processor
                .or(resources_file.atoms_per_processor)
                .unwrap_or(defaults.atoms_per_processor),
        )
        .ram_per_processor(
            args.ram_per_processor
                .or(resources_file.ram_per_processor)
                .unwrap_or(defaults.ram_per_processor),
        )
        .cluster_config(cluster)
        .deduplication(deduplication)
        .build()?;

    debug!("Resolved generation configuration: {:?}", core_config);

    Ok(GenerateAppConfig {
        inputs: args.inputs.clone(),
        output_dir: args.output_dir.clone(),
        molecule: MoleculeOverrides {
            identifier: args.identifier.clone(),
            charge: args.charge,
            multiplicity: args.multiplicity,
        },
        core_config,
    })
}

pub fn build_dedup_config(args: &DedupArgs) -> Result<DedupAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref(), &args.set_values)?;
    let dedup_file = file_config.deduplication.take().unwrap_or_default();

    let core_config = build_deduplication(
        &defaults,
        dedup_file,
        args.rmsd_threshold,
        args.no_symmetry.then_some(false),
        args.anchor_policy.as_deref(),
    )?;
    debug!("Resolved deduplication configuration: {:?}", core_config);

    Ok(DedupAppConfig {
        input: args.input.clone(),
        output: args.output.clone(),
        core_config,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key.split_once('.') {
            Some(("workflow", field)) => {
                let workflow = config.workflow.get_or_insert_with(Default::default);
                match field {
                    "type" => workflow.workflow_type = Some(value_str.to_string()),
                    "theory" => workflow.theory = Some(value_str.to_string()),
                    "light-basis-set" => workflow.light_basis_set = Some(value_str.to_string()),
                    "heavy-basis-set" => workflow.heavy_basis_set = Some(value_str.to_string()),
                    "generic-basis-set" => {
                        workflow.generic_basis_set = Some(value_str.to_string())
                    }
                    "max-light-atomic-number" => {
                        workflow.max_light_atomic_number =
                            Some(parse_value(key, value_str, "integer")?)
                    }
                    _ => return Err(unsupported_key(key)),
                }
            }
            Some(("resources", field)) => {
                let resources = config.resources.get_or_insert_with(Default::default);
                let value = Some(parse_value(key, value_str, "integer")?);
                match field {
                    "max-processors" => resources.max_processors = value,
                    "atoms-per-processor" => resources.atoms_per_processor = value,
                    "ram-per-processor" => resources.ram_per_processor = value,
                    _ => return Err(unsupported_key(key)),
                }
            }
            Some(("cluster", field)) => {
                let cluster = config.cluster.get_or_insert_with(Default::default);
                match field {
                    "wall-time" => cluster.wall_time = Some(value_str.to_string()),
                    "memory-headroom" => {
                        cluster.memory_headroom = Some(parse_value(key, value_str, "integer")?)
                    }
                    "architecture" => cluster.architecture = Some(value_str.to_string()),
                    "engine-command" => cluster.engine_command = Some(value_str.to_string()),
                    "submit-command" => cluster.submit_command = Some(value_str.to_string()),
                    _ => return Err(unsupported_key(key)),
                }
            }
            Some(("deduplication", field)) => {
                let dedup = config.deduplication.get_or_insert_with(Default::default);
                match field {
                    "enabled" => dedup.enabled = Some(parse_value(key, value_str, "boolean")?),
                    "rmsd-threshold" => {
                        dedup.rmsd_threshold = Some(parse_value(key, value_str, "float")?)
                    }
                    "symmetry" => dedup.symmetry = Some(parse_value(key, value_str, "boolean")?),
                    "removed-anchor-policy" => {
                        dedup.removed_anchor_policy = Some(value_str.to_string())
                    }
                    _ => return Err(unsupported_key(key)),
                }
            }
            _ => return Err(unsupported_key(key)),
        }
    }
    Ok(config)
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unsupported configuration key for --set: '{}'",
        key
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DeduplicationToggle;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_generate_args() -> GenerateArgs {
        GenerateArgs {
            inputs: vec![PathBuf::from("water.sdf")],
            output_dir: PathBuf::from("jobs"),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let app = build_generate_config(&base_generate_args()).expect("build ok");
        let cfg = app.core_config;

        assert_eq!(cfg.workflow.workflow_type, WorkflowType::Equilibrium);
        assert_eq!(cfg.workflow.theory, "APFD");
        assert_eq!(cfg.workflow.light_basis_set, "6-31G*");
        assert_eq!(cfg.workflow.heavy_basis_set, "LANL2DZ");
        assert_eq!(cfg.workflow.generic_basis_set, "genecp");
        assert_eq!(cfg.workflow.max_light_atomic_number, 36);
        assert_eq!(cfg.workflow.wall_time, "23:59:00");
        assert_eq!(cfg.resources.max_processors(), 16);
        assert_eq!(cfg.resources.atoms_per_processor(), 8);
        assert_eq!(cfg.resources.ram_per_processor(), 4);
        assert_eq!(cfg.cluster, ClusterConfig::default());
        assert!(cfg.deduplication.is_none());
        assert_eq!(app.molecule, MoleculeOverrides::default());
    }

    #[test]
    fn file_values_are_merged() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("qmjob.toml");
        let toml = r#"
            [workflow]
            type = "transition_state"
            theory = "B3LYP"
            max-light-atomic-number = 18

            [resources]
            max-processors = 8
            atoms-per-processor = 4

            [cluster]
            wall-time = "47:59:00"
            submit-command = "qsub -q long"

            [deduplication]
            enabled = true
            rmsd-threshold = 0.3
            symmetry = false
            "#;
        fs::write(&cfg_path, toml).unwrap();

        let mut args = base_generate_args();
        args.config = Some(cfg_path);

        let cfg = build_generate_config(&args).expect("build ok").core_config;
        assert_eq!(cfg.workflow.workflow_type, WorkflowType::TransitionState);
        assert_eq!(cfg.workflow.theory, "B3LYP");
        assert_eq!(cfg.workflow.max_light_atomic_number, 18);
        assert_eq!(cfg.workflow.wall_time, "47:59:00");
        assert_eq!(cfg.resources.max_processors(), 8);
        assert_eq!(cfg.resources.atoms_per_processor(), 4);
        assert_eq!(cfg.cluster.submit_command, "qsub -q long");
        let dedup = cfg.deduplication.expect("deduplication enabled");
        assert_eq!(dedup.rmsd_threshold(), 0.3);
        assert!(!dedup.symmetry);
    }

    #[test]
    fn cli_overrides_file_values() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("qmjob.toml");
        fs::write(
            &cfg_path,
            "[workflow]\ntheory = \"B3LYP\"\n[deduplication]\nenabled = true\n",
        )
        .unwrap();

        let mut args = base_generate_args();
        args.config = Some(cfg_path);
        args.theory = Some("M062X".to_string());
        args.workflow = Some("test".to_string());
        args.deduplication = DeduplicationToggle {
            dedup: false,
            no_dedup: true,
        };

        let cfg = build_generate_config(&args).expect("build ok").core_config;
        assert_eq!(cfg.workflow.theory, "M062X");
        assert_eq!(cfg.workflow.workflow_type, WorkflowType::Test);
        assert!(cfg.deduplication.is_none());
    }

    #[test]
    fn set_values_override() {
        let mut args = base_generate_args();
        args.set_values = vec![
            "workflow.type=transition-state".to_string(),
            "resources.ram-per-processor=6".to_string(),
            "cluster.memory-headroom=2".to_string(),
            "deduplication.enabled=true".to_string(),
            "deduplication.removed-anchor-policy=propagate".to_string(),
        ];

        let cfg = build_generate_config(&args).expect("build ok").core_config;
        assert_eq!(cfg.workflow.workflow_type, WorkflowType::TransitionState);
        assert_eq!(cfg.resources.ram_per_processor(), 6);
        assert_eq!(cfg.cluster.memory_headroom, 2);
        assert_eq!(
            cfg.deduplication.unwrap().anchor_policy,
            RemovedAnchorPolicy::Propagate
        );
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in [
            "resources.max-processors",
            "resources.max-processors=many",
            "slurm.max-processors=4",
            "workflow.basis=sto-3g",
        ] {
            let mut args = base_generate_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_generate_config(&args), Err(CliError::Config(_))),
                "expected config error for {bad}"
            );
        }
    }

    #[test]
    fn unsupported_workflow_fails_before_generation() {
        let mut args = base_generate_args();
        args.workflow = Some("irc".to_string());
        let err = build_generate_config(&args).err().expect("should fail");
        assert!(matches!(err, CliError::Config(msg) if msg.contains("irc")));
    }

    #[test]
    fn zero_resources_are_rejected() {
        let mut args = base_generate_args();
        args.atoms_per_processor = Some(0);
        assert!(matches!(
            build_generate_config(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn identifier_requires_single_input() {
        let mut args = base_generate_args();
        args.inputs.push(PathBuf::from("ethanol.sdf"));
        args.identifier = Some("WATER".to_string());
        assert!(matches!(
            build_generate_config(&args),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn dedup_command_config_merges_flags() {
        let args = DedupArgs {
            input: PathBuf::from("confs.sdf"),
            rmsd_threshold: Some(0.2),
            no_symmetry: true,
            anchor_policy: Some("propagate".to_string()),
            ..Default::default()
        };
        let app = build_dedup_config(&args).expect("build ok");
        assert_eq!(app.core_config.rmsd_threshold(), 0.2);
        assert!(!app.core_config.symmetry);
        assert_eq!(app.core_config.anchor_policy, RemovedAnchorPolicy::Propagate);

        let app = build_dedup_config(&DedupArgs {
            input: PathBuf::from("confs.sdf"),
            ..Default::default()
        })
        .expect("build ok");
        assert_eq!(app.core_config.rmsd_threshold(), 0.5);
        assert!(app.core_config.symmetry);
        assert_eq!(app.core_config.anchor_policy, RemovedAnchorPolicy::Inert);
    }

    #[test]
    fn dedup_command_rejects_bad_threshold() {
        let args = DedupArgs {
            input: PathBuf::from("confs.sdf"),
            rmsd_threshold: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            build_dedup_config(&args),
            Err(CliError::Config(_))
        ));
    }
}
