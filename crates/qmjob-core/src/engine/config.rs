use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error(
        "Unsupported workflow type '{0}'. Allowed types are: equilibrium, transition_state, test."
    )]
    UnsupportedWorkflow(String),
    #[error("Parameter '{0}' must be a positive integer")]
    NonPositive(&'static str),
    #[error("Parameter '{0}' must not be empty")]
    Empty(&'static str),
    #[error("RMSD threshold must be a positive finite number (got {0})")]
    InvalidRmsdThreshold(String),
    #[error("Unknown removed-anchor policy '{0}'. Allowed policies are: inert, propagate.")]
    UnknownAnchorPolicy(String),
}

/// Named, fixed sequence of computational tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Optimization, frequency/properties, excited states.
    Equilibrium,
    /// Transition-state search followed by frequency/properties.
    TransitionState,
    /// Single point; used to check that a deck is accepted by the engine.
    Test,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Equilibrium => "equilibrium",
            WorkflowType::TransitionState => "transition_state",
            WorkflowType::Test => "test",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "equilibrium" => Ok(WorkflowType::Equilibrium),
            "transition_state" => Ok(WorkflowType::TransitionState),
            "test" => Ok(WorkflowType::Test),
            _ => Err(ConfigError::UnsupportedWorkflow(s.to_string())),
        }
    }
}

/// Parameters that shape every deck of a batch. Written next to the decks for provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowParameters {
    pub workflow_type: WorkflowType,
    pub theory: String,
    pub light_basis_set: String,
    pub heavy_basis_set: String,
    pub generic_basis_set: String,
    pub max_light_atomic_number: u8,
    pub wall_time: String,
}

/// Processor and memory sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    max_processors: usize,
    atoms_per_processor: usize,
    ram_per_processor: usize,
}

impl ResourcePolicy {
    pub fn new(
        max_processors: usize,
        atoms_per_processor: usize,
        ram_per_processor: usize,
    ) -> Result<Self, ConfigError> {
        if max_processors == 0 {
            return Err(ConfigError::NonPositive("max_processors"));
        }
        if atoms_per_processor == 0 {
            return Err(ConfigError::NonPositive("atoms_per_processor"));
        }
        if ram_per_processor == 0 {
            return Err(ConfigError::NonPositive("ram_per_processor"));
        }
        Ok(Self {
            max_processors,
            atoms_per_processor,
            ram_per_processor,
        })
    }

    pub fn max_processors(&self) -> usize {
        self.max_processors
    }

    pub fn atoms_per_processor(&self) -> usize {
        self.atoms_per_processor
    }

    /// Memory per processor, in GB.
    pub fn ram_per_processor(&self) -> usize {
        self.ram_per_processor
    }
}

/// Scheduler-facing settings for submission scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Extra GB requested on top of the engine's memory allocation.
    pub memory_headroom: usize,
    pub architecture: String,
    pub engine_command: String,
    pub submit_command: String,
    /// Shell lines emitted verbatim before the engine runs; the defaults also
    /// echo the loaded modules and scratch directory into the job log.
    pub environment: Vec<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            memory_headroom: 4,
            architecture: "intel-[Eg][5o][l-]*".to_string(),
            engine_command: "$g16root/16_avx/g16".to_string(),
            submit_command: "qsub".to_string(),
            environment: vec![
                ". /u/local/Modules/default/init/modules.sh".to_string(),
                "module load gaussian/g16_avx".to_string(),
                "export GAUSS_SCRDIR=$TMPDIR".to_string(),
                "module li".to_string(),
                "echo \"GAUSS_SCRDIR=$GAUSS_SCRDIR\"".to_string(),
            ],
        }
    }
}

/// What happens to matches found against an anchor that is itself a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RemovedAnchorPolicy {
    /// A removed anchor never marks further conformers.
    #[default]
    Inert,
    /// A removed anchor still marks every conformer it matches.
    Propagate,
}

impl FromStr for RemovedAnchorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inert" => Ok(RemovedAnchorPolicy::Inert),
            "propagate" => Ok(RemovedAnchorPolicy::Propagate),
            _ => Err(ConfigError::UnknownAnchorPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeduplicationConfig {
    rmsd_threshold: f64,
    pub symmetry: bool,
    pub anchor_policy: RemovedAnchorPolicy,
}

impl DeduplicationConfig {
    pub fn new(
        rmsd_threshold: f64,
        symmetry: bool,
        anchor_policy: RemovedAnchorPolicy,
    ) -> Result<Self, ConfigError> {
        if !rmsd_threshold.is_finite() || rmsd_threshold <= 0.0 {
            return Err(ConfigError::InvalidRmsdThreshold(rmsd_threshold.to_string()));
        }
        Ok(Self {
            rmsd_threshold,
            symmetry,
            anchor_policy,
        })
    }

    /// Pairs with a post-alignment RMSD strictly below this value (Å) are duplicates.
    pub fn rmsd_threshold(&self) -> f64 {
        self.rmsd_threshold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub workflow: WorkflowParameters,
    pub resources: ResourcePolicy,
    pub cluster: ClusterConfig,
    pub deduplication: Option<DeduplicationConfig>,
}

#[derive(Default)]
pub struct GenerationConfigBuilder {
    workflow_type: Option<WorkflowType>,
    theory: Option<String>,
    light_basis_set: Option<String>,
    heavy_basis_set: Option<String>,
    generic_basis_set: Option<String>,
    max_light_atomic_number: Option<u8>,
    wall_time: Option<String>,
    max_processors: Option<usize>,
    atoms_per_processor: Option<usize>,
    ram_per_processor: Option<usize>,
    cluster: Option<ClusterConfig>,
    deduplication: Option<DeduplicationConfig>,
}

impl GenerationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow_type(mut self, workflow_type: WorkflowType) -> Self {
        self.workflow_type = Some(workflow_type);
        self
    }
    pub fn theory(mut self, theory: impl Into<String>) -> Self {
        self.theory = Some(theory.into());
        self
    }
    pub fn light_basis_set(mut self, name: impl Into<String>) -> Self {
        self.light_basis_set = Some(name.into());
        self
    }
    pub fn heavy_basis_set(mut self, name: impl Into<String>) -> Self {
        self.heavy_basis_set = Some(name.into());
        self
    }
    pub fn generic_basis_set(mut self, name: impl Into<String>) -> Self {
        self.generic_basis_set = Some(name.into());
        self
    }
    pub fn max_light_atomic_number(mut self, z: u8) -> Self {
        self.max_light_atomic_number = Some(z);
        self
    }
    pub fn wall_time(mut self, wall_time: impl Into<String>) -> Self {
        self.wall_time = Some(wall_time.into());
        self
    }
    pub fn max_processors(mut self, n: usize) -> Self {
        self.max_processors = Some(n);
        self
    }
    pub fn atoms_per_processor(mut self, n: usize) -> Self {
        self.atoms_per_processor = Some(n);
        self
    }
    pub fn ram_per_processor(mut self, gb: usize) -> Self {
        self.ram_per_processor = Some(gb);
        self
    }
    pub fn cluster_config(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = Some(cluster);
        self
    }
    pub fn deduplication(mut self, config: Option<DeduplicationConfig>) -> Self {
        self.deduplication = config;
        self
    }

    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        let non_empty = |value: Option<String>, name: &'static str| -> Result<String, ConfigError> {
            let value = value.ok_or(ConfigError::MissingParameter(name))?;
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(value)
        };

        let workflow = WorkflowParameters {
            workflow_type: self
                .workflow_type
                .ok_or(ConfigError::MissingParameter("workflow_type"))?,
            theory: non_empty(self.theory, "theory")?,
            light_basis_set: non_empty(self.light_basis_set, "light_basis_set")?,
            heavy_basis_set: non_empty(self.heavy_basis_set, "heavy_basis_set")?,
            generic_basis_set: non_empty(self.generic_basis_set, "generic_basis_set")?,
            max_light_atomic_number: self
                .max_light_atomic_number
                .ok_or(ConfigError::MissingParameter("max_light_atomic_number"))?,
            wall_time: non_empty(self.wall_time, "wall_time")?,
        };
        let resources = ResourcePolicy::new(
            self.max_processors
                .ok_or(ConfigError::MissingParameter("max_processors"))?,
            self.atoms_per_processor
                .ok_or(ConfigError::MissingParameter("atoms_per_processor"))?,
            self.ram_per_processor
                .ok_or(ConfigError::MissingParameter("ram_per_processor"))?,
        )?;
        let cluster = self.cluster.unwrap_or_default();
        if cluster.engine_command.trim().is_empty() {
            return Err(ConfigError::Empty("engine_command"));
        }
        if cluster.submit_command.trim().is_empty() {
            return Err(ConfigError::Empty("submit_command"));
        }

        Ok(GenerationConfig {
            workflow,
            resources,
            cluster,
            deduplication: self.deduplication,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::new()
            .workflow_type(WorkflowType::Equilibrium)
            .theory("APFD")
            .light_basis_set("6-31G*")
            .heavy_basis_set("LANL2DZ")
            .generic_basis_set("genecp")
            .max_light_atomic_number(36)
            .wall_time("23:59:00")
            .max_processors(16)
            .atoms_per_processor(8)
            .ram_per_processor(4)
    }

    #[test]
    fn workflow_type_parses_known_names() {
        assert_eq!("equilibrium".parse(), Ok(WorkflowType::Equilibrium));
        assert_eq!("transition_state".parse(), Ok(WorkflowType::TransitionState));
        assert_eq!("Transition-State".parse(), Ok(WorkflowType::TransitionState));
        assert_eq!("test".parse(), Ok(WorkflowType::Test));
    }

    #[test]
    fn workflow_type_rejects_unknown_names() {
        assert_eq!(
            "irc".parse::<WorkflowType>(),
            Err(ConfigError::UnsupportedWorkflow("irc".to_string()))
        );
    }

    #[test]
    fn workflow_type_display_round_trips() {
        for wt in [
            WorkflowType::Equilibrium,
            WorkflowType::TransitionState,
            WorkflowType::Test,
        ] {
            assert_eq!(wt.to_string().parse::<WorkflowType>(), Ok(wt));
        }
    }

    #[test]
    fn resource_policy_rejects_zero_fields() {
        assert_eq!(
            ResourcePolicy::new(0, 8, 4),
            Err(ConfigError::NonPositive("max_processors"))
        );
        assert_eq!(
            ResourcePolicy::new(16, 0, 4),
            Err(ConfigError::NonPositive("atoms_per_processor"))
        );
        assert_eq!(
            ResourcePolicy::new(16, 8, 0),
            Err(ConfigError::NonPositive("ram_per_processor"))
        );
    }

    #[test]
    fn deduplication_config_rejects_bad_thresholds() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                DeduplicationConfig::new(bad, false, RemovedAnchorPolicy::Inert),
                Err(ConfigError::InvalidRmsdThreshold(_))
            ));
        }
        let ok = DeduplicationConfig::new(0.5, true, RemovedAnchorPolicy::Propagate).unwrap();
        assert_eq!(ok.rmsd_threshold(), 0.5);
    }

    #[test]
    fn anchor_policy_parses() {
        assert_eq!("inert".parse(), Ok(RemovedAnchorPolicy::Inert));
        assert_eq!("Propagate".parse(), Ok(RemovedAnchorPolicy::Propagate));
        assert!("eager".parse::<RemovedAnchorPolicy>().is_err());
    }

    #[test]
    fn builder_produces_complete_config() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.workflow.workflow_type, WorkflowType::Equilibrium);
        assert_eq!(config.workflow.generic_basis_set, "genecp");
        assert_eq!(config.resources.max_processors(), 16);
        assert_eq!(config.cluster, ClusterConfig::default());
        assert!(config.deduplication.is_none());
    }

    #[test]
    fn builder_reports_missing_parameters() {
        let err = GenerationConfigBuilder::new()
            .workflow_type(WorkflowType::Test)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("theory"));
    }

    #[test]
    fn builder_rejects_empty_strings_and_zero_resources() {
        assert_eq!(
            complete_builder().theory("  ").build().unwrap_err(),
            ConfigError::Empty("theory")
        );
        assert_eq!(
            complete_builder().atoms_per_processor(0).build().unwrap_err(),
            ConfigError::NonPositive("atoms_per_processor")
        );
    }

    #[test]
    fn workflow_parameters_serialize_to_toml() {
        let config = complete_builder().build().unwrap();
        let text = toml::to_string(&config.workflow).unwrap();
        assert!(text.contains("workflow_type = \"equilibrium\""));
        assert!(text.contains("max_light_atomic_number = 36"));
        let back: WorkflowParameters = toml::from_str(&text).unwrap();
        assert_eq!(back, config.workflow);
    }
}
