use qmjob::engine::config::{ClusterConfig, RemovedAnchorPolicy, WorkflowType};

pub struct DefaultsConfig {
    pub workflow_type: WorkflowType,
    pub theory: String,
    pub light_basis_set: String,
    pub heavy_basis_set: String,
    pub generic_basis_set: String,
    pub max_light_atomic_number: u8,
    pub wall_time: String,
    pub max_processors: usize,
    pub atoms_per_processor: usize,
    pub ram_per_processor: usize,
    pub cluster: ClusterConfig,
    pub deduplicate: bool,
    pub rmsd_threshold: f64,
    pub symmetry: bool,
    pub anchor_policy: RemovedAnchorPolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            workflow_type: WorkflowType::Equilibrium,
            theory: "APFD".to_string(),
            light_basis_set: "6-31G*".to_string(),
            heavy_basis_set: "LANL2DZ".to_string(),
            generic_basis_set: "genecp".to_string(),
            max_light_atomic_number: 36,
            wall_time: "23:59:00".to_string(),
            max_processors: 16,
            atoms_per_processor: 8,
            ram_per_processor: 4,
            cluster: ClusterConfig::default(),
            deduplicate: false,
            rmsd_threshold: 0.5,
            symmetry: true,
            anchor_policy: RemovedAnchorPolicy::Inert,
        }
    }
}
