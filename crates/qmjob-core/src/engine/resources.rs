use crate::engine::config::ResourcePolicy;
use crate::engine::error::EngineError;

/// Processor and memory allocation for every job of one molecule.
///
/// Computed once per molecule; the deck and the submission script read the
/// same plan so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePlan {
    atom_count: usize,
    processors: usize,
    memory_gb: usize,
}

impl ResourcePlan {
    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn processors(&self) -> usize {
        self.processors
    }

    pub fn memory_gb(&self) -> usize {
        self.memory_gb
    }

    /// Link-0 resource lines that open every task of a deck.
    pub fn resource_block(&self) -> String {
        format!("%nprocshared={}\n%Mem={}GB\n", self.processors, self.memory_gb)
    }
}

/// `processors = clamp(atom_count / atoms_per_processor, 1, max_processors)`,
/// `memory = processors * ram_per_processor`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidResourceInput`] when `atom_count` is zero.
pub fn estimate_resources(
    atom_count: usize,
    policy: &ResourcePolicy,
) -> Result<ResourcePlan, EngineError> {
    if atom_count == 0 {
        return Err(EngineError::InvalidResourceInput(
            "atom count must be positive".to_string(),
        ));
    }
    let processors =
        (atom_count / policy.atoms_per_processor()).clamp(1, policy.max_processors());
    Ok(ResourcePlan {
        atom_count,
        processors,
        memory_gb: processors * policy.ram_per_processor(),
    })
}
