use crate::core::models::element;
use crate::engine::error::EngineError;
use itertools::Itertools;

/// Distinct element symbols of a molecule split at an atomic-number threshold.
///
/// Both lists keep the order in which each symbol first appears in the
/// molecule, so rendered basis blocks are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementPartition {
    light: Vec<String>,
    heavy: Vec<String>,
}

impl ElementPartition {
    pub fn light(&self) -> &[String] {
        &self.light
    }

    pub fn heavy(&self) -> &[String] {
        &self.heavy
    }

    pub fn has_heavy(&self) -> bool {
        !self.heavy.is_empty()
    }
}

/// Splits `elements` into light (atomic number ≤ `max_light_atomic_number`)
/// and heavy symbols.
///
/// # Errors
///
/// Returns [`EngineError::UnknownElement`] for the first symbol that has no
/// atomic number.
pub fn partition_elements(
    elements: &[String],
    max_light_atomic_number: u8,
) -> Result<ElementPartition, EngineError> {
    let mut partition = ElementPartition::default();
    for symbol in elements
        .iter()
        .unique_by(|symbol| element::normalize_symbol(symbol))
    {
        let z = element::atomic_number(symbol)
            .ok_or_else(|| EngineError::UnknownElement(symbol.clone()))?;
        let symbol = element::normalize_symbol(symbol);
        if z <= max_light_atomic_number {
            partition.light.push(symbol);
        } else {
            partition.heavy.push(symbol);
        }
    }
    Ok(partition)
}
