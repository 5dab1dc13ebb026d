use crate::engine::config::WorkflowParameters;
use crate::engine::partition::ElementPartition;

const BASIS_SEPARATOR: &str = "****";

/// Basis-set decisions shared by every task of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisSetup {
    /// Basis keyword placed on each route line.
    pub token: String,
    /// Per-element basis declaration appended after each task; empty when no
    /// heavy element is present.
    pub block: String,
}

impl BasisSetup {
    pub fn has_block(&self) -> bool {
        !self.block.is_empty()
    }
}

fn element_line(symbols: &[String]) -> String {
    let mut line = symbols.join(" ");
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str("0\n");
    line
}

/// Builds the basis token and block for a partition.
///
/// With heavy elements the job-level token is the generic basis name and the
/// block declares the orbital basis per element (light, then heavy), followed
/// by a blank line and the heavy elements' ECP declaration. Without heavy
/// elements the token is the light basis name and the block is empty.
pub fn build_basis_setup(
    partition: &ElementPartition,
    light_basis_set: &str,
    heavy_basis_set: &str,
    generic_basis_set: &str,
) -> BasisSetup {
    if !partition.has_heavy() {
        return BasisSetup {
            token: light_basis_set.to_string(),
            block: String::new(),
        };
    }

    let mut block = String::new();
    if !partition.light().is_empty() {
        block.push_str(&element_line(partition.light()));
        block.push_str(&format!("{light_basis_set}\n{BASIS_SEPARATOR}\n"));
    }
    block.push_str(&element_line(partition.heavy()));
    block.push_str(&format!("{heavy_basis_set}\n{BASIS_SEPARATOR}\n"));
    block.push('\n');
    block.push_str(&element_line(partition.heavy()));
    block.push_str(&format!("{heavy_basis_set}\n"));

    BasisSetup {
        token: generic_basis_set.to_string(),
        block,
    }
}

pub fn basis_setup_for(partition: &ElementPartition, params: &WorkflowParameters) -> BasisSetup {
    build_basis_setup(
        partition,
        &params.light_basis_set,
        &params.heavy_basis_set,
        &params.generic_basis_set,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::partition::partition_elements;

    fn partition(elements: &[&str]) -> ElementPartition {
        let owned: Vec<String> = elements.iter().map(|s| s.to_string()).collect();
        partition_elements(&owned, 36).unwrap()
    }

    #[test]
    fn light_only_molecule_uses_light_basis_and_no_block() {
        let setup = build_basis_setup(&partition(&["O", "H", "H"]), "6-31G*", "LANL2DZ", "genecp");
        assert_eq!(setup.token, "6-31G*");
        assert_eq!(setup.block, "");
        assert!(!setup.has_block());
    }

    #[test]
    fn heavy_molecule_uses_generic_token_and_full_block() {
        let setup = build_basis_setup(
            &partition(&["C", "Cs", "O", "O", "O", "Cs"]),
            "6-31G*",
            "LANL2DZ",
            "genecp",
        );
        assert_eq!(setup.token, "genecp");
        assert_eq!(
            setup.block,
            "C O 0\n6-31G*\n****\nCs 0\nLANL2DZ\n****\n\nCs 0\nLANL2DZ\n"
        );
    }

    #[test]
    fn heavy_block_has_two_heavy_basis_mentions_and_two_separators() {
        let setup = build_basis_setup(
            &partition(&["Na", "Br", "C", "I"]),
            "6-31G*",
            "LANL2DZ",
            "genecp",
        );
        assert_eq!(setup.block.matches("LANL2DZ").count(), 2);
        assert_eq!(setup.block.matches(BASIS_SEPARATOR).count(), 2);
        assert!(setup.block.contains("I 0\nLANL2DZ\n"));
    }

    #[test]
    fn heavy_only_molecule_omits_light_declaration() {
        let setup = build_basis_setup(&partition(&["I", "I"]), "6-31G*", "LANL2DZ", "genecp");
        assert_eq!(setup.block, "I 0\nLANL2DZ\n****\n\nI 0\nLANL2DZ\n");
        assert!(!setup.block.contains("6-31G*"));
    }
}
