use super::element;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ModelError {
    #[error("Bond {index} references atom {atom}, but the topology only has {atom_count} atoms")]
    BondOutOfRange {
        index: usize,
        atom: usize,
        atom_count: usize,
    },
    #[error("Formal charge list has {found} entries, expected one per atom ({expected})")]
    ChargeCountMismatch { expected: usize, found: usize },
    #[error("Conformer {conformer} has {found} atoms, but the element list has {expected}")]
    AtomCountMismatch {
        conformer: usize,
        expected: usize,
        found: usize,
    },
    #[error("A molecule must have at least one conformer")]
    NoConformers,
    #[error("A molecule must have at least one atom")]
    EmptyTopology,
    #[error("Spin multiplicity must be at least 1")]
    InvalidMultiplicity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: u8,
}

impl Bond {
    pub fn new(a: usize, b: usize, order: u8) -> Self {
        Self { a, b, order }
    }
}

/// Atom and bond identity of a molecule, shared by all of its conformers.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    elements: Vec<String>,
    bonds: Vec<Bond>,
    formal_charges: Vec<i32>,
}

impl Topology {
    pub fn new(elements: Vec<String>, bonds: Vec<Bond>) -> Result<Self, ModelError> {
        let atom_count = elements.len();
        Self::with_formal_charges(elements, bonds, vec![0; atom_count])
    }

    pub fn with_formal_charges(
        elements: Vec<String>,
        bonds: Vec<Bond>,
        formal_charges: Vec<i32>,
    ) -> Result<Self, ModelError> {
        let atom_count = elements.len();
        if atom_count == 0 {
            return Err(ModelError::EmptyTopology);
        }
        if formal_charges.len() != atom_count {
            return Err(ModelError::ChargeCountMismatch {
                expected: atom_count,
                found: formal_charges.len(),
            });
        }
        for (index, bond) in bonds.iter().enumerate() {
            for atom in [bond.a, bond.b] {
                if atom >= atom_count {
                    return Err(ModelError::BondOutOfRange {
                        index,
                        atom,
                        atom_count,
                    });
                }
            }
        }
        Ok(Self {
            elements: elements
                .iter()
                .map(|s| element::normalize_symbol(s))
                .collect(),
            bonds,
            formal_charges,
        })
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn formal_charges(&self) -> &[i32] {
        &self.formal_charges
    }

    pub fn atom_count(&self) -> usize {
        self.elements.len()
    }

    pub fn net_charge(&self) -> i32 {
        self.formal_charges.iter().sum()
    }

    /// Adjacency lists derived from the bond table.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.atom_count()];
        for bond in &self.bonds {
            adjacency[bond.a].push(bond.b);
            adjacency[bond.b].push(bond.a);
        }
        adjacency
    }
}

/// One 3-D arrangement of a molecule's atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformer {
    coordinates: Vec<Point3<f64>>,
}

impl Conformer {
    pub fn new(coordinates: Vec<Point3<f64>>) -> Self {
        Self { coordinates }
    }

    pub fn from_rows(rows: &[[f64; 3]]) -> Self {
        Self::new(rows.iter().map(|r| Point3::new(r[0], r[1], r[2])).collect())
    }

    pub fn coordinates(&self) -> &[Point3<f64>] {
        &self.coordinates
    }

    pub fn atom_count(&self) -> usize {
        self.coordinates.len()
    }
}

/// A molecule together with every conformer generated for it.
///
/// The element list is fixed across all conformers: construction fails with
/// [`ModelError::AtomCountMismatch`] if any conformer disagrees with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    identifier: String,
    name: Option<String>,
    topology: Topology,
    charge: i32,
    multiplicity: u8,
    explicit_multiplicity: bool,
    conformers: Vec<Conformer>,
}

impl Molecule {
    /// Builds a molecule whose charge is the sum of the topology's formal
    /// charges and whose multiplicity is inferred from the electron count.
    pub fn new(
        identifier: impl Into<String>,
        topology: Topology,
        conformers: Vec<Conformer>,
    ) -> Result<Self, ModelError> {
        if conformers.is_empty() {
            return Err(ModelError::NoConformers);
        }
        for (index, conformer) in conformers.iter().enumerate() {
            if conformer.atom_count() != topology.atom_count() {
                return Err(ModelError::AtomCountMismatch {
                    conformer: index,
                    expected: topology.atom_count(),
                    found: conformer.atom_count(),
                });
            }
        }
        let charge = topology.net_charge();
        let multiplicity = infer_multiplicity(topology.elements(), charge).unwrap_or(1);
        Ok(Self {
            identifier: identifier.into(),
            name: None,
            topology,
            charge,
            multiplicity,
            explicit_multiplicity: false,
            conformers,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// Overrides the net charge. Unless a multiplicity was set explicitly, it
    /// is inferred again from the new electron count.
    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        if !self.explicit_multiplicity {
            self.multiplicity =
                infer_multiplicity(self.topology.elements(), charge).unwrap_or(self.multiplicity);
        }
        self
    }

    /// Overrides the spin multiplicity; later charge overrides keep it.
    pub fn with_multiplicity(mut self, multiplicity: u8) -> Result<Self, ModelError> {
        if multiplicity == 0 {
            return Err(ModelError::InvalidMultiplicity);
        }
        self.multiplicity = multiplicity;
        self.explicit_multiplicity = true;
        Ok(self)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Directory label for generated files: the name if present, else the identifier.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn elements(&self) -> &[String] {
        self.topology.elements()
    }

    pub fn atom_count(&self) -> usize {
        self.topology.atom_count()
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn multiplicity(&self) -> u8 {
        self.multiplicity
    }

    pub fn conformers(&self) -> &[Conformer] {
        &self.conformers
    }

    pub fn conformer(&self, index: usize) -> Option<&Conformer> {
        self.conformers.get(index)
    }

    /// Unique per-conformer name, `{identifier}_conf_{index}`.
    pub fn conformer_name(&self, index: usize) -> String {
        format!("{}_conf_{}", self.identifier, index)
    }
}

/// Lowest spin multiplicity compatible with the electron count: singlet for an
/// even number of electrons, doublet for odd. `None` if an element is unknown.
pub fn infer_multiplicity(elements: &[String], charge: i32) -> Option<u8> {
    let mut electrons: i64 = 0;
    for symbol in elements {
        electrons += i64::from(element::atomic_number(symbol)?);
    }
    electrons -= i64::from(charge);
    Some(if electrons.rem_euclid(2) == 0 { 1 } else { 2 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_topology() -> Topology {
        Topology::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![Bond::new(0, 1, 1), Bond::new(0, 2, 1)],
        )
        .unwrap()
    }

    fn water_conformer() -> Conformer {
        Conformer::from_rows(&[
            [0.0, 0.0, 0.1173],
            [0.0, 0.7572, -0.4692],
            [0.0, -0.7572, -0.4692],
        ])
    }

    #[test]
    fn molecule_new_infers_charge_and_multiplicity() {
        let mol = Molecule::new("water", water_topology(), vec![water_conformer()]).unwrap();
        assert_eq!(mol.charge(), 0);
        assert_eq!(mol.multiplicity(), 1);
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.label(), "water");
    }

    #[test]
    fn charge_override_updates_inferred_multiplicity() {
        let cation = Molecule::new("water", water_topology(), vec![water_conformer()])
            .unwrap()
            .with_charge(1);
        assert_eq!(cation.charge(), 1);
        assert_eq!(cation.multiplicity(), 2);

        let dication = cation.with_charge(2);
        assert_eq!(dication.multiplicity(), 1);
    }

    #[test]
    fn explicit_multiplicity_survives_charge_override() {
        let triplet = Molecule::new("water", water_topology(), vec![water_conformer()])
            .unwrap()
            .with_multiplicity(3)
            .unwrap()
            .with_charge(0);
        assert_eq!(triplet.multiplicity(), 3);
    }

    #[test]
    fn molecule_new_rejects_conformer_with_wrong_atom_count() {
        let short = Conformer::from_rows(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let err = Molecule::new("water", water_topology(), vec![water_conformer(), short])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::AtomCountMismatch {
                conformer: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn molecule_new_requires_a_conformer() {
        let err = Molecule::new("water", water_topology(), vec![]).unwrap_err();
        assert_eq!(err, ModelError::NoConformers);
    }

    #[test]
    fn topology_rejects_out_of_range_bonds() {
        let err = Topology::new(vec!["H".into(), "H".into()], vec![Bond::new(0, 2, 1)])
            .unwrap_err();
        assert!(matches!(err, ModelError::BondOutOfRange { atom: 2, .. }));
    }

    #[test]
    fn topology_normalizes_element_symbols() {
        let topology = Topology::new(vec!["cl".into(), "BR".into()], vec![]).unwrap();
        assert_eq!(topology.elements(), &["Cl".to_string(), "Br".to_string()]);
    }

    #[test]
    fn radical_gets_doublet_multiplicity() {
        let methyl = Topology::new(
            vec!["C".into(), "H".into(), "H".into(), "H".into()],
            vec![Bond::new(0, 1, 1), Bond::new(0, 2, 1), Bond::new(0, 3, 1)],
        )
        .unwrap();
        let conf = Conformer::from_rows(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let mol = Molecule::new("methyl", methyl, vec![conf]).unwrap();
        assert_eq!(mol.multiplicity(), 2);
    }

    #[test]
    fn name_takes_precedence_for_label_but_not_conformer_name() {
        let mol = Molecule::new("XLYOFNOQVPJJNP", water_topology(), vec![water_conformer()])
            .unwrap()
            .with_name("water");
        assert_eq!(mol.label(), "water");
        assert_eq!(mol.conformer_name(2), "XLYOFNOQVPJJNP_conf_2");
    }

    #[test]
    fn with_multiplicity_rejects_zero() {
        let mol = Molecule::new("water", water_topology(), vec![water_conformer()]).unwrap();
        assert_eq!(
            mol.with_multiplicity(0).unwrap_err(),
            ModelError::InvalidMultiplicity
        );
    }
}
