use crate::core::models::molecule::Topology;
use std::fmt;

/// FNV-1a over explicit little-endian words, so digests match across hosts.
struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }

    fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
        self
    }

    fn word(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    fn words(&mut self, values: impl ExactSizeIterator<Item = u64>) -> &mut Self {
        self.word(values.len() as u64);
        for value in values {
            self.word(value);
        }
        self
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

fn atom_invariant(symbol: &str, degree: usize, formal_charge: i32, bond_orders: &[u8]) -> u64 {
    Fnv1a::new()
        .word(symbol.len() as u64)
        .bytes(symbol.as_bytes())
        .word(degree as u64)
        .word(i64::from(formal_charge) as u64)
        .words(bond_orders.iter().map(|&o| u64::from(o)))
        .finish()
}

fn initial_values(topology: &Topology, adjacency: &[Vec<usize>]) -> Vec<u64> {
    let mut bond_orders = vec![Vec::new(); topology.atom_count()];
    for bond in topology.bonds() {
        bond_orders[bond.a].push(bond.order);
        bond_orders[bond.b].push(bond.order);
    }
    topology
        .elements()
        .iter()
        .enumerate()
        .map(|(i, symbol)| {
            let mut orders = std::mem::take(&mut bond_orders[i]);
            orders.sort_unstable();
            atom_invariant(
                symbol,
                adjacency[i].len(),
                topology.formal_charges()[i],
                &orders,
            )
        })
        .collect()
}

fn ranks_from_values(values: &[u64]) -> Vec<usize> {
    let n = values.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by_key(|&i| values[i]);
    let mut ranks = vec![0usize; n];
    for pos in 1..n {
        ranks[indices[pos]] = if values[indices[pos]] == values[indices[pos - 1]] {
            ranks[indices[pos - 1]]
        } else {
            pos
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Iterated neighbourhood refinement; stops once the partition no longer splits.
fn morgan_refine(adjacency: &[Vec<usize>], values: Vec<u64>) -> (Vec<usize>, Vec<u64>) {
    let mut values = values;
    let mut ranks = ranks_from_values(&values);
    let mut prev_distinct = count_distinct(&ranks);

    loop {
        let new_values: Vec<u64> = adjacency
            .iter()
            .enumerate()
            .map(|(i, neighbors)| {
                let mut neighbor_values: Vec<u64> =
                    neighbors.iter().map(|&nb| values[nb]).collect();
                neighbor_values.sort_unstable();
                Fnv1a::new()
                    .word(values[i])
                    .words(neighbor_values.into_iter())
                    .finish()
            })
            .collect();
        let new_ranks = ranks_from_values(&new_values);
        let distinct = count_distinct(&new_ranks);
        if distinct <= prev_distinct {
            return (ranks, values);
        }
        ranks = new_ranks;
        values = new_values;
        prev_distinct = distinct;
    }
}

/// Order-independent identity of a molecular graph.
///
/// Two topologies that differ only by atom numbering produce equal
/// fingerprints. Different element composition, formal charges or
/// connectivity produce different ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralFingerprint {
    atoms: Vec<u64>,
    bonds: Vec<(u64, u64, u8)>,
}

impl StructuralFingerprint {
    pub fn of(topology: &Topology) -> Self {
        let adjacency = topology.neighbors();
        let (_, values) = morgan_refine(&adjacency, initial_values(topology, &adjacency));

        let mut atoms = values.clone();
        atoms.sort_unstable();

        let mut bonds: Vec<(u64, u64, u8)> = topology
            .bonds()
            .iter()
            .map(|b| {
                let (x, y) = (values[b.a], values[b.b]);
                (x.min(y), x.max(y), b.order)
            })
            .collect();
        bonds.sort_unstable();

        Self { atoms, bonds }
    }

    /// Compact 64-bit digest, suitable as a structure-hash identifier.
    pub fn digest(&self) -> u64 {
        let mut h = Fnv1a::new();
        h.words(self.atoms.iter().copied());
        h.word(self.bonds.len() as u64);
        for &(x, y, order) in &self.bonds {
            h.word(x).word(y).word(u64::from(order));
        }
        h.finish()
    }
}

impl fmt::Display for StructuralFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.digest())
    }
}

/// Groups atoms that are topologically indistinguishable.
///
/// Each inner vector lists atom indices in ascending order; classes are
/// ordered by their smallest member. Singletons are included.
pub fn equivalence_classes(topology: &Topology) -> Vec<Vec<usize>> {
    let adjacency = topology.neighbors();
    let (ranks, _) = morgan_refine(&adjacency, initial_values(topology, &adjacency));

    let mut classes: Vec<Vec<usize>> = Vec::new();
    let mut class_of_rank: std::collections::HashMap<usize, usize> =
        std::collections::HashMap::new();
    for (atom, rank) in ranks.iter().enumerate() {
        match class_of_rank.get(rank) {
            Some(&c) => classes[c].push(atom),
            None => {
                class_of_rank.insert(*rank, classes.len());
                classes.push(vec![atom]);
            }
        }
    }
    classes
}
