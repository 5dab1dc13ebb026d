use crate::core::io::traits::MoleculeFile;
use crate::core::models::molecule::{Bond, Conformer, ModelError, Molecule, Topology};
use crate::core::topology::fingerprint::StructuralFingerprint;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const RECORD_DELIMITER: &str = "$$$$";

/// One MDL V2000 record: a single conformer with its connection table.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfRecord {
    pub title: String,
    pub topology: Topology,
    pub conformer: Conformer,
}

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: SdfParseErrorKind,
    },
    #[error("Invalid structure in record {record}: {source}")]
    Model {
        record: usize,
        #[source]
        source: ModelError,
    },
    #[error(
        "Record {record} does not describe the same molecule as record 0 (atoms {found:?}, expected {expected:?})"
    )]
    TopologyMismatch {
        record: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("File contains no structure records")]
    Empty,
}

#[derive(Debug, Error)]
pub enum SdfParseErrorKind {
    #[error("Record ended before the counts line")]
    MissingCountsLine,
    #[error("V3000 connection tables are not supported")]
    UnsupportedV3000,
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Record ended before {expected} atom and bond lines were read")]
    TruncatedBlock { expected: usize },
    #[error("Atom line has an empty element symbol")]
    MissingElement,
    #[error("Malformed 'M  CHG' property line")]
    InvalidChargeProperty,
    #[error("Bond references atom {0}, outside the declared atom range")]
    BondAtomOutOfRange(usize),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<T, SdfError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| SdfError::Parse {
        line: line_num,
        kind: SdfParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, SdfError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| SdfError::Parse {
        line: line_num,
        kind: SdfParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// Atom-block charge codes of the CTfile format.
fn charge_from_code(code: i32) -> i32 {
    match code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn parse_record(lines: &[(usize, String)], record: usize) -> Result<SdfRecord, SdfError> {
    let title = lines
        .first()
        .map(|(_, l)| l.trim().to_string())
        .unwrap_or_default();

    let (counts_line_num, counts_line) = lines.get(3).ok_or_else(|| SdfError::Parse {
        line: lines.last().map(|(n, _)| *n).unwrap_or(1),
        kind: SdfParseErrorKind::MissingCountsLine,
    })?;
    if counts_line.contains("V3000") {
        return Err(SdfError::Parse {
            line: *counts_line_num,
            kind: SdfParseErrorKind::UnsupportedV3000,
        });
    }
    let atom_count: usize = parse_int(counts_line, *counts_line_num, 0, 3)?;
    let bond_count: usize = parse_int(counts_line, *counts_line_num, 3, 6)?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    if lines.len() < bond_start + bond_count {
        return Err(SdfError::Parse {
            line: lines.last().map(|(n, _)| *n).unwrap_or(*counts_line_num),
            kind: SdfParseErrorKind::TruncatedBlock {
                expected: atom_count + bond_count,
            },
        });
    }

    let mut elements = Vec::with_capacity(atom_count);
    let mut coordinates = Vec::with_capacity(atom_count);
    let mut charges = Vec::with_capacity(atom_count);
    for (line_num, line) in &lines[atom_start..bond_start] {
        let x = parse_float(line, *line_num, 0, 10)?;
        let y = parse_float(line, *line_num, 10, 20)?;
        let z = parse_float(line, *line_num, 20, 30)?;
        let symbol = slice_and_trim(line, 31, 34);
        if symbol.is_empty() {
            return Err(SdfError::Parse {
                line: *line_num,
                kind: SdfParseErrorKind::MissingElement,
            });
        }
        let charge_code = slice_and_trim(line, 36, 39);
        let charge = if charge_code.is_empty() {
            0
        } else {
            charge_from_code(parse_int(line, *line_num, 36, 39)?)
        };
        elements.push(symbol.to_string());
        coordinates.push(Point3::new(x, y, z));
        charges.push(charge);
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for (line_num, line) in &lines[bond_start..bond_start + bond_count] {
        let a: usize = parse_int(line, *line_num, 0, 3)?;
        let b: usize = parse_int(line, *line_num, 3, 6)?;
        let order: u8 = parse_int(line, *line_num, 6, 9)?;
        for atom in [a, b] {
            if atom == 0 || atom > atom_count {
                return Err(SdfError::Parse {
                    line: *line_num,
                    kind: SdfParseErrorKind::BondAtomOutOfRange(atom),
                });
            }
        }
        bonds.push(Bond::new(a - 1, b - 1, order));
    }

    // Any `M  CHG` line supersedes the atom-block charge codes.
    let mut property_charges: Option<Vec<i32>> = None;
    for (line_num, line) in &lines[bond_start + bond_count..] {
        if line.starts_with("M  END") {
            break;
        }
        if !line.starts_with("M  CHG") {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().skip(2).collect();
        let invalid = || SdfError::Parse {
            line: *line_num,
            kind: SdfParseErrorKind::InvalidChargeProperty,
        };
        let count: usize = tokens.first().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
        if tokens.len() < 1 + 2 * count {
            return Err(invalid());
        }
        let target = property_charges.get_or_insert_with(|| vec![0; atom_count]);
        for pair in tokens[1..1 + 2 * count].chunks(2) {
            let atom: usize = pair[0].parse().map_err(|_| invalid())?;
            let value: i32 = pair[1].parse().map_err(|_| invalid())?;
            if atom == 0 || atom > atom_count {
                return Err(invalid());
            }
            target[atom - 1] = value;
        }
    }

    let topology =
        Topology::with_formal_charges(elements, bonds, property_charges.unwrap_or(charges))
            .map_err(|source| SdfError::Model { record, source })?;

    Ok(SdfRecord {
        title,
        topology,
        conformer: Conformer::new(coordinates),
    })
}

pub struct SdfFile;

impl MoleculeFile for SdfFile {
    type Record = SdfRecord;
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<SdfRecord>, SdfError> {
        let mut records = Vec::new();
        let mut block: Vec<(usize, String)> = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            if line.trim() == RECORD_DELIMITER {
                if block.iter().any(|(_, l)| !l.trim().is_empty()) {
                    records.push(parse_record(&block, records.len())?);
                }
                block.clear();
                continue;
            }
            block.push((line_num + 1, line));
        }
        if block.iter().any(|(_, l)| !l.trim().is_empty()) {
            records.push(parse_record(&block, records.len())?);
        }

        if records.is_empty() {
            return Err(SdfError::Empty);
        }
        Ok(records)
    }

    fn write_to(records: &[SdfRecord], writer: &mut impl Write) -> Result<(), SdfError> {
        for record in records {
            let topology = &record.topology;
            writeln!(writer, "{}", record.title)?;
            writeln!(writer, "  qmjob")?;
            writeln!(writer)?;
            writeln!(
                writer,
                "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
                topology.atom_count(),
                topology.bonds().len()
            )?;
            for (symbol, p) in topology
                .elements()
                .iter()
                .zip(record.conformer.coordinates())
            {
                writeln!(
                    writer,
                    "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
                    p.x, p.y, p.z, symbol
                )?;
            }
            for bond in topology.bonds() {
                writeln!(
                    writer,
                    "{:>3}{:>3}{:>3}  0",
                    bond.a + 1,
                    bond.b + 1,
                    bond.order
                )?;
            }
            let charged: Vec<(usize, i32)> = topology
                .formal_charges()
                .iter()
                .enumerate()
                .filter(|(_, c)| **c != 0)
                .map(|(i, c)| (i + 1, *c))
                .collect();
            for chunk in charged.chunks(8) {
                let mut line = format!("M  CHG{:>3}", chunk.len());
                for (atom, charge) in chunk {
                    line.push_str(&format!(" {:>3} {:>3}", atom, charge));
                }
                writeln!(writer, "{}", line)?;
            }
            writeln!(writer, "M  END")?;
            writeln!(writer, "{}", RECORD_DELIMITER)?;
        }
        Ok(())
    }
}

/// Assembles the records of one molecule into a [`Molecule`].
///
/// The first record supplies the topology and the name; every record
/// contributes one conformer, in file order. Every later record must list the
/// same elements in the same order and share the first record's structural
/// fingerprint. Without an explicit identifier the fingerprint digest is used.
pub fn assemble_molecule(
    records: &[SdfRecord],
    identifier: Option<&str>,
) -> Result<Molecule, SdfError> {
    let first = records.first().ok_or(SdfError::Empty)?;
    let fingerprint = StructuralFingerprint::of(&first.topology);
    for (record, other) in records.iter().enumerate().skip(1) {
        let same = other.topology == first.topology
            || (other.topology.elements() == first.topology.elements()
                && other.topology.formal_charges() == first.topology.formal_charges()
                && StructuralFingerprint::of(&other.topology) == fingerprint);
        if !same {
            return Err(SdfError::TopologyMismatch {
                record,
                expected: first.topology.elements().to_vec(),
                found: other.topology.elements().to_vec(),
            });
        }
    }
    let identifier = identifier
        .map(str::to_string)
        .unwrap_or_else(|| fingerprint.to_string());
    let conformers = records.iter().map(|r| r.conformer.clone()).collect();
    let molecule = Molecule::new(identifier, first.topology.clone(), conformers).map_err(
        |source| {
            let record = match &source {
                ModelError::AtomCountMismatch { conformer, .. } => *conformer,
                _ => 0,
            };
            SdfError::Model { record, source }
        },
    )?;
    Ok(molecule.with_name(first.title.clone()))
}
