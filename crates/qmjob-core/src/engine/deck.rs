use crate::engine::tasks::TaskDescriptor;
use nalgebra::Point3;
use std::fmt::Write;

const LINK_SEPARATOR: &str = "--Link1--";

/// Everything needed to render one conformer's chained input deck.
#[derive(Debug, Clone, Copy)]
pub struct DeckRequest<'a> {
    pub tasks: &'a [TaskDescriptor],
    /// Unique within the molecule; doubles as the title line and checkpoint stem.
    pub conformer_name: &'a str,
    pub resource_block: &'a str,
    pub coordinate_block: &'a str,
    pub charge: i32,
    pub multiplicity: u8,
    pub basis_block: &'a str,
}

/// Checkpoint file for task `index` of `conformer_name`.
pub fn checkpoint_name(conformer_name: &str, index: usize) -> String {
    format!("{conformer_name}_{index}.chk")
}

/// One line per atom: symbol, then x/y/z in fixed-width columns.
pub fn coordinate_block(elements: &[String], coordinates: &[Point3<f64>]) -> String {
    let mut block = String::with_capacity(elements.len() * 52);
    for (symbol, point) in elements.iter().zip(coordinates) {
        // Writing to a String cannot fail.
        let _ = writeln!(
            block,
            "{:<2} {:>15.10} {:>15.10} {:>15.10}",
            symbol, point.x, point.y, point.z
        );
    }
    block
}

/// Renders the chained deck text.
///
/// The first task carries the title, charge/multiplicity and geometry. Every
/// later task is introduced by a link separator, reads the previous task's
/// checkpoint and writes its own, and takes its geometry from the checkpoint.
pub fn render_deck(request: &DeckRequest<'_>) -> String {
    let name = request.conformer_name;
    let mut deck = String::new();

    for task in request.tasks {
        if task.continues_from_checkpoint {
            deck.push('\n');
            deck.push_str(LINK_SEPARATOR);
            deck.push('\n');
            deck.push_str(request.resource_block);
            let previous = task.index.saturating_sub(1);
            let _ = writeln!(deck, "%Oldchk={}", checkpoint_name(name, previous));
            let _ = writeln!(deck, "%Chk={}", checkpoint_name(name, task.index));
            let _ = writeln!(deck, "# {}", task.keyword);
            deck.push('\n');
        } else {
            deck.push_str(request.resource_block);
            let _ = writeln!(deck, "%Chk={}", checkpoint_name(name, task.index));
            let _ = writeln!(deck, "# {}", task.keyword);
            deck.push('\n');
            let _ = writeln!(deck, "{name}");
            deck.push('\n');
            let _ = writeln!(deck, "{} {}", request.charge, request.multiplicity);
            deck.push_str(request.coordinate_block);
            deck.push('\n');
        }
        deck.push_str(request.basis_block);
    }

    deck.push_str("\n\n");
    deck
}
