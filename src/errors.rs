use error_chain::error_chain;

use crate::positions::Position;

error_chain! {
    errors {
        /// A raw cell index outside `[0, rows * cols)`.
        IndexOutOfRange(index: usize, cells_count: usize) {
            description("cell index out of range")
            display("cell index {} out of range for a grid of {} cells", index, cells_count)
        }
        /// A position lookup that resolved to a cell storing a different
        /// position, or to no cell at all.
        CellNotFound(position: Position) {
            description("no cell at the queried position")
            display("could not find a cell at position {}", position)
        }
        /// Rejected before a run starts: bad dimensions, out of bounds
        /// start/end, or start equal to end.
        InvalidConfiguration(reason: String) {
            description("invalid engine configuration")
            display("invalid engine configuration: {}", reason)
        }
    }
}
