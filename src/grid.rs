use std::fmt;

use crate::cells::{Cell, CellKind};
use crate::config::EngineConfig;
use crate::errors::{Error, ErrorKind, Result};
use crate::generators::MazeGenerator;
use crate::positions::Position;
use crate::units::{ColumnsCount, RowsCount};

/// The owning container of all cell state.
///
/// Every `(row, col)` in `[0, rows) x [0, cols)` maps to exactly one cell,
/// keyed by `index = row + col * rows` (row varies fastest). All mutation of
/// cell state goes through the explicit marker methods here; callers only
/// ever read cells.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: RowsCount,
    cols: ColumnsCount,
    start: Position,
    end: Position,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid of all-path cells (plus the start and end markers) for
    /// the given configuration. Fails with `InvalidConfiguration` before any
    /// cell is built.
    pub fn new(config: &EngineConfig) -> Result<Grid> {
        config.validate()?;

        let cells_count = config.cells_count();
        let rows = config.rows;
        let mut cells = Vec::with_capacity(cells_count);
        for index in 0..cells_count {
            let position = Position::new((index % rows) as isize, (index / rows) as isize);
            let kind = if position == config.start {
                CellKind::Start
            } else if position == config.end {
                CellKind::End
            } else {
                CellKind::Path
            };
            cells.push(Cell::new(position, kind));
        }

        Ok(Grid {
            rows: config.rows_count(),
            cols: config.cols_count(),
            start: config.start,
            end: config.end,
            cells,
        })
    }

    pub fn rows(&self) -> RowsCount {
        self.rows
    }

    pub fn cols(&self) -> ColumnsCount {
        self.cols
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn start_position(&self) -> Position {
        self.start
    }

    pub fn end_position(&self) -> Position {
        self.end
    }

    /// The flat index of an in-bounds position, `None` otherwise.
    pub fn position_to_index(&self, position: Position) -> Option<usize> {
        if position.is_within(self.rows, self.cols) {
            let RowsCount(rows) = self.rows;
            Some(position.row as usize + position.col as usize * rows)
        } else {
            None
        }
    }

    /// Look a cell up by flat index.
    pub fn cell(&self, index: usize) -> Result<&Cell> {
        self.cells
            .get(index)
            .ok_or_else(|| ErrorKind::IndexOutOfRange(index, self.cells.len()).into())
    }

    /// Look a cell up by position. The fetched cell must store the queried
    /// position, which guards against a malformed row/column configuration
    /// corrupting the index arithmetic.
    pub fn cell_at(&self, position: Position) -> Result<&Cell> {
        let index = self.position_to_index(position)
            .ok_or_else(|| Error::from(ErrorKind::CellNotFound(position)))?;
        let cell = self.cell(index)?;
        if cell.position() != position {
            return Err(ErrorKind::CellNotFound(position).into());
        }
        Ok(cell)
    }

    /// Visit every cell in ascending index order.
    pub fn for_each_cell<F: FnMut(&Cell)>(&self, mut f: F) {
        for cell in &self.cells {
            f(cell);
        }
    }

    /// Iterate cells in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Recompute every cell's kind from a completed generator's wall
    /// classification. The start and end cells take precedence over whatever
    /// the generator assigned at those positions.
    pub fn assign_kinds(&mut self, generator: &dyn MazeGenerator) {
        let (start, end) = (self.start, self.end);
        for cell in &mut self.cells {
            let position = cell.position();
            let kind = if position == start {
                CellKind::Start
            } else if position == end {
                CellKind::End
            } else if generator.is_wall(position) {
                CellKind::Wall
            } else {
                CellKind::Path
            };
            cell.set_kind(kind);
        }
    }

    /// Mark a cell explored at the given step. First explorer wins; later
    /// calls leave the stamp untouched.
    pub fn mark_explored(&mut self, index: usize, step: u32) -> Result<()> {
        let cells_count = self.cells.len();
        let cell = self.cells
            .get_mut(index)
            .ok_or_else(|| Error::from(ErrorKind::IndexOutOfRange(index, cells_count)))?;
        cell.mark_explored(step);
        Ok(())
    }

    /// Flag a cell as part of the reconstructed fastest path.
    pub fn mark_on_fastest_path(&mut self, index: usize) -> Result<()> {
        let cells_count = self.cells.len();
        let cell = self.cells
            .get_mut(index)
            .ok_or_else(|| Error::from(ErrorKind::IndexOutOfRange(index, cells_count)))?;
        cell.mark_on_fastest_path();
        Ok(())
    }

    /// Set a cell's kind directly. Used by tests and by drivers that build
    /// fixed wall layouts without running a generator.
    pub fn set_kind(&mut self, index: usize, kind: CellKind) -> Result<()> {
        let cells_count = self.cells.len();
        let cell = self.cells
            .get_mut(index)
            .ok_or_else(|| Error::from(ErrorKind::IndexOutOfRange(index, cells_count)))?;
        cell.set_kind(kind);
        Ok(())
    }

    /// Full reset for a fresh run: all explored/path flags cleared and every
    /// kind back to path apart from the start and end markers.
    pub fn reset(&mut self) {
        let (start, end) = (self.start, self.end);
        for cell in &mut self.cells {
            cell.clear_run_flags();
            let position = cell.position();
            let kind = if position == start {
                CellKind::Start
            } else if position == end {
                CellKind::End
            } else {
                CellKind::Path
            };
            cell.set_kind(kind);
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (RowsCount(rows), ColumnsCount(cols)) = (self.rows, self.cols);
        for row in 0..rows {
            for col in 0..cols {
                let index = row + col * rows;
                let cell = &self.cells[index];
                let glyph = match cell.kind() {
                    CellKind::Start => 'S',
                    CellKind::End => 'E',
                    CellKind::Wall => '#',
                    CellKind::Path if cell.is_on_fastest_path() => '*',
                    CellKind::Path if cell.is_explored() => '.',
                    CellKind::Path => ' ',
                };
                f.write_fmt(format_args!("{}", glyph))?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
