use std::fmt;

use crate::units::{ColumnsCount, RowsCount};

/// A cell position on the grid as a (row, column) pair.
///
/// Components are signed so that offsetting past the grid boundary is
/// representable; validity against a particular grid is checked separately.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct Position {
    pub row: isize,
    pub col: isize,
}

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const DIRECTIONS: [Direction; 4] =
    [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

impl Direction {
    /// The (row, column) delta of a single step in this direction.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

impl Position {
    pub fn new(row: isize, col: isize) -> Position {
        Position { row, col }
    }

    /// The position one step away in the given direction.
    pub fn offset(&self, direction: Direction) -> Position {
        self.offset_by(direction, 1)
    }

    /// The position `steps` cells away in the given direction.
    pub fn offset_by(&self, direction: Direction, steps: isize) -> Position {
        let (row_delta, col_delta) = direction.delta();
        Position {
            row: self.row + row_delta * steps,
            col: self.col + col_delta * steps,
        }
    }

    pub fn is_within(&self, rows: RowsCount, cols: ColumnsCount) -> bool {
        let (RowsCount(row_count), ColumnsCount(col_count)) = (rows, cols);
        self.row >= 0 && self.col >= 0 &&
        (self.row as usize) < row_count && (self.col as usize) < col_count
    }

    /// Straight line (Euclidean) distance between two positions.
    pub fn distance(a: Position, b: Position) -> f64 {
        let row_delta = (b.row - a.row) as f64;
        let col_delta = (b.col - a.col) as f64;
        (row_delta * row_delta + col_delta * col_delta).sqrt()
    }
}

impl From<(isize, isize)> for Position {
    fn from(row_col_pair: (isize, isize)) -> Position {
        Position::new(row_col_pair.0, row_col_pair.1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
