use crate::errors::{ErrorKind, Result};
use crate::positions::Position;
use crate::units::{ColumnsCount, RowsCount};

/// Everything a run needs to know up front: grid dimensions, the fixed start
/// and end cells and the logical step interval. Constructed once and passed
/// by reference into the grid and strategy constructors.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    pub start: Position,
    pub end: Position,
    /// Minimum logical time between algorithm steps, in seconds.
    pub action_time: f64,
}

impl EngineConfig {
    pub fn new(rows: usize,
               cols: usize,
               start: Position,
               end: Position,
               action_time: f64)
               -> EngineConfig {
        EngineConfig {
            rows,
            cols,
            start,
            end,
            action_time,
        }
    }

    pub fn rows_count(&self) -> RowsCount {
        RowsCount(self.rows)
    }

    pub fn cols_count(&self) -> ColumnsCount {
        ColumnsCount(self.cols)
    }

    pub fn cells_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, position: Position) -> bool {
        position.is_within(self.rows_count(), self.cols_count())
    }

    /// Reject malformed configurations before any stepping begins.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ErrorKind::InvalidConfiguration(
                format!("grid dimensions must be positive, got {}x{}", self.rows, self.cols))
                .into());
        }
        if !self.contains(self.start) {
            return Err(ErrorKind::InvalidConfiguration(
                format!("start cell {} lies outside the {}x{} grid",
                        self.start, self.rows, self.cols))
                .into());
        }
        if !self.contains(self.end) {
            return Err(ErrorKind::InvalidConfiguration(
                format!("end cell {} lies outside the {}x{} grid",
                        self.end, self.rows, self.cols))
                .into());
        }
        if self.start == self.end {
            return Err(ErrorKind::InvalidConfiguration(
                format!("start and end cells are both {}", self.start)).into());
        }
        if !self.action_time.is_finite() || self.action_time < 0.0 {
            return Err(ErrorKind::InvalidConfiguration(
                format!("action time must be a non-negative number of seconds, got {}",
                        self.action_time))
                .into());
        }
        Ok(())
    }
}
