use crate::positions::Position;

/// What a grid cell is. Exactly one cell is `Start` and one is `End` for the
/// lifetime of a run; neither is ever `Wall`.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CellKind {
    Path,
    Wall,
    Start,
    End,
}

/// One cell of the grid.
///
/// `explored` and the step it was explored at are write-once per run: the
/// first explorer wins and later marks are ignored. `on_fastest_path` is set
/// only during path reconstruction. Both are cleared only by a full reset.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Cell {
    position: Position,
    kind: CellKind,
    explored: bool,
    explored_at_step: u32,
    on_fastest_path: bool,
}

impl Cell {
    pub(crate) fn new(position: Position, kind: CellKind) -> Cell {
        Cell {
            position,
            kind,
            explored: false,
            explored_at_step: 0,
            on_fastest_path: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_path(&self) -> bool {
        self.kind == CellKind::Path
    }

    pub fn is_wall(&self) -> bool {
        self.kind == CellKind::Wall
    }

    pub fn is_start(&self) -> bool {
        self.kind == CellKind::Start
    }

    pub fn is_end(&self) -> bool {
        self.kind == CellKind::End
    }

    pub fn is_explored(&self) -> bool {
        self.explored
    }

    pub fn is_on_fastest_path(&self) -> bool {
        self.on_fastest_path
    }

    /// How many steps ago this cell was explored, for presentation
    /// gradients. `None` until the cell has been explored.
    pub fn steps_since_explored(&self, current_step: u32) -> Option<u32> {
        if self.explored {
            Some(current_step.saturating_sub(self.explored_at_step))
        } else {
            None
        }
    }

    pub(crate) fn set_kind(&mut self, kind: CellKind) {
        self.kind = kind;
    }

    pub(crate) fn mark_explored(&mut self, step: u32) {
        if !self.explored {
            self.explored = true;
            self.explored_at_step = step;
        }
    }

    pub(crate) fn mark_on_fastest_path(&mut self) {
        self.on_fastest_path = true;
    }

    pub(crate) fn clear_run_flags(&mut self) {
        self.explored = false;
        self.explored_at_step = 0;
        self.on_fastest_path = false;
    }
}
