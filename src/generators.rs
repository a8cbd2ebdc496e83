use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use crate::cells::CellKind;
use crate::config::EngineConfig;
use crate::positions::{Position, DIRECTIONS};
use crate::units::{ColumnsCount, RowsCount};
use crate::utils::{fnv_hashmap, FnvHashMap};

/// Chance of any one cell classifying as a wall under the `Randomized`
/// strategy.
pub const WALL_CHANCE: f64 = 0.3;

/// A maze construction strategy that carves or classifies walls on the grid
/// one bounded unit of work per `step` call.
///
/// A generator is driven by repeated `step` calls until `is_complete`
/// reports true; after that the grid owner reads `is_wall` for every
/// position to assign authoritative cell kinds. Stepping a completed
/// generator is a no-op.
pub trait MazeGenerator {
    fn start(&mut self);
    fn step(&mut self);
    fn is_complete(&self) -> bool;
    fn is_wall(&self, position: Position) -> bool;
}

/// Which maze construction strategy a run uses, selected by configuration
/// at run start.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum MazeStrategy {
    Randomized,
    RecursiveBacktracker,
    ReverseRecursiveBacktracker,
}

impl MazeStrategy {
    /// Build a generator seeded from entropy, ready to be `start`ed.
    pub fn build(self, config: &EngineConfig) -> Box<dyn MazeGenerator> {
        self.build_with_rng(config, XorShiftRng::seed_from_u64(thread_rng().gen()))
    }

    /// Build a generator with a fixed seed so that carving is reproducible.
    pub fn build_seeded(self, config: &EngineConfig, seed: u64) -> Box<dyn MazeGenerator> {
        self.build_with_rng(config, XorShiftRng::seed_from_u64(seed))
    }

    fn build_with_rng(self, config: &EngineConfig, rng: XorShiftRng) -> Box<dyn MazeGenerator> {
        match self {
            MazeStrategy::Randomized => Box::new(Randomized::new()),
            MazeStrategy::RecursiveBacktracker => {
                Box::new(RecursiveBacktracker { carver: Carver::new(config, rng) })
            }
            MazeStrategy::ReverseRecursiveBacktracker => {
                Box::new(ReverseRecursiveBacktracker { carver: Carver::new(config, rng) })
            }
        }
    }
}

/// Classifies every cell as a wall independently with `WALL_CHANCE`,
/// evaluated lazily per query. Holds no per-cell state and completes on its
/// first step. Connectivity is not guaranteed; a downstream search may
/// legitimately find no path through the result.
#[derive(Debug, Default)]
pub struct Randomized {
    complete: bool,
}

impl Randomized {
    pub fn new() -> Randomized {
        Randomized { complete: false }
    }
}

impl MazeGenerator for Randomized {
    fn start(&mut self) {
        self.complete = false;
    }

    fn step(&mut self) {
        self.complete = true;
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn is_wall(&self, _: Position) -> bool {
        thread_rng().gen_bool(WALL_CHANCE)
    }
}

/// Shared stack-based carving state for the recursive backtracker family.
///
/// Carving works on a Position -> CellKind map seeded to all-wall except the
/// start cell. Each step peeks the top of the carve stack, tries the four
/// directions in a fresh random order for an in-bounds wall cell two steps
/// away, and either carves through to it (pushing it) or backtracks (popping
/// the current cell). Termination is guaranteed: the stack strictly grows on
/// a carve, strictly shrinks otherwise, and a carved cell is never a carve
/// target again.
#[derive(Debug)]
struct Carver {
    rows: RowsCount,
    cols: ColumnsCount,
    start: Position,
    stack: Vec<Position>,
    kinds: FnvHashMap<Position, CellKind>,
    rng: XorShiftRng,
    complete: bool,
}

impl Carver {
    fn new(config: &EngineConfig, rng: XorShiftRng) -> Carver {
        Carver {
            rows: config.rows_count(),
            cols: config.cols_count(),
            start: config.start,
            stack: Vec::new(),
            kinds: fnv_hashmap(config.cells_count()),
            rng,
            complete: false,
        }
    }

    fn start(&mut self) {
        self.complete = false;
        self.stack.clear();
        self.kinds.clear();

        let (RowsCount(rows), ColumnsCount(cols)) = (self.rows, self.cols);
        for row in 0..rows {
            for col in 0..cols {
                self.kinds.insert(Position::new(row as isize, col as isize), CellKind::Wall);
            }
        }
        self.kinds.insert(self.start, CellKind::Path);
        self.stack.push(self.start);
    }

    fn step(&mut self) {
        if self.complete {
            return;
        }
        let current = match self.stack.last() {
            Some(&top) => top,
            None => {
                self.complete = true;
                return;
            }
        };

        let mut directions = DIRECTIONS;
        directions.shuffle(&mut self.rng);

        for &direction in &directions {
            let target = current.offset_by(direction, 2);
            if target.is_within(self.rows, self.cols) && target != self.start &&
               self.kinds.get(&target) == Some(&CellKind::Wall) {
                let between = current.offset(direction);
                self.kinds.insert(target, CellKind::Path);
                self.kinds.insert(between, CellKind::Path);
                self.stack.push(target);
                return;
            }
        }

        // No carve candidate in any direction: backtrack.
        self.stack.pop();
    }

    fn carved(&self, position: Position) -> bool {
        self.kinds.get(&position) == Some(&CellKind::Path)
    }
}

/// Stack-based maze carving where the carved side classifies as path.
#[derive(Debug)]
pub struct RecursiveBacktracker {
    carver: Carver,
}

impl RecursiveBacktracker {
    pub fn new(config: &EngineConfig) -> RecursiveBacktracker {
        RecursiveBacktracker {
            carver: Carver::new(config, XorShiftRng::seed_from_u64(thread_rng().gen())),
        }
    }

    pub fn with_seed(config: &EngineConfig, seed: u64) -> RecursiveBacktracker {
        RecursiveBacktracker { carver: Carver::new(config, XorShiftRng::seed_from_u64(seed)) }
    }
}

impl MazeGenerator for RecursiveBacktracker {
    fn start(&mut self) {
        self.carver.start();
    }

    fn step(&mut self) {
        self.carver.step();
    }

    fn is_complete(&self) -> bool {
        self.carver.complete
    }

    fn is_wall(&self, position: Position) -> bool {
        !self.carver.carved(position)
    }
}

/// The same carving process as `RecursiveBacktracker`, but the unvisited
/// side classifies as path and the carved corridors become the walls.
#[derive(Debug)]
pub struct ReverseRecursiveBacktracker {
    carver: Carver,
}

impl ReverseRecursiveBacktracker {
    pub fn new(config: &EngineConfig) -> ReverseRecursiveBacktracker {
        ReverseRecursiveBacktracker {
            carver: Carver::new(config, XorShiftRng::seed_from_u64(thread_rng().gen())),
        }
    }

    pub fn with_seed(config: &EngineConfig, seed: u64) -> ReverseRecursiveBacktracker {
        ReverseRecursiveBacktracker { carver: Carver::new(config, XorShiftRng::seed_from_u64(seed)) }
    }
}

impl MazeGenerator for ReverseRecursiveBacktracker {
    fn start(&mut self) {
        self.carver.start();
    }

    fn step(&mut self) {
        self.carver.step();
    }

    fn is_complete(&self) -> bool {
        self.carver.complete
    }

    fn is_wall(&self, position: Position) -> bool {
        self.carver.carved(position)
    }
}
