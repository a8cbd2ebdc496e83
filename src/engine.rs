use crate::cells::Cell;
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::generators::{MazeGenerator, MazeStrategy};
use crate::grid::Grid;
use crate::pathing::{SearchAlgorithm, SearchStatus, SearchStrategy};
use crate::positions::Position;
use crate::scheduler::StepScheduler;

/// Where a run currently stands.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum RunPhase {
    GeneratingMaze,
    Searching,
    PathFound,
    Unreachable,
}

/// Observable run transitions, reported back from `tick`/`step` for the
/// driving layer to react to. `Unreachable` means the current maze has no
/// solution and the collaborator is expected to trigger a full restart.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum EngineEvent {
    MazeCompleted,
    PathFound(Position),
    Unreachable,
}

/// The run context: owns the grid, the active maze and search strategies,
/// the scheduler and the configuration, and is passed explicitly to
/// whatever drives it. One external tick performs at most one bounded unit
/// of generator or search work.
pub struct Engine {
    config: EngineConfig,
    maze_strategy: MazeStrategy,
    search_strategy: SearchStrategy,
    grid: Grid,
    generator: Option<Box<dyn MazeGenerator>>,
    algorithm: Box<dyn SearchAlgorithm>,
    scheduler: StepScheduler,
    phase: RunPhase,
    seed: Option<u64>,
}

impl Engine {
    /// Build a run with entropy-seeded maze generation. Fails with
    /// `InvalidConfiguration` before any state is built.
    pub fn new(config: EngineConfig,
               maze_strategy: MazeStrategy,
               search_strategy: SearchStrategy)
               -> Result<Engine> {
        Engine::build(config, maze_strategy, search_strategy, None)
    }

    /// Build a run whose maze carving is reproducible from a seed.
    pub fn with_seed(config: EngineConfig,
                     maze_strategy: MazeStrategy,
                     search_strategy: SearchStrategy,
                     seed: u64)
                     -> Result<Engine> {
        Engine::build(config, maze_strategy, search_strategy, Some(seed))
    }

    fn build(config: EngineConfig,
             maze_strategy: MazeStrategy,
             search_strategy: SearchStrategy,
             seed: Option<u64>)
             -> Result<Engine> {
        let grid = Grid::new(&config)?;
        let mut generator = match seed {
            Some(seed) => maze_strategy.build_seeded(&config, seed),
            None => maze_strategy.build(&config),
        };
        generator.start();

        Ok(Engine {
            scheduler: StepScheduler::new(config.action_time),
            config,
            maze_strategy,
            search_strategy,
            grid,
            generator: Some(generator),
            algorithm: search_strategy.build(),
            phase: RunPhase::GeneratingMaze,
            seed,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn current_step(&self) -> u32 {
        self.scheduler.steps()
    }

    pub fn maze_complete(&self) -> bool {
        self.phase != RunPhase::GeneratingMaze
    }

    pub fn path_found(&self) -> bool {
        self.phase == RunPhase::PathFound
    }

    /// The reconstructed start-to-end path. Empty until a path is found.
    pub fn path(&self) -> &[Position] {
        self.algorithm.path()
    }

    /// The path as cell snapshots, for collaborators that want kind and
    /// exploration state along with the positions.
    pub fn path_cells(&self) -> Result<Vec<Cell>> {
        self.algorithm
            .path()
            .iter()
            .map(|&position| self.grid.cell_at(position).map(|cell| *cell))
            .collect()
    }

    /// One external tick: consults the scheduler and performs at most one
    /// step when the gate opens.
    pub fn tick(&mut self) -> Result<Option<EngineEvent>> {
        if self.scheduler.should_step() {
            self.step()
        } else {
            Ok(None)
        }
    }

    /// One logical step of whichever stage is active. Stepping a finished
    /// run does nothing.
    pub fn step(&mut self) -> Result<Option<EngineEvent>> {
        match self.phase {
            RunPhase::GeneratingMaze => self.step_generator(),
            RunPhase::Searching => self.step_search(),
            RunPhase::PathFound | RunPhase::Unreachable => Ok(None),
        }
    }

    /// Run the generator to completion eagerly, for drivers that only want
    /// to animate the search stage.
    pub fn complete_maze(&mut self) -> Result<Option<EngineEvent>> {
        let mut event = None;
        while self.phase == RunPhase::GeneratingMaze {
            event = self.step()?;
        }
        Ok(event)
    }

    /// Abandon the run wholesale and set up a fresh one: grid kinds and
    /// flags, generator state, search state and the scheduler all reset.
    pub fn restart(&mut self) -> Result<()> {
        // A fixed seed still varies across restarts, otherwise a seeded
        // unconnected maze would regenerate identically forever.
        self.seed = self.seed.map(|seed| seed.wrapping_add(1));

        self.grid.reset();
        let mut generator = match self.seed {
            Some(seed) => self.maze_strategy.build_seeded(&self.config, seed),
            None => self.maze_strategy.build(&self.config),
        };
        generator.start();
        self.generator = Some(generator);
        self.algorithm = self.search_strategy.build();
        self.scheduler.restart();
        self.phase = RunPhase::GeneratingMaze;
        Ok(())
    }

    fn step_generator(&mut self) -> Result<Option<EngineEvent>> {
        let completed = match self.generator.as_mut() {
            Some(generator) => {
                generator.step();
                generator.is_complete()
            }
            None => true,
        };
        if !completed {
            return Ok(None);
        }

        // Maze done: stamp authoritative kinds onto the grid, then hand over
        // to the search stage. The generator state is no longer needed.
        if let Some(generator) = self.generator.take() {
            self.grid.assign_kinds(&*generator);
        }
        self.algorithm.start(&self.grid)?;
        self.scheduler.restart();
        self.phase = RunPhase::Searching;
        Ok(Some(EngineEvent::MazeCompleted))
    }

    fn step_search(&mut self) -> Result<Option<EngineEvent>> {
        let current_step = self.scheduler.steps();
        match self.algorithm.step(&mut self.grid, current_step)? {
            SearchStatus::InProgress => Ok(None),
            SearchStatus::PathFound => {
                self.phase = RunPhase::PathFound;
                Ok(Some(EngineEvent::PathFound(self.grid.end_position())))
            }
            SearchStatus::Unreachable => {
                self.phase = RunPhase::Unreachable;
                Ok(Some(EngineEvent::Unreachable))
            }
        }
    }
}
