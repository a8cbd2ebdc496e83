use std::thread;
use std::time::Duration;

use docopt::Docopt;
use error_chain::bail;
use serde_derive::Deserialize;
use stepfind::{
    config::EngineConfig,
    engine::{Engine, EngineEvent, RunPhase},
    generators::MazeStrategy,
    pathing::SearchStrategy,
    positions::Position,
};

const USAGE: &str = "Stepfind

Usage:
    stepfind_driver -h | --help
    stepfind_driver [--rows=<r> --cols=<c>] [--maze=<strategy>] [--search=<strategy>] [--start=<r,c>] [--end=<r,c>] [--action-time=<secs>] [--fps=<n>] [--seed=<n>] [--animate] [--max-restarts=<n>]

Options:
    -h --help              Show this screen.
    --rows=<r>             Grid row count [default: 21].
    --cols=<c>             Grid column count [default: 21].
    --maze=<strategy>      Maze strategy: randomized, recursive-backtracker or reverse-recursive-backtracker [default: recursive-backtracker].
    --search=<strategy>    Search strategy: flood-fill or astar [default: astar].
    --start=<r,c>          Start cell, defaults to the top-left corner.
    --end=<r,c>            End cell, defaults to the bottom-right corner.
    --action-time=<secs>   Minimum seconds between algorithm steps [default: 0.02].
    --fps=<n>              External ticks per second [default: 240].
    --seed=<n>             Fix the maze generation seed for a reproducible run.
    --animate              Step the maze generation stage too instead of building the maze eagerly.
    --max-restarts=<n>     How many fresh mazes to try when the end turns out unreachable [default: 5].
";

#[derive(Debug, Deserialize)]
struct DriverArgs {
    flag_rows: usize,
    flag_cols: usize,
    flag_maze: String,
    flag_search: String,
    flag_start: Option<String>,
    flag_end: Option<String>,
    flag_action_time: f64,
    flag_fps: u32,
    flag_seed: Option<u64>,
    flag_animate: bool,
    flag_max_restarts: u32,
}

// The driver's errors wrap the library's own error type, so `?` works on
// both engine calls and argument parsing.
mod errors {
    use error_chain::*;
    error_chain! {
        links {
            Engine(::stepfind::errors::Error, ::stepfind::errors::ErrorKind);
        }
        foreign_links {
            DocOptFailure(::docopt::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {
    let args: DriverArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;
    if args.flag_fps == 0 {
        bail!("--fps must be at least 1");
    }
    let frame_time = Duration::from_secs(1) / args.flag_fps;

    let start = parse_position(args.flag_start.as_deref(), Position::new(0, 0))?;
    let end = parse_position(args.flag_end.as_deref(),
                             Position::new(args.flag_rows as isize - 1,
                                           args.flag_cols as isize - 1))?;
    let config = EngineConfig::new(args.flag_rows,
                                   args.flag_cols,
                                   start,
                                   end,
                                   args.flag_action_time);
    let maze_strategy = parse_maze_strategy(&args.flag_maze)?;
    let search_strategy = parse_search_strategy(&args.flag_search)?;

    let mut engine = match args.flag_seed {
        Some(seed) => Engine::with_seed(config, maze_strategy, search_strategy, seed)?,
        None => Engine::new(config, maze_strategy, search_strategy)?,
    };

    let mut restarts = 0;
    loop {
        if !args.flag_animate && !engine.maze_complete() {
            engine.complete_maze()?;
        }

        match run_to_outcome(&mut engine, frame_time)? {
            EngineEvent::PathFound(end) => {
                println!("{}", engine.grid());
                println!("Path found to {} in {} cells after {} steps.",
                         end,
                         engine.path().len(),
                         engine.current_step());
                return Ok(());
            }
            EngineEvent::Unreachable => {
                restarts += 1;
                if restarts > args.flag_max_restarts {
                    println!("{}", engine.grid());
                    bail!("end cell unreachable after {} attempt(s)", restarts);
                }
                println!("End cell unreachable, restarting with a fresh maze ({}/{}).",
                         restarts,
                         args.flag_max_restarts);
                engine.restart()?;
            }
            EngineEvent::MazeCompleted => unreachable!("maze completion is not an outcome"),
        }
    }
}

/// Tick the engine at a fixed frame rate until the run reaches a terminal
/// phase, returning the terminal event.
fn run_to_outcome(engine: &mut Engine, frame_time: Duration) -> Result<EngineEvent> {
    loop {
        if let Some(event) = engine.tick()? {
            match event {
                EngineEvent::MazeCompleted => println!("{}", engine.grid()),
                terminal => return Ok(terminal),
            }
        }
        match engine.phase() {
            RunPhase::GeneratingMaze | RunPhase::Searching => thread::sleep(frame_time),
            RunPhase::PathFound => return Ok(EngineEvent::PathFound(engine.grid().end_position())),
            RunPhase::Unreachable => return Ok(EngineEvent::Unreachable),
        }
    }
}

fn parse_maze_strategy(name: &str) -> Result<MazeStrategy> {
    match name {
        "randomized" => Ok(MazeStrategy::Randomized),
        "recursive-backtracker" => Ok(MazeStrategy::RecursiveBacktracker),
        "reverse-recursive-backtracker" => Ok(MazeStrategy::ReverseRecursiveBacktracker),
        other => bail!("unknown maze strategy {:?}", other),
    }
}

fn parse_search_strategy(name: &str) -> Result<SearchStrategy> {
    match name {
        "flood-fill" => Ok(SearchStrategy::FloodFill),
        "astar" => Ok(SearchStrategy::AStar),
        other => bail!("unknown search strategy {:?}", other),
    }
}

/// Parse an `r,c` cell argument, falling back to a default when absent.
fn parse_position(arg: Option<&str>, default: Position) -> Result<Position> {
    let text = match arg {
        Some(text) => text,
        None => return Ok(default),
    };
    let mut parts = text.splitn(2, ',');
    let row = parts.next().and_then(|p| p.trim().parse::<isize>().ok());
    let col = parts.next().and_then(|p| p.trim().parse::<isize>().ok());
    match (row, col) {
        (Some(row), Some(col)) => Ok(Position::new(row, col)),
        _ => bail!("expected a cell as \"row,col\", got {:?}", text),
    }
}
