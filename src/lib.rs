//! **stepfind** is a stepwise maze generation and path search library:
//! mazes are carved and routes are found one bounded unit of work at a
//! time, so a driver can animate or interleave the progress of a run.

pub mod cells;
pub mod config;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod grid;
pub mod pathing;
pub mod positions;
pub mod scheduler;
pub mod units;
mod utils;
