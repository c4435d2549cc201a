//! Command-line surface, via `structopt`. `--workers` is the only addition
//! beyond the five positional arguments, standing in for the worker count
//! an external launcher would otherwise supply.

use structopt::StructOpt;

use crate::heuristic::Weighted;
use crate::worldgen::GridKind;

/// Fixed density for `walls` grids and corridor width for `maze` grids,
/// rather than exposing them as further flags.
pub const WALLS_DENSITY: f64 = 0.2;
pub const MAZE_CORRIDOR_WIDTH: i32 = 3;

#[derive(Debug, StructOpt)]
#[structopt(name = "hda_star", about = "Hash-distributed A* pathfinding")]
pub struct Cli {
    /// Non-negative seed; `0` derives one from the wall-clock.
    pub seed: u64,
    /// Grid width, in cells (>= 3).
    pub width: i32,
    /// Grid height, in cells (>= 3).
    pub height: i32,
    /// One of: empty, walls, maze.
    pub kind: GridKind,
    /// Interpreted directly as the weighted-heuristic's alpha.
    pub algorithm: u32,

    /// Number of search workers. `1` runs the sequential algorithm.
    /// Defaults to the number of available CPUs.
    #[structopt(short, long)]
    pub workers: Option<usize>,
}

impl Cli {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn heuristic(&self) -> Weighted {
        Weighted {
            alpha: self.algorithm as f64,
        }
    }

    /// `seed = 0` means "derive from the wall clock"; `now_secs` is threaded
    /// in rather than read here so the mapping stays a pure, testable function.
    pub fn resolved_seed(&self, now_secs: u64) -> u64 {
        if self.seed == 0 {
            now_secs % 1000
        } else {
            self.seed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(seed: u64, algorithm: u32) -> Cli {
        Cli {
            seed,
            width: 10,
            height: 10,
            kind: GridKind::Empty,
            algorithm,
            workers: None,
        }
    }

    #[test]
    fn algorithm_is_used_directly_as_alpha() {
        assert_eq!(0.0, cli(1, 0).heuristic().alpha);
        assert_eq!(1.0, cli(1, 1).heuristic().alpha);
        assert_eq!(2.0, cli(1, 2).heuristic().alpha);
        assert_eq!(5.0, cli(1, 5).heuristic().alpha);
    }

    #[test]
    fn zero_seed_is_derived_from_the_wall_clock() {
        assert_eq!(42, cli(0, 1).resolved_seed(1042));
        assert_eq!(7, cli(7, 1).resolved_seed(1042));
    }
}
