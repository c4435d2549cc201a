use std::process::exit;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use structopt::StructOpt;

use hda_star::cli::{Cli, MAZE_CORRIDOR_WIDTH, WALLS_DENSITY};
use hda_star::distributed;
use hda_star::error::HdaError;
use hda_star::grid::Cell;
use hda_star::sequential;
use hda_star::worldgen::{self, GridKind};

fn main() {
    env_logger::init();
    let cli = Cli::from_args();

    match run(&cli) {
        Ok(()) => exit(0),
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let now_secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let seed = cli.resolved_seed(now_secs);
    let terrain = match cli.kind {
        GridKind::Empty => worldgen::empty(cli.width, cli.height)?,
        GridKind::Walls => worldgen::walls(cli.width, cli.height, Cell::Sand, WALLS_DENSITY, seed)?,
        GridKind::Maze => worldgen::maze(cli.width, cli.height, MAZE_CORRIDOR_WIDTH, seed)?,
    };

    if terrain.value(terrain.end) == Cell::Wall {
        return Err(HdaError::GoalOnWall.into());
    }

    let heuristic = cli.heuristic();
    let workers = cli.worker_count();
    log::info!("starting search: {}x{} grid, {} worker(s)", terrain.width(), terrain.height(), workers);

    let start = Instant::now();
    let solution = if workers == 1 {
        sequential::search(&terrain, &heuristic)
    } else {
        distributed::search(&terrain, &heuristic, workers)
    };
    let elapsed = start.elapsed().as_secs_f64();

    match solution {
        Some(sol) => {
            println!(
                "Nb_cores: {}\nDimensions: {}\nBingo! Path found.. Cost: {}\tPerf: {}s",
                workers,
                terrain.width(),
                sol.cost,
                elapsed
            );
            Ok(())
        }
        None => {
            eprintln!("path not found");
            exit(1);
        }
    }
}
