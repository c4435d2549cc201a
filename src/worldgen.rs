//! Grid generators: `empty`, `walls` (random density), and `maze` (Wilson's
//! uniform-spanning-tree algorithm, in its standard textbook form; see
//! DESIGN.md for why, rather than a literal index-juggling port).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::HdaError;
use crate::grid::{Cell, Position, Terrain};
use crate::utils::Matrix;

/// The three grid kinds the CLI accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    Empty,
    Walls,
    Maze,
}
impl std::str::FromStr for GridKind {
    type Err = HdaError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(GridKind::Empty),
            "walls" => Ok(GridKind::Walls),
            "maze" => Ok(GridKind::Maze),
            other => Err(HdaError::UnknownGridType(other.to_string())),
        }
    }
}

fn on_border(x: i32, y: i32, width: i32, height: i32) -> bool {
    x == 0 || y == 0 || x == width - 1 || y == height - 1
}

/// The default start/end used by every generator: bottom-right to top-left,
/// one cell in from the border.
fn default_endpoints(width: i32, height: i32) -> (Position, Position) {
    (Position::new(width - 2, height - 2), Position::new(1, 1))
}

fn validate_dims(width: i32, height: i32) -> Result<(), HdaError> {
    if width < 3 || height < 3 {
        return Err(HdaError::GridTooSmall { width, height });
    }
    Ok(())
}

/// A grid with walls on the border only.
pub fn empty(width: i32, height: i32) -> Result<Terrain, HdaError> {
    validate_dims(width, height)?;
    let mut value = Matrix::new_default(width, height, Cell::Free);
    for y in 0..height {
        for x in 0..width {
            if on_border(x, y, width, height) {
                value[(x, y)] = Cell::Wall;
            }
        }
    }
    let (start, end) = default_endpoints(width, height);
    Ok(Terrain::new(width, height, value, start, end))
}

/// A grid whose interior cells are independently `kind` with probability
/// `density`, otherwise free. Border cells are always walls.
pub fn walls(width: i32, height: i32, kind: Cell, density: f64, seed: u64) -> Result<Terrain, HdaError> {
    validate_dims(width, height)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut value = Matrix::new_default(width, height, Cell::Free);
    for y in 0..height {
        for x in 0..width {
            value[(x, y)] = if on_border(x, y, width, height) {
                Cell::Wall
            } else if rng.gen::<f64>() <= density {
                kind
            } else {
                Cell::Free
            };
        }
    }
    let (start, end) = default_endpoints(width, height);
    Ok(Terrain::new(width, height, value, start, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    North,
    South,
    East,
    West,
}
const DIRECTIONS: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];

fn step(x: i32, y: i32, dir: Direction, cells_x: i32, cells_y: i32) -> Option<(i32, i32)> {
    match dir {
        Direction::North if y > 0 => Some((x, y - 1)),
        Direction::South if y < cells_y - 1 => Some((x, y + 1)),
        Direction::West if x > 0 => Some((x - 1, y)),
        Direction::East if x < cells_x - 1 => Some((x + 1, y)),
        _ => None,
    }
}

/// A random-walk maze over a `cells_x x cells_y` cell graph, built with
/// Wilson's algorithm (loop-erased random walks), then rendered into a wall
/// grid with corridor width `corridor_width`: each logical cell becomes a
/// `(w+1) x (w+1)` block, and adjacent cells in the spanning tree get a
/// `w`-wide gap carved between them.
pub fn maze(width: i32, height: i32, corridor_width: i32, seed: u64) -> Result<Terrain, HdaError> {
    validate_dims(width, height)?;
    let w = corridor_width.max(1);
    let cells_x = ((width - 1) / (w + 1)).max(1);
    let cells_y = ((height - 1) / (w + 1)).max(1);
    let gw_width = cells_x * (w + 1) + 1;
    let gw_height = cells_y * (w + 1) + 1;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut in_tree = Matrix::new_default(cells_x, cells_y, false);
    in_tree[(0, 0)] = true;
    let mut remaining = (cells_x * cells_y) - 1;

    // `next[(x, y)]` is the direction a loop-erased walk starting at an
    // unvisited `(x, y)` currently intends to step, used to replay the walk
    // into the tree once it reaches an already-in-tree cell.
    let mut next: Matrix<Option<Direction>> = Matrix::new_default(cells_x, cells_y, None);

    while remaining > 0 {
        let (mut x, mut y) = first_unvisited(&in_tree, cells_x, cells_y);
        while !in_tree[(x, y)] {
            let dir = loop {
                let candidate = DIRECTIONS[rng.gen_range(0..4)];
                if step(x, y, candidate, cells_x, cells_y).is_some() {
                    break candidate;
                }
            };
            next[(x, y)] = Some(dir);
            let (nx, ny) = step(x, y, dir, cells_x, cells_y).unwrap();
            x = nx;
            y = ny;
        }

        let (mut x, mut y) = first_unvisited(&in_tree, cells_x, cells_y);
        while !in_tree[(x, y)] {
            in_tree[(x, y)] = true;
            remaining -= 1;
            let dir = next[(x, y)].unwrap();
            let (nx, ny) = step(x, y, dir, cells_x, cells_y).unwrap();
            x = nx;
            y = ny;
        }
    }

    let mut value = Matrix::new_default(gw_width, gw_height, Cell::Wall);
    for gy in 0..gw_height {
        for gx in 0..gw_width {
            let carved = gx % (w + 1) != 0 && gy % (w + 1) != 0;
            if carved {
                value[(gx, gy)] = Cell::Free;
            }
        }
    }
    for cy in 0..cells_y {
        for cx in 0..cells_x {
            if let Some(dir) = next[(cx, cy)] {
                carve_gap(&mut value, cx, cy, dir, w);
            }
        }
    }

    let start = Position::new(gw_width - 2, gw_height - 2);
    let end = Position::new(1, 1);
    Ok(Terrain::new(gw_width, gw_height, value, start, end))
}

fn first_unvisited(in_tree: &Matrix<bool>, cells_x: i32, cells_y: i32) -> (i32, i32) {
    for y in 0..cells_y {
        for x in 0..cells_x {
            if !in_tree[(x, y)] {
                return (x, y);
            }
        }
    }
    unreachable!("caller checks `remaining > 0` before calling")
}

/// Carves a `w`-wide opening in the wall between cell `(cx, cy)` and its
/// `dir` neighbor.
fn carve_gap(value: &mut Matrix<Cell>, cx: i32, cy: i32, dir: Direction, w: i32) {
    let block = w + 1;
    match dir {
        Direction::East => {
            let wall_x = (cx + 1) * block;
            for i in 0..w {
                value[(wall_x, cy * block + i + 1)] = Cell::Free;
            }
        }
        Direction::West => {
            let wall_x = cx * block;
            for i in 0..w {
                value[(wall_x, cy * block + i + 1)] = Cell::Free;
            }
        }
        Direction::South => {
            let wall_y = (cy + 1) * block;
            for i in 0..w {
                value[(cx * block + i + 1, wall_y)] = Cell::Free;
            }
        }
        Direction::North => {
            let wall_y = cy * block;
            for i in 0..w {
                value[(cx * block + i + 1, wall_y)] = Cell::Free;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_has_walls_only_on_the_border() {
        let t = empty(5, 5).unwrap();
        assert_eq!(Cell::Wall, t.value(Position::new(0, 0)));
        assert_eq!(Cell::Free, t.value(Position::new(2, 2)));
    }

    #[test]
    fn grid_too_small_is_rejected() {
        assert!(matches!(empty(2, 5), Err(HdaError::GridTooSmall { .. })));
    }

    #[test]
    fn walls_density_zero_yields_an_all_free_interior() {
        let t = walls(6, 6, Cell::Sand, 0.0, 42).unwrap();
        for y in 1..5 {
            for x in 1..5 {
                assert_eq!(Cell::Free, t.value(Position::new(x, y)));
            }
        }
    }

    #[test]
    fn walls_density_one_fills_the_interior_with_kind() {
        let t = walls(6, 6, Cell::Sand, 1.0, 42).unwrap();
        assert_eq!(Cell::Sand, t.value(Position::new(2, 2)));
    }

    #[test]
    fn maze_is_reproducible_from_the_same_seed() {
        let a = maze(21, 21, 1, 7).unwrap();
        let b = maze(21, 21, 1, 7).unwrap();
        assert_eq!(a.width(), b.width());
        for y in 0..a.height() {
            for x in 0..a.width() {
                assert_eq!(a.value(Position::new(x, y)), b.value(Position::new(x, y)));
            }
        }
    }

    #[test]
    fn maze_start_and_end_are_carved_free() {
        let t = maze(21, 21, 1, 7).unwrap();
        assert_eq!(Cell::Free, t.value(t.start));
        assert_eq!(Cell::Free, t.value(t.end));
    }

    #[test]
    fn grid_kind_parses_the_three_known_names() {
        assert_eq!(GridKind::Empty, "empty".parse().unwrap());
        assert_eq!(GridKind::Walls, "walls".parse().unwrap());
        assert_eq!(GridKind::Maze, "maze".parse().unwrap());
        assert!("bogus".parse::<GridKind>().is_err());
    }
}
