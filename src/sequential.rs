//! Classical single-process A*: the single-worker case, and the oracle the
//! distributed search is checked against. Addresses closed nodes with
//! `Handle { owner: 0, .. }`, the same addressing scheme the distributed
//! search uses.

use crate::grid::{Mark, MarkMap, Position, Terrain};
use crate::heuristic::Heuristic;
use crate::node::{FrontierEntry, Handle, NodeRecord, WindowBuffer};
use crate::frontier::Frontier;

const RANK: usize = 0;

/// A found path: its total cost and the cells from `start` to `end`
/// inclusive, in travel order.
#[derive(Debug, Clone)]
pub struct Solution {
    pub cost: f64,
    pub path: Vec<Position>,
}

/// Runs A* to completion and returns the optimal path, or `None` if `end` is
/// unreachable from `start`.
pub fn search(terrain: &Terrain, heuristic: &dyn Heuristic) -> Option<Solution> {
    let mut marks = MarkMap::new(terrain.width(), terrain.height());
    let mut window = WindowBuffer::new();
    let mut frontier = Frontier::new();

    let start = terrain.start;
    frontier.push(FrontierEntry {
        pos: start,
        cost: 0.0,
        score: heuristic.estimate(start, terrain.end),
        parent: None,
    });
    marks.set(start, Mark::Frontier);

    while let Some(current) = frontier.pop() {
        if marks.get(current.pos) == Mark::Closed {
            // A stale duplicate of an already-closed node;
            // explicitly keeps duplicate frontier entries rather than
            // tracking best-known-cost per cell, so these are expected.
            continue;
        }
        marks.set(current.pos, Mark::Closed);
        let handle = window.push(RANK, NodeRecord::from(current));

        if current.pos == terrain.end {
            log::info!("sequential search: goal reached, cost {}", current.cost);
            return Some(reconstruct(&window, &mut marks, handle));
        }

        for next in terrain.neighbors8(current.pos) {
            if terrain.value(next) == crate::grid::Cell::Wall {
                continue;
            }
            if marks.get(next) == Mark::Closed {
                continue;
            }
            let (cost, bias) = terrain.step_cost(current.pos, next, current.cost);
            let score = cost + bias + heuristic.estimate(next, terrain.end);
            frontier.push(FrontierEntry {
                pos: next,
                cost: cost + bias,
                score,
                parent: Some(handle),
            });
            if marks.get(next) == Mark::None {
                marks.set(next, Mark::Frontier);
            }
        }
    }
    None
}

/// Walks `parent` links from `end_handle` back to the seed node, marking
/// each position `Path` along the way, then reverses. All handles are
/// `owner == 0` here, so no cross-worker lookup is needed (contrast
/// `distributed::reconstruct_path`).
fn reconstruct(window: &WindowBuffer, marks: &mut MarkMap, end_handle: Handle) -> Solution {
    let mut path = Vec::new();
    let mut handle = Some(end_handle);
    let cost = window.get(end_handle.index).cost;
    while let Some(h) = handle {
        let record = window.get(h.index);
        marks.set(record.pos, Mark::Path);
        path.push(record.pos);
        handle = record.parent;
    }
    path.reverse();
    Solution { cost, path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::heuristic::Euclidean;
    use crate::utils::Matrix;

    fn terrain_from_rows(rows: &[&str], start: Position, end: Position) -> Terrain {
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        let mut value = Matrix::new_default(width, height, Cell::Free);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Wall,
                    '~' => Cell::Water,
                    '.' => Cell::Free,
                    _ => Cell::Free,
                };
                value[(x as i32, y as i32)] = cell;
            }
        }
        Terrain::new(width, height, value, start, end)
    }

    #[test]
    fn start_equals_end_is_a_zero_cost_single_cell_path() {
        let t = terrain_from_rows(&["###", "#.#", "###"], Position::new(1, 1), Position::new(1, 1));
        let sol = search(&t, &Euclidean).unwrap();
        assert_eq!(0.0, sol.cost);
        assert_eq!(vec![Position::new(1, 1)], sol.path);
    }

    #[test]
    fn diagonal_move_costs_less_than_two_orthogonal_moves() {
        let t = terrain_from_rows(
            &["#####", "#...#", "#...#", "#...#", "#####"],
            Position::new(1, 1),
            Position::new(3, 3),
        );
        let sol = search(&t, &Euclidean).unwrap();
        // Two diagonal hops: 1+bias, 1+bias.
        assert!((sol.cost - (2.0 + 2.0 * crate::grid::DIAG_BIAS)).abs() < 1e-9);
        assert_eq!(3, sol.path.len());
    }

    #[test]
    fn routes_around_a_wall_gap() {
        let t = terrain_from_rows(
            &[
                "#########",
                "#.......#",
                "#.#####.#",
                "#.......#",
                "#########",
            ],
            Position::new(1, 1),
            Position::new(7, 1),
        );
        let sol = search(&t, &Euclidean).unwrap();
        assert!(sol.path.iter().any(|p| p.y == 3));
    }

    #[test]
    fn wall_destination_is_unreachable() {
        let t = terrain_from_rows(&["###", "#.#", "###"], Position::new(1, 1), Position::new(0, 0));
        assert!(search(&t, &Euclidean).is_none());
    }

    #[test]
    fn disconnected_region_is_unreachable() {
        let t = terrain_from_rows(
            &["#######", "#.#.#.#", "#.#.#.#", "#.#.#.#", "#######"],
            Position::new(1, 1),
            Position::new(5, 1),
        );
        assert!(search(&t, &Euclidean).is_none());
    }
}
