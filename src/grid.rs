//! The grid model: cell values, per-worker marks, and the fixed 8-neighborhood
//! the search expands over.

use crate::utils::Matrix;

/// An integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}
impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// True iff `self` and `other` differ on both axes (a diagonal move).
    fn is_diagonal_from(self, other: Position) -> bool {
        self.x != other.x && self.y != other.y
    }
}

/// A tiny positive constant added to diagonal moves so the frontier breaks
/// ties in favor of straight moves. Used identically by both the sequential
/// and the distributed search (see DESIGN.md's Open Question #1 on why a
/// single constant is used here).
pub const DIAG_BIAS: f64 = 0.01;

/// One of the seven terrain types a cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Free,
    Wall,
    Sand,
    Water,
    Mud,
    Grass,
    Tunnel,
}
impl Cell {
    /// Traversal weight; meaningless (never read) for `Wall`.
    pub fn weight(self) -> f64 {
        match self {
            Cell::Free => 1.0,
            Cell::Wall => f64::NAN,
            Cell::Sand => 3.0,
            Cell::Water => 9.0,
            Cell::Mud => 2.3,
            Cell::Grass => 1.5,
            Cell::Tunnel => 0.1,
        }
    }
}

/// Per-cell search state. Never shipped over the wire; it is strictly
/// worker-local (see `MarkMap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    None,
    Frontier,
    Closed,
    Path,
}

/// The immutable part of the grid: dimensions, cell weights, start and end.
/// Shared read-only across worker threads behind an `Arc`, since sharing by
/// reference changes no observable behavior and avoids rebuilding an
/// identical grid per worker.
#[derive(Debug, Clone)]
pub struct Terrain {
    value: Matrix<Cell>,
    pub start: Position,
    pub end: Position,
}
impl Terrain {
    pub fn new(width: i32, height: i32, value: Matrix<Cell>, start: Position, end: Position) -> Self {
        assert!(width >= 3 && height >= 3, "grid must be at least 3x3");
        Terrain { value, start, end }
    }

    pub fn width(&self) -> i32 {
        self.value.width
    }

    pub fn height(&self) -> i32 {
        self.value.height
    }

    pub fn value(&self, p: Position) -> Cell {
        self.value[(p.x, p.y)]
    }

    /// The 8-connected neighbors of `p`. The border ring is always `Wall`
    /// (see `worldgen.rs`), so every expansion stays in bounds without a
    /// bounds check here.
    pub fn neighbors8(&self, p: Position) -> impl Iterator<Item = Position> + '_ {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    None
                } else {
                    Some(Position::new(p.x + dx, p.y + dy))
                }
            })
        })
    }

    /// Cost and diagonal-bias contribution of moving from `parent` onto `p`.
    pub fn step_cost(&self, parent: Position, p: Position, base_cost: f64) -> (f64, f64) {
        let cost = base_cost + self.value(p).weight();
        let bias = if p.is_diagonal_from(parent) { DIAG_BIAS } else { 0.0 };
        (cost, bias)
    }
}

/// The per-worker mutable `mark[x][y]` array. Transition monotonicity
/// (`None -> Frontier -> Closed -> Path`) is
/// checked in debug builds only: it is a correctness invariant of the
/// algorithm, not something that can be violated by untrusted input, so
/// paying for it in release builds would be pure overhead.
#[derive(Debug, Clone)]
pub struct MarkMap {
    marks: Matrix<Mark>,
}
impl MarkMap {
    pub fn new(width: i32, height: i32) -> Self {
        MarkMap {
            marks: Matrix::new_default(width, height, Mark::None),
        }
    }

    pub fn get(&self, p: Position) -> Mark {
        self.marks[(p.x, p.y)]
    }

    pub fn set(&mut self, p: Position, mark: Mark) {
        debug_assert!(
            Self::is_monotone(self.marks[(p.x, p.y)], mark),
            "illegal mark transition {:?} -> {:?} at {:?}",
            self.marks[(p.x, p.y)],
            mark,
            p
        );
        self.marks[(p.x, p.y)] = mark;
    }

    fn is_monotone(from: Mark, to: Mark) -> bool {
        use Mark::*;
        matches!(
            (from, to),
            (None, None)
                | (None, Frontier)
                | (Frontier, Frontier)
                | (Frontier, Closed)
                | (Closed, Closed)
                | (Closed, Path)
                | (Path, Path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_weights_are_as_documented() {
        assert_eq!(1.0, Cell::Free.weight());
        assert_eq!(3.0, Cell::Sand.weight());
        assert_eq!(9.0, Cell::Water.weight());
        assert_eq!(2.3, Cell::Mud.weight());
        assert_eq!(1.5, Cell::Grass.weight());
        assert_eq!(0.1, Cell::Tunnel.weight());
    }

    #[test]
    fn neighbors8_excludes_center() {
        let t = Terrain::new(
            3,
            3,
            Matrix::new_default(3, 3, Cell::Free),
            Position::new(1, 1),
            Position::new(1, 1),
        );
        let ns: Vec<_> = t.neighbors8(Position::new(1, 1)).collect();
        assert_eq!(8, ns.len());
        assert!(!ns.contains(&Position::new(1, 1)));
    }

    #[test]
    #[should_panic]
    fn mark_regression_is_rejected_in_debug() {
        let mut marks = MarkMap::new(3, 3);
        let p = Position::new(1, 1);
        marks.set(p, Mark::Closed);
        marks.set(p, Mark::Frontier); // regressing Closed -> Frontier
    }

    #[test]
    fn diagonal_step_adds_bias() {
        let t = Terrain::new(
            3,
            3,
            Matrix::new_default(3, 3, Cell::Free),
            Position::new(1, 1),
            Position::new(1, 1),
        );
        let (cost, bias) = t.step_cost(Position::new(1, 1), Position::new(2, 2), 0.0);
        assert_eq!(1.0, cost);
        assert_eq!(DIAG_BIAS, bias);
        let (_, bias_straight) = t.step_cost(Position::new(1, 1), Position::new(2, 1), 0.0);
        assert_eq!(0.0, bias_straight);
    }
}
