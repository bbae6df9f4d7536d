//! A uniform pathfinder adapter over a dynamically masked occupancy grid (C6, §4.6).

use pathfinding::directed::{astar::astar, bfs::bfs};

use crate::board::{Algorithm, DiagonalPolicy};
use crate::grid::{GridIndex, RouterGrid};

/// A sequence of grid cells, each consecutive pair differing by at most one
/// in both `col` and `row`.
pub type Path = Vec<GridIndex>;

/// An upper bound on the number of cells the pathfinder may expand before giving up.
///
/// Exceeding this is treated identically to "no path" (§5): the scheduler sees a
/// failure and triggers backtracking. `None` means unbounded.
#[derive(Copy, Clone, Debug, Default)]
pub struct Budget {
    /// The maximum number of node expansions, or `None` for unbounded.
    pub max_expansions: Option<usize>,
}

fn neighbors(idx: GridIndex) -> [(i64, i64); 8] {
    [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ]
    .map(|(dc, dr)| (idx.col + dc, idx.row + dr))
}

fn is_diagonal(dc: i64, dr: i64) -> bool {
    dc != 0 && dr != 0
}

/// Returns `true` if a step from `from` to `to` is allowed under `policy`,
/// given that `to`'s own traversability has already been checked.
fn diagonal_allowed(grid: &RouterGrid, from: GridIndex, to: GridIndex, policy: DiagonalPolicy) -> bool {
    let dc = to.col - from.col;
    let dr = to.row - from.row;
    if !is_diagonal(dc, dr) {
        return true;
    }
    match policy {
        DiagonalPolicy::Never => false,
        DiagonalPolicy::Always => true,
        DiagonalPolicy::OnlyWhenNoObstacle => {
            let a = GridIndex::new(from.col + dc, from.row);
            let b = GridIndex::new(from.col, from.row + dr);
            grid.in_bounds(a)
                && grid.in_bounds(b)
                && grid.get(a) == crate::grid::Cell::Free
                && grid.get(b) == crate::grid::Cell::Free
        }
    }
}

/// A cell is traversable iff it is FREE, or it is the destination (§4.6): the goal
/// is always considered enterable so a path can terminate on a socket or bus column
/// even if adjacent masking would otherwise block it.
fn traversable(grid: &RouterGrid, idx: GridIndex, goal: GridIndex) -> bool {
    idx == goal || grid.get(idx) == crate::grid::Cell::Free
}

fn manhattan(a: GridIndex, b: GridIndex) -> u64 {
    ((a.col - b.col).abs() + (a.row - b.row).abs()) as u64
}

fn step_successors(
    grid: &RouterGrid,
    idx: GridIndex,
    goal: GridIndex,
    policy: DiagonalPolicy,
) -> Vec<(GridIndex, u64)> {
    neighbors(idx)
        .into_iter()
        .filter(|&(c, r)| grid.in_bounds(GridIndex::new(c, r)))
        .map(|(c, r)| GridIndex::new(c, r))
        .filter(|&next| traversable(grid, next, goal))
        .filter(|&next| diagonal_allowed(grid, idx, next, policy))
        .map(|next| (next, 1))
        .collect()
}

/// Finds a path from `start` to `goal` over `grid` (§4.6).
///
/// Returns the first minimum-cost path found, or `None` if no path exists
/// (including when `budget.max_expansions` is exceeded).
pub fn find_path(
    grid: &RouterGrid,
    start: GridIndex,
    goal: GridIndex,
    policy: DiagonalPolicy,
    algorithm: Algorithm,
    budget: Budget,
) -> Option<Path> {
    match algorithm {
        Algorithm::AStar => {
            let mut expansions = 0usize;
            astar(
                &start,
                |&idx| {
                    expansions += 1;
                    step_successors(grid, idx, goal, policy)
                },
                |&idx| manhattan(idx, goal),
                |&idx| idx == goal,
            )
            .filter(|_| match budget.max_expansions {
                Some(max) => expansions <= max,
                None => true,
            })
            .map(|(path, _cost)| path)
        }
        Algorithm::BreadthFirst => {
            let mut expansions = 0usize;
            bfs(
                &start,
                |&idx| {
                    expansions += 1;
                    step_successors(grid, idx, goal, policy)
                        .into_iter()
                        .map(|(n, _)| n)
                },
                |&idx| idx == goal,
            )
            .filter(|_| match budget.max_expansions {
                Some(max) => expansions <= max,
                None => true,
            })
        }
    }
}
