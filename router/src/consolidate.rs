//! Segment consolidation: collapsing a cell-sequence path into minimal straight
//! segments in board coordinates (C9, §4.9).

use arcstr::ArcStr;
use geometry::Point;

use crate::grid::{GridIndex, RouterGrid};
use crate::result::Segment;

const CROSS_EPSILON: f64 = 1e-6;

fn direction(a: GridIndex, b: GridIndex) -> (i64, i64) {
    (b.col - a.col, b.row - a.row)
}

fn cross(a: (i64, i64), b: (i64, i64)) -> f64 {
    (a.0 * b.1 - a.1 * b.0) as f64
}

/// Picks out the key points of `path`: the first cell, the last cell, and every
/// cell where the direction vector changes (§4.9 step 2).
fn key_points(path: &[GridIndex]) -> Vec<GridIndex> {
    if path.len() < 2 {
        return Vec::new();
    }
    let mut keys = vec![path[0]];
    let mut last_dir = direction(path[0], path[1]);
    for window in path.windows(2).skip(1) {
        let dir = direction(window[0], window[1]);
        if cross(last_dir, dir).abs() > CROSS_EPSILON {
            keys.push(window[0]);
            last_dir = dir;
        }
    }
    keys.push(*path.last().unwrap());
    keys
}

/// Converts one net's cell-sequence path into board-coordinate segments (§4.9).
///
/// Paths with fewer than two cells are dropped entirely.
pub fn consolidate_path(
    grid: &RouterGrid,
    net: &ArcStr,
    layer: &ArcStr,
    width: f64,
    path: &[GridIndex],
) -> Vec<Segment> {
    let keys = key_points(path);
    keys.windows(2)
        .map(|pair| Segment {
            net: net.clone(),
            layer: layer.clone(),
            start: grid.coord_of(pair[0]),
            end: grid.coord_of(pair[1]),
            width,
        })
        .collect()
}
