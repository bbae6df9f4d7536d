//! Per-socket routing to the bus rail: transient-grid masking, far-edge crossing
//! target selection, path truncation, and via placement (C7, §4.7).
//!
//! The bus strip registered by [`crate::bus::plan_buses`] is never rasterized into
//! the occupancy grid this function routes over (`lib.rs` builds `base_grid` from
//! the board's module zones before bus planning runs at all); it is only added to
//! the board's zone set afterward, for downstream module-placement checks. So a
//! socket on the far side of where the bus strip will sit has an ordinary free cell
//! to route onto — no corridor-freeing step is needed.

use std::collections::HashMap;

use arcstr::ArcStr;
use geometry::Point;

use crate::board::{RoutingOptions, Side};
use crate::bus::BusPlan;
use crate::grid::{Cell, GridIndex, RouterGrid};
use crate::pathfind::{self, Budget, Path};

/// The outcome of successfully routing one socket to its bus rail.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteOutcome {
    /// The truncated cell-sequence path from the socket to the crossing point.
    pub path: Path,
    /// The cell where the via connecting to the bus rail is placed.
    pub via: GridIndex,
}

fn socket_margin_cells(resolution: f64) -> i64 {
    (1.0 / resolution).ceil() as i64
}

/// Clears a `radius`-cell square around `center` to FREE (§4.7 step 3).
fn clear_margin(grid: &mut RouterGrid, center: GridIndex, radius: i64) {
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            let idx = GridIndex::new(center.col + dc, center.row + dr);
            if grid.in_bounds(idx) {
                grid.set(idx, Cell::Free);
            }
        }
    }
}

/// Marks every cell of `path` blocked; within `[col_lo, col_hi]` additionally
/// dilates by one cell in each direction (§4.7 step 2).
fn mark_obstacles(grid: &mut RouterGrid, path: &[GridIndex], col_lo: i64, col_hi: i64) {
    for &cell in path {
        if grid.in_bounds(cell) {
            grid.set(cell, Cell::Blocked);
        }
        if cell.col < col_lo || cell.col > col_hi {
            continue;
        }
        for dr in -1..=1 {
            for dc in -1..=1 {
                let idx = GridIndex::new(cell.col + dc, cell.row + dr);
                if grid.in_bounds(idx) {
                    grid.set(idx, Cell::Blocked);
                }
            }
        }
    }
}

/// The target column for the crossing maneuver (§4.7 step 4).
fn target_column(side: Side, socket_col: i64, bus_col: i64, cols: usize) -> i64 {
    match side {
        Side::Left => {
            if socket_col > bus_col {
                0
            } else {
                cols as i64 - 1
            }
        }
        Side::Right => {
            if socket_col < bus_col {
                cols as i64 - 1
            } else {
                0
            }
        }
    }
}

/// Whether `cell_col` has crossed `bus_col` in the direction implied by the
/// socket's starting side of the bus column (§4.7 step 6).
fn has_crossed(side: Side, socket_col: i64, bus_col: i64, cell_col: i64) -> bool {
    let from_outside = match side {
        Side::Left => socket_col > bus_col,
        Side::Right => socket_col < bus_col,
    };
    match (side, from_outside) {
        (Side::Left, true) | (Side::Right, false) => cell_col <= bus_col,
        (Side::Left, false) | (Side::Right, true) => cell_col >= bus_col,
    }
}

/// Walks `path`, stopping (inclusive) at the first cell that has crossed `bus_col`.
///
/// Returns `None` if no crossing occurred.
fn truncate_at_crossing(path: &[GridIndex], side: Side, socket_col: i64, bus_col: i64) -> Option<Path> {
    let mut out = Vec::new();
    for &cell in path {
        out.push(cell);
        if has_crossed(side, socket_col, bus_col, cell.col) {
            return Some(out);
        }
    }
    None
}

/// Appends the exact bus cell if the truncated tail merely landed adjacent to it (§4.7 step 7).
fn snap_to_bus_point(mut path: Path, bus_cell: GridIndex) -> Path {
    if let Some(&last) = path.last() {
        if last != bus_cell && (last.col - bus_cell.col).abs() <= 1 && (last.row - bus_cell.row).abs() <= 1 {
            path.push(bus_cell);
        }
    }
    path
}

/// Routes one socket on `net` to its bus rail (§4.7).
///
/// `layer_nets` lists every net sharing `net`'s layer; `routed_paths` holds the
/// already-accepted path for each net that has routed so far this session.
/// Returns `None` if no rail exists for `net` or no path can be found.
pub fn route_socket_to_bus(
    base_grid: &RouterGrid,
    net: &ArcStr,
    socket: Point,
    bus: &BusPlan,
    layer_nets: &[ArcStr],
    routed_paths: &HashMap<ArcStr, Vec<Path>>,
    options: &RoutingOptions,
) -> Option<RouteOutcome> {
    let rail = bus.rail(net)?;
    let connection_point = Point::new(rail.x, rail.clamp_y(socket.y));
    let bus_cell = base_grid.index_of(connection_point);
    let socket_cell = base_grid.index_of(socket);

    let mut grid = base_grid.clone();

    let (col_lo, col_hi) = match bus.side {
        Side::Left => (0, bus_cell.col),
        Side::Right => (bus_cell.col, grid.cols as i64 - 1),
    };

    for other in layer_nets {
        if other == net && options.allow_overlap {
            continue;
        }
        if let Some(paths) = routed_paths.get(other) {
            for path in paths {
                mark_obstacles(&mut grid, path, col_lo, col_hi);
            }
        }
    }

    clear_margin(&mut grid, socket_cell, socket_margin_cells(grid.resolution()));

    let target_col = target_column(bus.side, socket_cell.col, bus_cell.col, grid.cols);
    let goal = GridIndex::new(target_col, bus_cell.row);

    let path = pathfind::find_path(
        &grid,
        socket_cell,
        goal,
        options.diagonal_policy,
        options.algorithm,
        Budget::default(),
    )?;

    let truncated = truncate_at_crossing(&path, bus.side, socket_cell.col, bus_cell.col)?;
    let snapped = snap_to_bus_point(truncated, bus_cell);
    let via = *snapped.last()?;

    Some(RouteOutcome { path: snapped, via })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Algorithm, Board, BoardConfig, DiagonalPolicy};
    use crate::bus::plan_buses;

    fn board() -> Board {
        Board::new(BoardConfig {
            width: 20.0,
            height: 10.0,
            resolution: 1.0,
            rounded_corner_radius: 0.0,
            edge_clearance: 1.0,
            module_margin: 0.0,
            bus_spacing: 1.0,
            bus_width: 0.3,
            track_width: 0.2,
            via_diameter: 0.6,
            via_hole_diameter: 0.3,
        })
    }

    fn options() -> RoutingOptions {
        RoutingOptions {
            algorithm: Algorithm::AStar,
            diagonal_policy: DiagonalPolicy::Never,
            allow_overlap: false,
            side: Side::Left,
        }
    }

    #[test]
    fn routes_socket_across_empty_board_to_its_rail() {
        let b = board();
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let socket = Point::new(5.0, 0.0);
        let routed = HashMap::new();

        let outcome = route_socket_to_bus(&grid, &nets[0], socket, &bus, &nets, &routed, &options()).unwrap();
        let rail = bus.rail("A").unwrap();
        assert_eq!(outcome.via, grid.index_of(Point::new(rail.x, 0.0)));
        assert_eq!(outcome.path.first(), Some(&grid.index_of(socket)));
    }

    #[test]
    fn missing_rail_yields_no_route() {
        let b = board();
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let routed = HashMap::new();
        let outcome = route_socket_to_bus(
            &grid,
            &ArcStr::from("Z"),
            Point::new(5.0, 0.0),
            &bus,
            &nets,
            &routed,
            &options(),
        );
        assert!(outcome.is_none());
    }

    #[test]
    fn same_net_overlap_allowed_ignores_its_own_prior_path() {
        let b = board();
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let socket = Point::new(5.0, 0.0);

        let mut routed = HashMap::new();
        routed.insert(ArcStr::from("A"), vec![vec![grid.index_of(socket)]]);

        let mut opts = options();
        opts.allow_overlap = true;
        let outcome = route_socket_to_bus(&grid, &nets[0], socket, &bus, &nets, &routed, &opts);
        assert!(outcome.is_some());
    }

    #[test]
    fn other_nets_path_is_treated_as_an_obstacle() {
        let b = board();
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A"), ArcStr::from("B")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let socket = Point::new(5.0, 0.0);

        // Block every cell directly between A's socket and its rail with B's path.
        let mut routed = HashMap::new();
        let socket_cell = grid.index_of(socket);
        let rail_cell = grid.index_of(Point::new(bus.rail("A").unwrap().x, 0.0));
        let mut wall = Vec::new();
        let mut col = socket_cell.col;
        while col >= rail_cell.col {
            wall.push(GridIndex::new(col, socket_cell.row));
            col -= 1;
        }
        routed.insert(ArcStr::from("B"), vec![wall]);

        // The wall only blocks one row; A detours around it via an adjacent row
        // to reach the far edge, still crossing the rail column and still routes.
        let outcome = route_socket_to_bus(&grid, &nets[0], socket, &bus, &nets, &routed, &options());
        assert!(outcome.is_some());
    }
}
