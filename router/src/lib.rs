//! A PCB trace-routing core.
//!
//! Given a board's geometry, keep-out zones, and aperture-encoded socket positions,
//! this crate plans per-net bus rails along one edge of the board and routes each
//! socket to its rail through a shared occupancy grid, with dynamic obstacle masking
//! and adaptive backtracking when a socket's first attempt fails. The output is a
//! board-coordinate [`result::RoutingResult`]: consolidated trace segments and vias.

#![warn(missing_docs)]

pub mod board;
pub mod bus;
pub mod consolidate;
pub mod error;
pub mod grid;
pub mod issues;
pub mod pathfind;
pub mod result;
pub mod route;
pub mod schedule;
pub mod socket;
pub mod zone;

use arcstr::ArcStr;

use board::{Board, RoutingOptions};
use bus::plan_buses;
use error::Result;
use grid::RouterGrid;
use issues::{IssueSet, RouterIssue};
use result::RoutingResult;

/// Routes every bus layer of `board`.
///
/// `layers` lists, for each bus layer to route, its layer name and the ordered set
/// of nets that share its bus (§4.5); one scheduler pass runs per entry, composing
/// the per-layer results into a single board-wide one (§9, "layer multiplicity").
///
/// `base_grid` is built from `board`'s own (module) zones before any bus is
/// planned, per §2's data flow `(zones, sockets, config) → C4 → C5 → ...`: the
/// occupancy grid that every route call shares never has a bus strip rasterized
/// into it. Each layer's bus is planned afterward and its strip registered onto a
/// cloned board's zone set solely so later socket/zone containment checks (§4.5,
/// "so later module-in-zone checks include it") see it — not to block the grid.
///
/// Returns [`error::Error`] only for fatal validation failures (misaligned zones,
/// an unbuildable grid); per-socket problems are instead accumulated into the
/// returned [`IssueSet`] alongside the partial [`RoutingResult`].
pub fn route_board(
    board: &Board,
    layers: &[(ArcStr, Vec<ArcStr>)],
    options: &RoutingOptions,
) -> Result<(RoutingResult, IssueSet<RouterIssue>)> {
    let base_grid = RouterGrid::build(board)?;

    let buses: Vec<_> = layers
        .iter()
        .map(|(_, nets)| plan_buses(board, nets, options.side))
        .collect();

    let mut zoned_board = board.clone();
    for bus in &buses {
        zoned_board.add_zone(bus.zone);
    }

    let mut issues = IssueSet::new();
    let mut combined = RoutingResult::new();

    for ((layer_name, nets), bus) in layers.iter().zip(&buses) {
        tracing::info!(layer = %layer_name, nets = nets.len(), "routing bus layer");
        let mut result = schedule::route_layer(&zoned_board, &base_grid, layer_name, nets, bus, options, &mut issues);
        result
            .segments
            .extend(bus.rail_segments(layer_name, board.config.bus_width));
        combined.merge(result);
    }

    Ok((combined, issues))
}
