//! Adaptive scheduling with backtracking: the routing control loop (C8, §4.8).
//!
//! Owns no global mutable state; each call works over a caller-supplied `base_grid`
//! and returns a fresh [`RoutingResult`], per the "no globals" design note.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use arcstr::ArcStr;
use geometry::Point;
use itertools::Itertools;
use rustc_hash::FxHasher;

use crate::board::{Board, RoutingOptions, Side, Zone};
use crate::bus::BusPlan;
use crate::consolidate::consolidate_path;
use crate::grid::RouterGrid;
use crate::issues::{IssueSet, RouterIssue};
use crate::pathfind::Path;
use crate::result::RoutingResult;
use crate::route::route_socket_to_bus;

/// A `HashMap` keyed on the scheduler's own small, already-well-distributed keys
/// (zone indices, quantized x-coordinates); a non-cryptographic hasher is a
/// better fit than the default one for keys like these.
type FxHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

#[derive(Clone, Debug)]
struct QueuedSocket {
    net: ArcStr,
    position: Point,
    zone_index: usize,
}

fn assign_zone(position: Point, zones: &[Zone]) -> Option<usize> {
    zones.iter().position(|z| z.contains(position))
}

/// Sorts a zone's sockets by the initial ordering (§4.8 step 3):
/// x ascending for a left-side bus, x descending for a right-side bus;
/// secondary key y descending.
fn sort_initial(group: &mut [QueuedSocket], side: Side) {
    group.sort_by(|a, b| {
        let primary = match side {
            Side::Left => a.position.x.partial_cmp(&b.position.x).unwrap(),
            Side::Right => b.position.x.partial_cmp(&a.position.x).unwrap(),
        };
        primary.then_with(|| b.position.y.partial_cmp(&a.position.y).unwrap())
    });
}

/// Re-sorts a same-(zone, x) tail by the current backtracking direction: `+1` sorts
/// y descending, any other value sorts y ascending (§4.8 routing loop).
fn resort_tail(tail: &mut [QueuedSocket], direction: i8) {
    if direction >= 0 {
        tail.sort_by(|a, b| b.position.y.partial_cmp(&a.position.y).unwrap());
    } else {
        tail.sort_by(|a, b| a.position.y.partial_cmp(&b.position.y).unwrap());
    }
}

/// Assigns every (net, socket) pair to the first containing zone and flattens into
/// a queue ordered by zone index then the per-zone sort (§4.8 socket preparation).
fn build_queue(
    board: &Board,
    layer_nets: &[ArcStr],
    side: Side,
    issues: &mut IssueSet<RouterIssue>,
) -> Vec<QueuedSocket> {
    let mut assigned: Vec<(usize, QueuedSocket)> = Vec::new();
    for net in layer_nets {
        let Some(sockets) = board.sockets.get(net) else {
            continue;
        };
        for socket in sockets {
            match assign_zone(socket.position, &board.zones) {
                Some(zone_index) => assigned.push((
                    zone_index,
                    QueuedSocket {
                        net: net.clone(),
                        position: socket.position,
                        zone_index,
                    },
                )),
                None => issues.add(RouterIssue::SocketOutsideZone {
                    net: net.clone(),
                    position: socket.position,
                }),
            }
        }
    }

    let mut by_zone: HashMap<usize, Vec<QueuedSocket>> = assigned.into_iter().into_group_map();

    for group in by_zone.values_mut() {
        sort_initial(group, side);
    }

    let mut zone_indices: Vec<usize> = by_zone.keys().copied().collect();
    zone_indices.sort_unstable();

    zone_indices
        .into_iter()
        .flat_map(|idx| by_zone.remove(&idx).unwrap_or_default())
        .collect()
}

fn quantize(x: f64, resolution: f64) -> i64 {
    (x / resolution).round() as i64
}

/// Builds the obstacle set for `net`'s routing call: every other net's accepted
/// paths collected so far (§4.7 step 2's "previously routed path of every other net").
fn other_nets_paths(
    queue: &[QueuedSocket],
    paths: &[Option<Path>],
    layer_nets: &[ArcStr],
) -> HashMap<ArcStr, Vec<Path>> {
    let mut map: HashMap<ArcStr, Vec<Path>> =
        layer_nets.iter().map(|n| (n.clone(), Vec::new())).collect();
    for (socket, path) in queue.iter().zip(paths.iter()) {
        if let Some(path) = path {
            map.entry(socket.net.clone()).or_default().push(path.clone());
        }
    }
    map
}

/// Drives the adaptive scheduling loop for one bus layer (§4.8).
///
/// Routes every socket on `layer_nets` to `bus`, backtracking within a zone when a
/// socket cannot be routed and a same-`x` sibling has already succeeded. Returns the
/// accumulated [`RoutingResult`]; configuration problems and exhausted failures are
/// recorded into `issues` rather than aborting the run.
pub fn route_layer(
    board: &Board,
    base_grid: &RouterGrid,
    layer_name: &ArcStr,
    layer_nets: &[ArcStr],
    bus: &BusPlan,
    options: &RoutingOptions,
    issues: &mut IssueSet<RouterIssue>,
) -> RoutingResult {
    let mut result = RoutingResult::new();
    let mut queue = build_queue(board, layer_nets, bus.side, issues);
    let mut paths: Vec<Option<Path>> = vec![None; queue.len()];
    let mut direction: FxHashMap<(usize, i64), i8> = FxHashMap::default();
    let resolution = board.config.resolution;

    let max_attempts = 2 * queue.len().max(1);
    let mut attempts = 0usize;

    // Paths are only committed to `result` once the loop settles, below: a path
    // accepted here can still be undone by a later backtrack, so counters and
    // segments are derived from the final `paths` state rather than tracked
    // incrementally as sockets are (tentatively) routed.
    let mut i = 0usize;
    while i < queue.len() {
        attempts += 1;
        if attempts > max_attempts {
            tracing::error!("scheduler exceeded {max_attempts} routing attempts; aborting remaining sockets");
            break;
        }

        let net = queue[i].net.clone();
        let position = queue[i].position;
        let zone_index = queue[i].zone_index;

        if bus.rail(&net).is_none() {
            issues.add(RouterIssue::MissingBus { net: net.clone() });
            i += 1;
            continue;
        }

        let routed_paths = other_nets_paths(&queue, &paths, layer_nets);
        let outcome = route_socket_to_bus(base_grid, &net, position, bus, layer_nets, &routed_paths, options);

        match outcome {
            Some(outcome) => {
                paths[i] = Some(outcome.path);
                direction
                    .entry((zone_index, quantize(position.x, resolution)))
                    .or_insert(1);
                i += 1;
            }
            None => {
                let x_key = quantize(position.x, resolution);
                let last_routed = (0..i)
                    .filter(|&k| {
                        queue[k].zone_index == zone_index
                            && quantize(queue[k].position.x, resolution) == x_key
                            && paths[k].is_some()
                    })
                    .max();

                match last_routed {
                    Some(j) => {
                        result.backtrack_count += 1;
                        paths[j] = None;

                        let entry = direction.entry((zone_index, x_key)).or_insert(1);
                        *entry = -*entry;
                        let new_direction = *entry;

                        let tail_slots: Vec<usize> = (j..queue.len())
                            .filter(|&k| {
                                queue[k].zone_index == zone_index
                                    && quantize(queue[k].position.x, resolution) == x_key
                            })
                            .collect();
                        let mut tail: Vec<QueuedSocket> =
                            tail_slots.iter().map(|&k| queue[k].clone()).collect();
                        resort_tail(&mut tail, new_direction);
                        for (&slot, item) in tail_slots.iter().zip(tail) {
                            queue[slot] = item;
                            paths[slot] = None;
                        }

                        i = j;
                    }
                    // No earlier same-(zone, x) success to undo: this socket stays
                    // unrouted and the loop moves on to the next one. Recorded as a
                    // failure below, alongside any socket still unrouted because the
                    // attempt cap cut the loop short.
                    None => i += 1,
                }
            }
        }
    }

    for (socket, path) in queue.iter().zip(paths.iter()) {
        match path {
            Some(path) => {
                let via_cell = *path.last().expect("consolidate_path guards empty paths");
                result.add_via(&socket.net, base_grid.coord_of(via_cell));
                let segments =
                    consolidate_path(base_grid, &socket.net, layer_name, board.config.track_width, path);
                result.segments.extend(segments);
                result.connected += 1;
            }
            None if bus.rail(&socket.net).is_some() => {
                issues.add(RouterIssue::UnroutableSocket {
                    net: socket.net.clone(),
                    position: socket.position,
                });
                result.failed += 1;
            }
            None => {} // Already reported as MissingBus when first encountered.
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Algorithm, BoardConfig, DiagonalPolicy, Layer};
    use crate::bus::plan_buses;

    fn board() -> Board {
        let mut b = Board::new(BoardConfig {
            width: 20.0,
            height: 10.0,
            resolution: 1.0,
            rounded_corner_radius: 0.0,
            edge_clearance: 0.0,
            module_margin: 0.0,
            bus_spacing: 1.0,
            bus_width: 0.3,
            track_width: 0.2,
            via_diameter: 0.6,
            via_hole_diameter: 0.3,
        });
        let mut layer = Layer::new("top");
        layer.add_net("A");
        b.add_layer(layer);
        // Sized to exactly match the one-cell escape margin around each
        // socket added below, so both sockets clear their footprint in a
        // single step (see the zone-sizing note in `lib.rs` and DESIGN.md).
        b.add_zone(Zone::from_corners(
            Point::new(4.0, -3.0),
            Point::new(4.0, 3.0),
            Point::new(6.0, 3.0),
            Point::new(6.0, -3.0),
        ));
        b
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
    fn two_sockets_in_one_zone_both_route() {
        let mut b = board();
        b.add_socket("A", Point::new(5.0, 2.0)).unwrap();
        b.add_socket("A", Point::new(5.0, -2.0)).unwrap();
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let mut issues = IssueSet::new();

        let result = route_layer(&b, &grid, &ArcStr::from("top"), &nets, &bus, &options(), &mut issues);
        assert_eq!(result.connected, 2);
        assert_eq!(result.vias.len(), 2);
        assert!(issues.is_empty());
    }

    #[test]
    fn socket_outside_every_zone_is_dropped_with_a_warning() {
        let mut b = board();
        b.add_socket("A", Point::new(100.0, 100.0)).unwrap();
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let mut issues = IssueSet::new();

        let result = route_layer(&b, &grid, &ArcStr::from("top"), &nets, &bus, &options(), &mut issues);
        assert_eq!(result.connected, 0);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn net_without_a_bus_rail_is_reported_as_missing_bus() {
        let mut b = board();
        b.add_socket("Z", Point::new(5.0, 0.0)).unwrap();
        let mut layer = Layer::new("top");
        layer.add_net("Z");
        b.add_layer(layer);
        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")]; // bus only planned for "A", not "Z"
        let bus = plan_buses(&b, &nets, Side::Left);
        let mut issues = IssueSet::new();

        let layer_nets = [ArcStr::from("Z")];
        let result = route_layer(&b, &grid, &ArcStr::from("top"), &layer_nets, &bus, &options(), &mut issues);
        assert_eq!(result.connected, 0);
        assert!(issues.iter().any(|i| matches!(i, RouterIssue::MissingBus { .. })));
    }

    fn socket(net: &str, x: f64, y: f64, zone_index: usize) -> QueuedSocket {
        QueuedSocket {
            net: ArcStr::from(net),
            position: Point::new(x, y),
            zone_index,
        }
    }

    #[test]
    fn sort_initial_orders_left_side_by_ascending_x_then_descending_y() {
        let mut group = vec![
            socket("A", 5.0, -2.0, 0),
            socket("A", 2.0, 0.0, 0),
            socket("A", 5.0, 2.0, 0),
        ];
        sort_initial(&mut group, Side::Left);
        let xs: Vec<f64> = group.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![2.0, 5.0, 5.0]);
        // Ties on x=5.0 break by descending y: 2.0 before -2.0.
        assert_eq!(group[1].position.y, 2.0);
        assert_eq!(group[2].position.y, -2.0);
    }

    #[test]
    fn sort_initial_on_right_side_orders_by_descending_x() {
        let mut group = vec![socket("A", 2.0, 0.0, 0), socket("A", 5.0, 0.0, 0)];
        sort_initial(&mut group, Side::Right);
        let xs: Vec<f64> = group.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![5.0, 2.0]);
    }

    #[test]
    fn resort_tail_flips_between_descending_and_ascending_y() {
        let mut tail = vec![socket("A", 5.0, -2.0, 0), socket("A", 5.0, 2.0, 0)];
        resort_tail(&mut tail, 1);
        assert_eq!(tail[0].position.y, 2.0);
        assert_eq!(tail[1].position.y, -2.0);

        resort_tail(&mut tail, -1);
        assert_eq!(tail[0].position.y, -2.0);
        assert_eq!(tail[1].position.y, 2.0);
    }

    /// Two same-net sockets whose only route to the bus crosses a single shared
    /// gap cell in an intervening wall: whichever routes first occupies the gap
    /// and the other fails, triggering a backtrack. Since both sockets need the
    /// very same gap cell regardless of processing order, the contention can
    /// never resolve — this exercises the backtrack/direction-flip machinery and
    /// the `2 * sockets` attempt-cap termination bound (§4.8), rather than a case
    /// that ends with both routed.
    #[test]
    fn mutual_gap_contention_backtracks_until_the_attempt_cap_then_gives_up() {
        let mut b = Board::new(BoardConfig {
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
        });
        let mut layer = Layer::new("top");
        layer.add_net("A");
        b.add_layer(layer);

        // The sockets' own module footprint (escaped locally via socket margins).
        b.add_zone(Zone::from_corners(
            Point::new(4.0, -3.0),
            Point::new(4.0, 3.0),
            Point::new(6.0, 3.0),
            Point::new(6.0, -3.0),
        ));
        // A wall at x in [0, 1] spanning the whole board height except row y=0,
        // the single gap both sockets must cross to reach the bus side.
        b.add_zone(Zone::from_corners(
            Point::new(0.0, 1.0),
            Point::new(0.0, 5.0),
            Point::new(1.0, 5.0),
            Point::new(1.0, 1.0),
        ));
        b.add_zone(Zone::from_corners(
            Point::new(0.0, -4.0),
            Point::new(0.0, -1.0),
            Point::new(1.0, -1.0),
            Point::new(1.0, -4.0),
        ));

        b.add_socket("A", Point::new(5.0, 2.0)).unwrap();
        b.add_socket("A", Point::new(5.0, -2.0)).unwrap();

        let grid = RouterGrid::build(&b).unwrap();
        let nets = [ArcStr::from("A")];
        let bus = plan_buses(&b, &nets, Side::Left);
        let mut issues = IssueSet::new();

        let result = route_layer(&b, &grid, &ArcStr::from("top"), &nets, &bus, &options(), &mut issues);

        assert!(result.backtrack_count >= 1);
        assert_eq!(result.connected + result.failed, 2);
        assert!(result.connected < 2, "a single shared gap cannot route both sockets");
    }
}
