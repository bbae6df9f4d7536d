//! Bus planning: per-net vertical rail placement along one side of the board (C5, §4.5).

use arcstr::ArcStr;
use geometry::Point;
use indexmap::IndexMap;

use crate::board::{Board, Side, Zone};
use crate::result::Segment;

/// One net's vertical bus rail.
#[derive(Clone, Debug, PartialEq)]
pub struct Rail {
    /// The net this rail serves.
    pub net: ArcStr,
    /// The rail's x-coordinate.
    pub x: f64,
    /// The lower end of the rail's vertical extent.
    pub y_min: f64,
    /// The upper end of the rail's vertical extent.
    pub y_max: f64,
}

impl Rail {
    /// Clamps `y` into this rail's vertical extent.
    pub fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.y_min, self.y_max)
    }
}

/// The result of bus planning: one rail per net, plus the strip zone that covers them.
#[derive(Clone, Debug, PartialEq)]
pub struct BusPlan {
    /// Rails, keyed by net name, in the order rails were placed (outermost first).
    pub rails: IndexMap<ArcStr, Rail>,
    /// The keep-out strip spanning from the board edge to the innermost rail.
    pub zone: Zone,
    /// Which side of the board the rails are on.
    pub side: Side,
}

impl BusPlan {
    /// The rail assigned to `net`, if any.
    pub fn rail(&self, net: &str) -> Option<&Rail> {
        self.rails.get(net)
    }

    /// Emits one vertical [`Segment`] per net, spanning its rail's full extent on
    /// `layer` (§4.5: "emit one vertical Segment per net on the bus layer").
    pub fn rail_segments(&self, layer: &ArcStr, width: f64) -> Vec<Segment> {
        self.rails
            .values()
            .map(|rail| Segment {
                net: rail.net.clone(),
                layer: layer.clone(),
                start: Point::new(rail.x, rail.y_max),
                end: Point::new(rail.x, rail.y_min),
                width,
            })
            .collect()
    }
}

/// Plans vertical bus rails for `nets`, in order, along `side` of `board` (§4.5).
///
/// Rails step inward from the board edge by `bus_spacing`; the returned strip zone
/// covers the outer edge through the innermost rail and should be added to the
/// board's global zone set before grid construction.
pub fn plan_buses(board: &Board, nets: &[ArcStr], side: Side) -> BusPlan {
    let cfg = &board.config;
    let offset = cfg.rounded_corner_radius.max(cfg.edge_clearance);
    let y_max = cfg.height / 2.0 - offset;
    let y_min = -cfg.height / 2.0 + offset;

    let (x0, step) = match side {
        Side::Left => (-cfg.width / 2.0 + cfg.edge_clearance, cfg.bus_spacing),
        Side::Right => (cfg.width / 2.0 - cfg.edge_clearance, -cfg.bus_spacing),
    };

    let mut rails = IndexMap::new();
    let mut innermost_x = x0;
    for (i, net) in nets.iter().enumerate() {
        let x = x0 + step * i as f64;
        innermost_x = x;
        rails.insert(
            net.clone(),
            Rail {
                net: net.clone(),
                x,
                y_min,
                y_max,
            },
        );
    }

    let strip = match side {
        Side::Left => Zone::from_corners(
            Point::new(-cfg.width / 2.0, y_min),
            Point::new(-cfg.width / 2.0, y_max),
            Point::new(innermost_x, y_max),
            Point::new(innermost_x, y_min),
        ),
        Side::Right => Zone::from_corners(
            Point::new(innermost_x, y_min),
            Point::new(innermost_x, y_max),
            Point::new(cfg.width / 2.0, y_max),
            Point::new(cfg.width / 2.0, y_min),
        ),
    };

    BusPlan {
        rails,
        zone: strip,
        side,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardConfig;

    fn board(edge_clearance: f64) -> Board {
        Board::new(BoardConfig {
            width: 20.0,
            height: 10.0,
            resolution: 1.0,
            rounded_corner_radius: 0.0,
            edge_clearance,
            module_margin: 0.0,
            bus_spacing: 1.0,
            bus_width: 0.3,
            track_width: 0.2,
            via_diameter: 0.6,
            via_hole_diameter: 0.3,
        })
    }

    #[test]
    fn three_rails_step_inward_on_left_side() {
        let b = board(1.0);
        let nets = [ArcStr::from("P"), ArcStr::from("G"), ArcStr::from("D")];
        let plan = plan_buses(&b, &nets, Side::Left);
        assert_eq!(plan.rail("P").unwrap().x, -9.0);
        assert_eq!(plan.rail("G").unwrap().x, -8.0);
        assert_eq!(plan.rail("D").unwrap().x, -7.0);
    }

    #[test]
    fn rails_do_not_share_an_x_coordinate() {
        let b = board(1.0);
        let nets = [ArcStr::from("A"), ArcStr::from("B"), ArcStr::from("C")];
        let plan = plan_buses(&b, &nets, Side::Right);
        let xs: Vec<f64> = plan.rails.values().map(|r| r.x).collect();
        for i in 0..xs.len() {
            for j in (i + 1)..xs.len() {
                assert_ne!(xs[i], xs[j]);
            }
        }
    }

    #[test]
    fn zero_edge_clearance_still_emits_a_rail() {
        let b = board(0.0);
        let nets = [ArcStr::from("A")];
        let plan = plan_buses(&b, &nets, Side::Left);
        assert_eq!(plan.rail("A").unwrap().x, -10.0);
    }

    #[test]
    fn rail_segments_emits_one_full_length_segment_per_net() {
        let b = board(1.0);
        let nets = [ArcStr::from("P"), ArcStr::from("G")];
        let plan = plan_buses(&b, &nets, Side::Left);
        let layer = ArcStr::from("buses");
        let segments = plan.rail_segments(&layer, 0.3);

        assert_eq!(segments.len(), 2);
        for (net, expected_x) in [("P", -9.0), ("G", -8.0)] {
            let rail = plan.rail(net).unwrap();
            let segment = segments.iter().find(|s| s.net == *net).unwrap();
            assert_eq!(segment.layer, layer);
            assert_eq!(segment.width, 0.3);
            assert_eq!(segment.start, Point::new(expected_x, rail.y_max));
            assert_eq!(segment.end, Point::new(expected_x, rail.y_min));
        }
    }
}
