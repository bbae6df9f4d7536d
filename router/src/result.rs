//! Output types: board-coordinate segments, vias, and the accumulated routing result (§3, §6).

use arcstr::ArcStr;
use geometry::Point;

/// A single straight trace segment on one layer, owned by one net.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// The net this segment belongs to.
    pub net: ArcStr,
    /// The layer this segment is drawn on.
    pub layer: ArcStr,
    /// The segment's start point.
    pub start: Point,
    /// The segment's end point.
    pub end: Point,
    /// The trace width, in millimeters.
    pub width: f64,
}

/// A layer-transition or trace-to-bus junction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Via {
    /// The via's board position.
    pub position: Point,
    /// Index into the owning [`RoutingResult`]'s net table.
    pub net_index: usize,
}

/// The accumulated output of a routing run: segments per net, vias, and counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoutingResult {
    /// Nets, in the order they were first routed; indexes [`Via::net_index`].
    nets: Vec<ArcStr>,
    /// Segments emitted per net.
    pub segments: Vec<Segment>,
    /// Vias placed, in routing order.
    pub vias: Vec<Via>,
    /// Sockets successfully connected to their bus.
    pub connected: usize,
    /// Sockets that could not be routed.
    pub failed: usize,
    /// Number of scheduler backtracking attempts taken across the whole run.
    pub backtrack_count: usize,
}

impl RoutingResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    fn net_index(&mut self, net: &ArcStr) -> usize {
        match self.nets.iter().position(|n| n == net) {
            Some(i) => i,
            None => {
                self.nets.push(net.clone());
                self.nets.len() - 1
            }
        }
    }

    /// Records a via for `net`, interning the net into the result's net table.
    pub fn add_via(&mut self, net: &ArcStr, position: Point) {
        let net_index = self.net_index(net);
        self.vias.push(Via { position, net_index });
    }

    /// Removes the most recently added via belonging to `net`, if any (scheduler backtracking).
    pub fn remove_last_via(&mut self, net: &ArcStr) {
        if let Some(idx) = self.nets.iter().position(|n| n == net) {
            if let Some(pos) = self.vias.iter().rposition(|v| v.net_index == idx) {
                self.vias.remove(pos);
            }
        }
    }

    /// Removes every segment belonging to `net` added after `segments_before`, for backtracking.
    pub fn truncate_segments(&mut self, segments_before: usize) {
        self.segments.truncate(segments_before);
    }

    /// Merges `other` into this result: segments are appended as-is, vias are
    /// re-interned against this result's net table, and counters are summed.
    ///
    /// Used to compose one result per bus layer into a single board-wide result.
    pub fn merge(&mut self, other: RoutingResult) {
        self.segments.extend(other.segments);
        for via in &other.vias {
            let net = other.nets[via.net_index].clone();
            self.add_via(&net, via.position);
        }
        self.connected += other.connected;
        self.failed += other.failed;
        self.backtrack_count += other.backtrack_count;
    }

    /// The vias placed for `net`, deduplicated by position (supplemented convenience, §10).
    pub fn vias_for(&self, net: &str) -> Vec<Point> {
        let Some(idx) = self.nets.iter().position(|n| n == net) else {
            return Vec::new();
        };
        let mut positions: Vec<Point> = Vec::new();
        for via in self.vias.iter().filter(|v| v.net_index == idx) {
            if !positions.iter().any(|p| p.approx_eq(&via.position, 1e-9)) {
                positions.push(via.position);
            }
        }
        positions
    }
}
