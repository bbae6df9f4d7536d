//! Board-level data model: geometry configuration, layers, nets, and sockets.

use std::collections::HashMap;

use arcstr::ArcStr;
use geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which side of the board a bus layer's rails are placed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Rails along the left (−x) edge of the board.
    Left,
    /// Rails along the right (+x) edge of the board.
    Right,
}

impl std::str::FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(Error::InvalidSide(other.to_string())),
        }
    }
}

/// The pathfinding algorithm used by the [pathfinder adapter](crate::pathfind).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// A* search with a Manhattan-distance heuristic.
    #[default]
    AStar,
    /// Breadth-first search.
    BreadthFirst,
}

/// How diagonal steps are permitted during pathfinding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagonalPolicy {
    /// Diagonal steps are never taken.
    Never,
    /// A diagonal step is allowed only when both orthogonal neighbors are free.
    #[default]
    OnlyWhenNoObstacle,
    /// Diagonal steps are always allowed between two free cells.
    Always,
}

/// Board-wide geometric and electrical constants (§6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Board width, in millimeters.
    pub width: f64,
    /// Board height, in millimeters.
    pub height: f64,
    /// Grid cell size, in millimeters.
    pub resolution: f64,
    /// Radius of the board's rounded corners, in millimeters.
    pub rounded_corner_radius: f64,
    /// Minimum clearance from the board edge, in millimeters.
    pub edge_clearance: f64,
    /// Margin added around module keep-out zones, in millimeters.
    pub module_margin: f64,
    /// Spacing between adjacent bus rails, in millimeters.
    pub bus_spacing: f64,
    /// Width of bus-rail traces, in millimeters.
    pub bus_width: f64,
    /// Width of signal traces, in millimeters.
    pub track_width: f64,
    /// Diameter of via pads, in millimeters.
    pub via_diameter: f64,
    /// Diameter of via drill holes, in millimeters.
    pub via_hole_diameter: f64,
}

/// Routing behavior options (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingOptions {
    /// The pathfinding algorithm to use.
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Whether diagonal traces are permitted, and under what policy.
    #[serde(default)]
    pub diagonal_policy: DiagonalPolicy,
    /// Whether a net may overlap its own earlier traces.
    #[serde(default)]
    pub allow_overlap: bool,
    /// Which side of the board the active bus layer's rails sit on.
    pub side: Side,
}

/// A signal layer: a name, the nets routed on it, and accumulated segments.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Layer {
    /// The layer's name.
    pub name: ArcStr,
    /// Nets assigned to this layer, in bus order.
    pub nets: Vec<ArcStr>,
}

impl Layer {
    /// Creates a new, empty layer with the given name.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            nets: Vec::new(),
        }
    }

    /// Assigns `net` to this layer, if not already present.
    pub fn add_net(&mut self, net: impl Into<ArcStr>) {
        let net = net.into();
        if !self.nets.contains(&net) {
            self.nets.push(net);
        }
    }
}

/// A keep-out zone: an axis-aligned rectangle with corners in BL/TL/TR/BR order (§3).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Bottom-left corner.
    pub bl: Point,
    /// Top-left corner.
    pub tl: Point,
    /// Top-right corner.
    pub tr: Point,
    /// Bottom-right corner.
    pub br: Point,
}

impl Zone {
    /// Creates a zone from its four corners, which must already be in BL/TL/TR/BR order.
    pub const fn from_corners(bl: Point, tl: Point, tr: Point, br: Point) -> Self {
        Self { bl, tl, tr, br }
    }

    /// The axis-aligned bounding rectangle of this zone (used for grid marking and containment).
    pub fn bounds(&self) -> Rect {
        Rect::new(self.bl, self.tr)
    }

    /// Returns `true` if `p` lies within this zone, inclusive of the boundary.
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }
}

/// A named electrical connection point on the board (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    /// The net this socket belongs to.
    pub net: ArcStr,
    /// The socket's board position, aligned to resolution.
    pub position: Point,
}

/// A fully-specified board: immutable once routing begins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    /// Board geometric and electrical constants.
    pub config: BoardConfig,
    /// Signal layers, keyed by layer name.
    pub layers: HashMap<ArcStr, Layer>,
    /// Module and bus keep-out zones.
    pub zones: Vec<Zone>,
    /// All sockets, keyed by net name.
    pub sockets: HashMap<ArcStr, Vec<Socket>>,
}

impl Board {
    /// Creates a new board with no layers, zones, or sockets.
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            layers: HashMap::new(),
            zones: Vec::new(),
            sockets: HashMap::new(),
        }
    }

    /// Registers a layer, overwriting any existing layer of the same name.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.insert(layer.name.clone(), layer);
    }

    /// Adds a zone to the board's global keep-out set.
    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    /// Registers a socket, validating that its position lies on the resolution grid.
    pub fn add_socket(&mut self, net: impl Into<ArcStr>, position: Point) -> Result<()> {
        let net = net.into();
        if !position.is_aligned(self.config.resolution) {
            return Err(Error::MisalignedSocket {
                net: net.to_string(),
                point: position,
                resolution: self.config.resolution,
            });
        }
        self.sockets
            .entry(net.clone())
            .or_default()
            .push(Socket { net, position });
        Ok(())
    }

    /// The grid dimensions `(cols, rows)` implied by this board's width, height, and resolution.
    pub fn grid_dims(&self) -> (usize, usize) {
        let cols = (self.config.width / self.config.resolution).ceil() as usize;
        let rows = (self.config.height / self.config.resolution).ceil() as usize;
        (cols, rows)
    }
}
