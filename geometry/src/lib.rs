//! Geometry primitives for board-space PCB routing.
//!
//! This crate deals exclusively in board-space millimeters (`f64`). Grid
//! indexing (the mapping from board coordinates to dense-array cells) is
//! layered on top of these primitives by the `router` crate, since that
//! mapping depends on a board's resolution and dimensions.

#![warn(missing_docs)]

pub mod point;
pub mod rect;
pub mod snap;

pub use point::Point;
pub use rect::Rect;
