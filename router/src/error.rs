//! Error types for the routing core.

use geometry::Point;

/// A result type returning router errors.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for fatal router failures.
///
/// These abort the current job immediately; see [`crate::issues`] for the
/// non-fatal, per-socket outcomes that are instead accumulated into a
/// [`crate::issues::IssueSet`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// One or more zone corners are not aligned to the board's resolution grid.
    #[error("zone corners {points:?} are not aligned to resolution {resolution}")]
    MisalignedZone {
        /// Every offending corner found across all extracted zones.
        points: Vec<Point>,
        /// The board resolution the corners should have been aligned to.
        resolution: f64,
    },
    /// A socket position is not aligned to the board's resolution grid.
    #[error("socket {net} at {point:?} is not aligned to resolution {resolution}")]
    MisalignedSocket {
        /// The net owning the socket.
        net: String,
        /// The offending position.
        point: Point,
        /// The board resolution the position should have been aligned to.
        resolution: f64,
    },
    /// An illegal value was supplied for the bus `side` option.
    #[error("invalid bus side: {0}")]
    InvalidSide(String),
    /// The occupancy grid could not be built, e.g. because the board has zero area.
    #[error("cannot build occupancy grid: {0}")]
    InvalidGrid(String),
    /// A zone's line primitives did not close into a valid 4-sided rectangle.
    #[error("zone primitives do not form a closed rectangle: {0}")]
    MalformedZone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_human_readable() {
        let err = Error::InvalidSide("up".to_string());
        assert_eq!(err.to_string(), "invalid bus side: up");
    }
}
