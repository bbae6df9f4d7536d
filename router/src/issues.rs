//! Non-fatal, per-socket diagnostics accumulated over the course of a routing job.
//!
//! Unlike [`crate::error::Error`], these never abort the job: a socket that
//! cannot be routed is recorded here and the scheduler moves on, per §7 of
//! the routing spec.

use std::fmt::{Debug, Display};

use arcstr::ArcStr;
use geometry::Point;
use serde::{Deserialize, Serialize};

/// A diagnostic issue that should be reported to callers.
pub trait Diagnostic: Debug + Display {
    /// The severity of this issue.
    fn severity(&self) -> Severity;
}

/// An enumeration of possible severity levels.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    /// An informational message.
    Info,
    /// A warning: something was skipped or discarded, but the job continues normally.
    #[default]
    Warning,
    /// A socket failed to route after backtracking was exhausted.
    Error,
}

/// A single non-fatal issue encountered while routing a board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RouterIssue {
    /// The pathfinder found no path for a socket, and backtracking could not recover.
    UnroutableSocket {
        /// The net owning the socket.
        net: ArcStr,
        /// The socket's board position.
        position: Point,
    },
    /// A socket's net has no configured bus rail.
    MissingBus {
        /// The net missing a bus assignment.
        net: ArcStr,
    },
    /// An aperture-encoded socket position could not be fully decoded.
    DecodeWarning {
        /// The position at which decoding was incomplete.
        position: Point,
        /// A human-readable reason.
        reason: ArcStr,
    },
    /// A socket's position does not fall inside any registered zone, so it cannot
    /// be assigned a scheduling order and is dropped.
    SocketOutsideZone {
        /// The net owning the socket.
        net: ArcStr,
        /// The socket's board position.
        position: Point,
    },
}

impl Diagnostic for RouterIssue {
    fn severity(&self) -> Severity {
        match self {
            RouterIssue::UnroutableSocket { .. } => Severity::Error,
            RouterIssue::MissingBus { .. } => Severity::Warning,
            RouterIssue::DecodeWarning { .. } => Severity::Warning,
            RouterIssue::SocketOutsideZone { .. } => Severity::Warning,
        }
    }
}

impl Display for RouterIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterIssue::UnroutableSocket { net, position } => {
                write!(f, "could not route socket for net `{net}` at {position:?}")
            }
            RouterIssue::MissingBus { net } => {
                write!(f, "net `{net}` has no configured bus rail")
            }
            RouterIssue::DecodeWarning { position, reason } => {
                write!(f, "discarding socket at {position:?}: {reason}")
            }
            RouterIssue::SocketOutsideZone { net, position } => {
                write!(f, "socket for net `{net}` at {position:?} is not inside any zone")
            }
        }
    }
}

/// A collection of issues accumulated over the course of a routing job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueSet<T> {
    issues: Vec<T>,
    #[serde(skip)]
    num_errors: usize,
    #[serde(skip)]
    num_warnings: usize,
}

impl<T> IssueSet<T> {
    /// Creates a new, empty issue set.
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            num_errors: 0,
            num_warnings: 0,
        }
    }

    /// Returns an iterator over all issues in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.issues.iter()
    }

    /// The number of issues in this set.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if this issue set is empty.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<T: Diagnostic> IssueSet<T> {
    /// Adds the given issue to the issue set.
    pub fn add(&mut self, issue: T) {
        match issue.severity() {
            Severity::Error => self.num_errors += 1,
            Severity::Warning => self.num_warnings += 1,
            Severity::Info => (),
        }
        match issue.severity() {
            Severity::Error => tracing::error!("{}", issue),
            Severity::Warning => tracing::warn!("{}", issue),
            Severity::Info => tracing::info!("{}", issue),
        }
        self.issues.push(issue);
    }

    /// The number of issues with [`Severity::Error`].
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// The number of issues with [`Severity::Warning`].
    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }
}

impl<T> IntoIterator for IssueSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}
