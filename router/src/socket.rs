//! Socket extraction: decoding net-name-tagged socket locations from aperture-encoded
//! vector-art primitives (C2, §4.2).

use std::collections::HashMap;

use arcstr::ArcStr;
use geometry::Point;

use crate::issues::{IssueSet, RouterIssue};

/// The sentinel aperture diameter marking a position as a socket.
pub const SOCKET_SENTINEL_DIAMETER: f64 = 0.00999;

/// Tolerance used when comparing aperture diameters.
const DIAMETER_EPSILON: f64 = 1e-7;

/// A single degenerate (zero-length) flash primitive carrying an aperture diameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApertureFlash {
    /// The flash's board position.
    pub position: Point,
    /// The aperture diameter, in millimeters.
    pub diameter: f64,
}

/// Decodes a single non-sentinel diameter of the form `0.0IIPPP` into `(II, PPP)`.
///
/// Returns `None` if the diameter is not of that form or `II`/`PPP` are out of range.
fn decode_character_diameter(diameter: f64) -> Option<(u32, u32)> {
    // `0.0IIPPP` has five digits after the decimal point: II (2 digits) then PPP (3 digits).
    let scaled = (diameter * 100_000.0).round();
    if scaled < 0.0 {
        return None;
    }
    let scaled = scaled as u32;
    if scaled >= 100_000 {
        return None;
    }
    let ii = scaled / 1000;
    let ppp = scaled % 1000;
    if !(1..=99).contains(&ii) || !(32..=127).contains(&ppp) {
        return None;
    }
    Some((ii, ppp))
}

fn is_sentinel(diameter: f64) -> bool {
    (diameter - SOCKET_SENTINEL_DIAMETER).abs() <= DIAMETER_EPSILON
}

/// Decodes the net name encoded at a single position from its collected aperture diameters.
///
/// Returns `None` (with a diagnostic recorded) if the sentinel is absent or no character
/// diameter decodes successfully.
fn decode_position(
    position: Point,
    diameters: &[f64],
    issues: &mut IssueSet<RouterIssue>,
) -> Option<ArcStr> {
    if !diameters.iter().any(|&d| is_sentinel(d)) {
        return None;
    }

    let mut characters: Vec<(u32, char)> = Vec::new();
    let mut seen_indices = std::collections::HashSet::new();
    for &d in diameters.iter().filter(|&&d| !is_sentinel(d)) {
        match decode_character_diameter(d) {
            Some((ii, ppp)) => {
                if !seen_indices.insert(ii) {
                    issues.add(RouterIssue::DecodeWarning {
                        position,
                        reason: arcstr::format!("duplicate character index {ii}"),
                    });
                    continue;
                }
                // SAFETY: ppp validated to printable-ASCII range above.
                characters.push((ii, ppp as u8 as char));
            }
            None => {
                issues.add(RouterIssue::DecodeWarning {
                    position,
                    reason: arcstr::format!("unrecognized aperture diameter {d}"),
                });
            }
        }
    }

    if characters.is_empty() {
        return None;
    }

    characters.sort_by_key(|&(ii, _)| ii);
    let name: String = characters.into_iter().map(|(_, c)| c).collect();
    Some(ArcStr::from(name))
}

/// Decodes socket positions out of a flat set of aperture flashes.
///
/// Flashes are first grouped by position, then each position is decoded independently
/// per §4.2. Positions lacking the sentinel diameter are silently ignored; positions
/// with the sentinel but no valid characters are dropped with a [`RouterIssue::DecodeWarning`].
///
/// Output positions are snapped to the `resolution` grid.
pub fn extract_sockets(
    flashes: &[ApertureFlash],
    resolution: f64,
    issues: &mut IssueSet<RouterIssue>,
) -> HashMap<ArcStr, Vec<Point>> {
    let mut by_position: Vec<(Point, Vec<f64>)> = Vec::new();
    for flash in flashes {
        match by_position
            .iter_mut()
            .find(|(p, _)| p.approx_eq(&flash.position, 1e-6))
        {
            Some((_, diameters)) => diameters.push(flash.diameter),
            None => by_position.push((flash.position, vec![flash.diameter])),
        }
    }

    let mut result: HashMap<ArcStr, Vec<Point>> = HashMap::new();
    for (position, diameters) in by_position {
        if let Some(net) = decode_position(position, &diameters, issues) {
            result
                .entry(net)
                .or_default()
                .push(position.snap_to_grid(resolution));
        }
    }
    result
}
