//! Keep-out zone extraction: rebuilding axis-aligned rectangles from closed loops of
//! line primitives drawn with a dedicated aperture (C3, §4.3).

use geometry::{Point, Rect};

use crate::board::Zone;
use crate::error::{Error, Result};

const EPSILON: f64 = 1e-4;

/// A single line primitive from the input artwork.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePrimitive {
    /// The line's start point.
    pub start: Point,
    /// The line's end point.
    pub end: Point,
    /// The aperture diameter the line was drawn with.
    pub diameter: f64,
}

fn points_close(a: Point, b: Point) -> bool {
    a.approx_eq(&b, EPSILON)
}

/// Walks a chain of lines starting from `lines[start]`, following the unique successor
/// whose start point matches the current line's end point, until the chain closes
/// or no successor is found.
///
/// Returns the ordered list of line indices in the chain, including `start`.
fn walk_chain(lines: &[LinePrimitive], visited: &[bool], start: usize) -> Option<Vec<usize>> {
    let mut chain = vec![start];
    let mut current_end = lines[start].end;
    let loop_start = lines[start].start;

    loop {
        if chain.len() == 4 {
            return if points_close(current_end, loop_start) {
                Some(chain)
            } else {
                None
            };
        }
        let next = lines.iter().enumerate().position(|(i, l)| {
            !visited[i] && !chain.contains(&i) && points_close(l.start, current_end)
        })?;
        current_end = lines[next].end;
        chain.push(next);
    }
}

/// Rebuilds the four-corner rectangle implied by a closed chain of exactly 4 lines.
///
/// Corners are de-duplicated, sorted lexicographically by `(x, y)` to obtain
/// `(bl, tl, br, tr)`, then reassembled in BL/TL/TR/BR order.
fn corners_of_chain(lines: &[LinePrimitive], chain: &[usize]) -> Vec<Point> {
    let mut corners: Vec<Point> = Vec::new();
    for &i in chain {
        let p = lines[i].start;
        if !corners.iter().any(|c| points_close(*c, p)) {
            corners.push(p);
        }
    }
    corners.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap()
            .then(a.y.partial_cmp(&b.y).unwrap())
    });
    corners
}

/// Extracts the ordered list of keep-out rectangles from a flat set of line primitives (§4.3).
///
/// Only lines whose diameter matches `keep_out_aperture_diameter` (within [`EPSILON`]) and
/// whose length is non-zero participate. Each accepted rectangle is inflated outward by
/// `module_margin`, and every original corner is validated against `resolution`: a
/// misalignment anywhere is fatal, but every chain is still scanned first so the error
/// lists every offending corner across every zone, not just the first one found.
pub fn extract_zones(
    primitives: &[LinePrimitive],
    keep_out_aperture_diameter: f64,
    module_margin: f64,
    resolution: f64,
) -> Result<Vec<Zone>> {
    let lines: Vec<LinePrimitive> = primitives
        .iter()
        .copied()
        .filter(|l| {
            !points_close(l.start, l.end)
                && (l.diameter - keep_out_aperture_diameter).abs() <= EPSILON
        })
        .collect();

    let mut visited = vec![false; lines.len()];
    let mut zones = Vec::new();
    let mut misaligned: Vec<Point> = Vec::new();

    for start in 0..lines.len() {
        if visited[start] {
            continue;
        }
        let Some(chain) = walk_chain(&lines, &visited, start) else {
            continue;
        };
        for &i in &chain {
            visited[i] = true;
        }

        let corners = corners_of_chain(&lines, &chain);
        if corners.len() != 4 {
            return Err(Error::MalformedZone(format!(
                "expected 4 distinct corners, found {}",
                corners.len()
            )));
        }

        for corner in &corners {
            if !corner.is_aligned(resolution) {
                misaligned.push(*corner);
            }
        }

        // Sorted lexicographically by (x, y): [bl, tl, br, tr].
        let (bl, tr) = (corners[0], corners[3]);
        let inflated = Rect::new(bl, tr).inflate(module_margin);
        let zone = Zone::from_corners(
            inflated.bl,
            Point::new(inflated.bl.x, inflated.tr.y),
            inflated.tr,
            Point::new(inflated.tr.x, inflated.bl.y),
        );
        zones.push(zone);
    }

    if !misaligned.is_empty() {
        return Err(Error::MisalignedZone {
            points: misaligned,
            resolution,
        });
    }

    Ok(zones)
}
