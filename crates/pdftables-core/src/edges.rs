//! Ruling edges used by grid detection.
//!
//! Edges are straight segments in top-left page space, taken from stroked
//! or filled path segments and rectangle borders.

use crate::geometry::Orientation;

/// Segments whose extent along one axis is below this are axis-aligned.
const AXIS_EPSILON: f64 = 1e-3;

/// A line segment edge for table detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Left x coordinate.
    pub x0: f64,
    /// Top y coordinate (distance from top of page).
    pub top: f64,
    /// Right x coordinate.
    pub x1: f64,
    /// Bottom y coordinate (distance from top of page).
    pub bottom: f64,
    pub orientation: Orientation,
}

impl Edge {
    /// Length along the edge's primary axis.
    pub fn length(&self) -> f64 {
        let dx = self.x1 - self.x0;
        let dy = self.bottom - self.top;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Build an edge from two endpoints in top-left page space.
pub fn edge_from_segment(xa: f64, ya: f64, xb: f64, yb: f64) -> Edge {
    Edge {
        x0: xa.min(xb),
        top: ya.min(yb),
        x1: xa.max(xb),
        bottom: ya.max(yb),
        orientation: classify_orientation(xa, ya, xb, yb),
    }
}

fn classify_orientation(xa: f64, ya: f64, xb: f64, yb: f64) -> Orientation {
    if (ya - yb).abs() < AXIS_EPSILON {
        Orientation::Horizontal
    } else if (xa - xb).abs() < AXIS_EPSILON {
        Orientation::Vertical
    } else {
        Orientation::Diagonal
    }
}
