//! Ruled-grid table detection.
//!
//! Pipeline: filter short edges -> snap -> join -> intersections -> cells ->
//! group cells into tables -> lay each group out as a rectangular grid ->
//! fill cells with text.

use std::collections::{BTreeMap, BTreeSet};

use crate::edges::Edge;
use crate::geometry::{BBox, Orientation};
use crate::text::{Char, chars_to_text};

/// Two coordinates closer than this are the same grid line.
const COORD_EPSILON: f64 = 1e-6;

/// Configuration for grid detection.
///
/// All tolerances are in PDF points and default to 3.0.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    /// Snap tolerance for aligning vertical edges along x.
    pub snap_x_tolerance: f64,
    /// Snap tolerance for aligning horizontal edges along y.
    pub snap_y_tolerance: f64,
    /// Maximum gap along x when joining horizontal segments.
    pub join_x_tolerance: f64,
    /// Maximum gap along y when joining vertical segments.
    pub join_y_tolerance: f64,
    /// Edges shorter than this are ignored.
    pub edge_min_length: f64,
    pub intersection_x_tolerance: f64,
    pub intersection_y_tolerance: f64,
    /// Horizontal gap between glyphs that starts a new word.
    pub text_x_tolerance: f64,
    /// Vertical distance between glyph tops that starts a new line.
    pub text_y_tolerance: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            snap_x_tolerance: 3.0,
            snap_y_tolerance: 3.0,
            join_x_tolerance: 3.0,
            join_y_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_x_tolerance: 3.0,
            intersection_y_tolerance: 3.0,
            text_x_tolerance: 3.0,
            text_y_tolerance: 3.0,
        }
    }
}

impl TableSettings {
    /// Set both snap tolerances.
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_x_tolerance = tolerance;
        self.snap_y_tolerance = tolerance;
        self
    }

    /// Set both join tolerances.
    pub fn with_join_tolerance(mut self, tolerance: f64) -> Self {
        self.join_x_tolerance = tolerance;
        self.join_y_tolerance = tolerance;
        self
    }

    /// Set both text tolerances.
    pub fn with_text_tolerance(mut self, tolerance: f64) -> Self {
        self.text_x_tolerance = tolerance;
        self.text_y_tolerance = tolerance;
        self
    }
}

/// A rectangular cell bounded by four intersections.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub bbox: BBox,
    pub text: Option<String>,
}

/// A detected table laid out as a rectangular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Bounding box enclosing the entire table.
    pub bbox: BBox,
    /// `rows[r][c]`, top-to-bottom then left-to-right. `None` marks an empty
    /// cell or a slot covered by a spanning cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Grid {
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// An intersection point between horizontal and vertical edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub x: f64,
    pub y: f64,
}

/// Runs the detection pipeline for one page.
#[derive(Debug, Clone, Default)]
pub struct GridFinder {
    settings: TableSettings,
}

impl GridFinder {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    /// Detect grids from a page's edges and fill them with the page's chars.
    ///
    /// Grids are ordered top-to-bottom, then left-to-right.
    pub fn find(&self, edges: Vec<Edge>, chars: &[Char]) -> Vec<Grid> {
        let s = &self.settings;
        let edges: Vec<Edge> = edges
            .into_iter()
            .filter(|e| e.length() >= s.edge_min_length)
            .collect();
        if edges.is_empty() {
            return Vec::new();
        }

        let edges = snap_edges(edges, s.snap_x_tolerance, s.snap_y_tolerance);
        let edges = join_edges(edges, s.join_x_tolerance, s.join_y_tolerance);
        let intersections =
            edges_to_intersections(&edges, s.intersection_x_tolerance, s.intersection_y_tolerance);
        let mut cells = intersections_to_cells(
            &intersections,
            &edges,
            s.intersection_x_tolerance,
            s.intersection_y_tolerance,
        );
        fill_cell_text(&mut cells, chars, s.text_x_tolerance, s.text_y_tolerance);

        let mut grids: Vec<Grid> = group_cells(cells)
            .into_iter()
            .filter_map(|group| cells_to_grid(&group))
            .collect();
        grids.sort_by(|a, b| {
            a.bbox
                .top
                .total_cmp(&b.bbox.top)
                .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
        });
        grids
    }
}

/// Snap nearby parallel edges to aligned positions.
///
/// Horizontal edges cluster by y within `snap_y_tolerance`, vertical edges
/// by x within `snap_x_tolerance`; each cluster moves to its mean. Diagonal
/// edges pass through unchanged. This does not merge edges.
pub fn snap_edges(edges: Vec<Edge>, snap_x_tolerance: f64, snap_y_tolerance: f64) -> Vec<Edge> {
    let (mut horizontals, mut verticals, mut result) = split_by_orientation(edges);

    snap_group(
        &mut horizontals,
        snap_y_tolerance,
        |e| e.top,
        |e, v| {
            e.top = v;
            e.bottom = v;
        },
    );
    snap_group(
        &mut verticals,
        snap_x_tolerance,
        |e| e.x0,
        |e, v| {
            e.x0 = v;
            e.x1 = v;
        },
    );

    result.extend(horizontals);
    result.extend(verticals);
    result
}

fn split_by_orientation(edges: Vec<Edge>) -> (Vec<Edge>, Vec<Edge>, Vec<Edge>) {
    let mut horizontals = Vec::new();
    let mut verticals = Vec::new();
    let mut other = Vec::new();
    for edge in edges {
        match edge.orientation {
            Orientation::Horizontal => horizontals.push(edge),
            Orientation::Vertical => verticals.push(edge),
            Orientation::Diagonal => other.push(edge),
        }
    }
    (horizontals, verticals, other)
}

fn snap_group<F, G>(edges: &mut [Edge], tolerance: f64, key: F, mut set: G)
where
    F: Fn(&Edge) -> f64,
    G: FnMut(&mut Edge, f64),
{
    if edges.is_empty() {
        return;
    }
    edges.sort_by(|a, b| key(a).total_cmp(&key(b)));

    let mut start = 0;
    for i in 1..=edges.len() {
        if i == edges.len() || (key(&edges[i]) - key(&edges[start])).abs() > tolerance {
            let sum: f64 = edges[start..i].iter().map(&key).sum();
            let mean = sum / (i - start) as f64;
            for edge in &mut edges[start..i] {
                set(edge, mean);
            }
            start = i;
        }
    }
}

/// Merge overlapping or nearly touching collinear segments.
///
/// Horizontal segments on the same y merge when the gap along x is within
/// `join_x_tolerance`; vertical segments likewise along y.
pub fn join_edges(edges: Vec<Edge>, join_x_tolerance: f64, join_y_tolerance: f64) -> Vec<Edge> {
    let (horizontals, verticals, mut result) = split_by_orientation(edges);

    result.extend(join_collinear(
        horizontals,
        |e| e.top,
        |e| (e.x0, e.x1),
        |proto, start, end| Edge {
            x0: start,
            x1: end,
            ..proto.clone()
        },
        join_x_tolerance,
    ));
    result.extend(join_collinear(
        verticals,
        |e| e.x0,
        |e| (e.top, e.bottom),
        |proto, start, end| Edge {
            top: start,
            bottom: end,
            ..proto.clone()
        },
        join_y_tolerance,
    ));
    result
}

fn join_collinear<K, S, B>(mut edges: Vec<Edge>, key: K, span: S, build: B, tolerance: f64) -> Vec<Edge>
where
    K: Fn(&Edge) -> f64,
    S: Fn(&Edge) -> (f64, f64),
    B: Fn(&Edge, f64, f64) -> Edge,
{
    edges.sort_by(|a, b| {
        key(a)
            .total_cmp(&key(b))
            .then_with(|| span(a).0.total_cmp(&span(b).0))
    });

    let mut result = Vec::new();
    let mut i = 0;
    while i < edges.len() {
        let line = key(&edges[i]);
        let mut j = i + 1;
        while j < edges.len() && (key(&edges[j]) - line).abs() < COORD_EPSILON {
            j += 1;
        }

        let (mut start, mut end) = span(&edges[i]);
        let mut proto = i;
        for k in (i + 1)..j {
            let (s, e) = span(&edges[k]);
            if s <= end + tolerance {
                end = end.max(e);
            } else {
                result.push(build(&edges[proto], start, end));
                start = s;
                end = e;
                proto = k;
            }
        }
        result.push(build(&edges[proto], start, end));
        i = j;
    }
    result
}

/// Find every point where a horizontal and a vertical edge cross.
///
/// Only actual segment overlap counts (within tolerance), not infinite line
/// extensions. Output is sorted by x then y with duplicates removed.
pub fn edges_to_intersections(
    edges: &[Edge],
    x_tolerance: f64,
    y_tolerance: f64,
) -> Vec<Intersection> {
    let horizontals = edges
        .iter()
        .filter(|e| e.orientation == Orientation::Horizontal);
    let verticals: Vec<&Edge> = edges
        .iter()
        .filter(|e| e.orientation == Orientation::Vertical)
        .collect();

    let mut points = Vec::new();
    for h in horizontals {
        for v in &verticals {
            if v.x0 >= h.x0 - x_tolerance
                && v.x0 <= h.x1 + x_tolerance
                && h.top >= v.top - y_tolerance
                && h.top <= v.bottom + y_tolerance
            {
                points.push(Intersection { x: v.x0, y: h.top });
            }
        }
    }

    points.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    points.dedup_by(|a, b| (a.x - b.x).abs() < COORD_EPSILON && (a.y - b.y).abs() < COORD_EPSILON);
    points
}

/// Build the smallest rectangular cell anchored at each intersection.
///
/// A cell's top-left corner connects to a corner below and a corner to the
/// right along ruling edges, and the opposite corner closes the rectangle.
/// Cells can span several grid slots when an inner divider is missing.
/// Expects points ordered as [`edges_to_intersections`] returns them.
pub fn intersections_to_cells(
    intersections: &[Intersection],
    edges: &[Edge],
    x_tolerance: f64,
    y_tolerance: f64,
) -> Vec<Cell> {
    let keys: BTreeSet<(i64, i64)> = intersections
        .iter()
        .map(|pt| (float_key(pt.x), float_key(pt.y)))
        .collect();
    let has_point = |x: f64, y: f64| keys.contains(&(float_key(x), float_key(y)));

    let connected_v = |x: f64, y0: f64, y1: f64| {
        edges.iter().any(|e| {
            e.orientation == Orientation::Vertical
                && (e.x0 - x).abs() <= x_tolerance
                && e.top <= y0.min(y1) + y_tolerance
                && e.bottom >= y0.max(y1) - y_tolerance
        })
    };
    let connected_h = |y: f64, x0: f64, x1: f64| {
        edges.iter().any(|e| {
            e.orientation == Orientation::Horizontal
                && (e.top - y).abs() <= y_tolerance
                && e.x0 <= x0.min(x1) + x_tolerance
                && e.x1 >= x0.max(x1) - x_tolerance
        })
    };

    let mut cells = Vec::new();
    for pt in intersections {
        let below = intersections
            .iter()
            .filter(|o| float_key(o.x) == float_key(pt.x) && o.y > pt.y + COORD_EPSILON);
        // `intersections` is sorted by x then y, so both scans ascend.
        let right: Vec<&Intersection> = intersections
            .iter()
            .filter(|o| float_key(o.y) == float_key(pt.y) && o.x > pt.x + COORD_EPSILON)
            .collect();

        let corner = below
            .filter(|b| connected_v(pt.x, pt.y, b.y))
            .find_map(|b| {
                right
                    .iter()
                    .filter(|r| connected_h(pt.y, pt.x, r.x))
                    .find(|r| {
                        has_point(r.x, b.y)
                            && connected_v(r.x, r.y, b.y)
                            && connected_h(b.y, b.x, r.x)
                    })
                    .map(|r| (r.x, b.y))
            });

        if let Some((x1, bottom)) = corner {
            cells.push(Cell {
                bbox: BBox::new(pt.x, pt.y, x1, bottom),
                text: None,
            });
        }
    }
    cells
}

/// Set each cell's text from the chars whose center falls inside it.
pub fn fill_cell_text(cells: &mut [Cell], chars: &[Char], x_tolerance: f64, y_tolerance: f64) {
    for cell in cells.iter_mut() {
        let inside: Vec<&Char> = chars
            .iter()
            .filter(|ch| {
                let (cx, cy) = ch.bbox.center();
                cell.bbox.contains(cx, cy)
            })
            .collect();
        cell.text = chars_to_text(&inside, x_tolerance, y_tolerance);
    }
}

/// Group cells that share a boundary segment (union-find).
///
/// Groups come back in first-cell order, which is deterministic.
pub fn group_cells(cells: Vec<Cell>) -> Vec<Vec<Cell>> {
    let n = cells.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if cells_share_edge(&cells[i], &cells[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<Cell>> = BTreeMap::new();
    for (i, cell) in cells.into_iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(cell);
    }
    groups.into_values().collect()
}

fn cells_share_edge(a: &Cell, b: &Cell) -> bool {
    let eps = COORD_EPSILON;
    let shared_vertical = ((a.bbox.x1 - b.bbox.x0).abs() < eps
        || (a.bbox.x0 - b.bbox.x1).abs() < eps)
        && a.bbox.top < b.bbox.bottom + eps
        && b.bbox.top < a.bbox.bottom + eps;
    let shared_horizontal = ((a.bbox.bottom - b.bbox.top).abs() < eps
        || (a.bbox.top - b.bbox.bottom).abs() < eps)
        && a.bbox.x0 < b.bbox.x1 + eps
        && b.bbox.x0 < a.bbox.x1 + eps;
    shared_vertical || shared_horizontal
}

/// Lay a group of cells out on its own row and column boundaries.
///
/// Rows or columns no cell starts in are dropped so spanning borders do not
/// produce all-empty slots.
pub fn cells_to_grid(cells: &[Cell]) -> Option<Grid> {
    let first = cells.first()?;
    let bbox = cells.iter().fold(first.bbox, |acc, c| acc.union(&c.bbox));

    let row_starts = unique_sorted(cells.iter().map(|c| c.bbox.top));
    let col_starts = unique_sorted(cells.iter().map(|c| c.bbox.x0));
    let row_index: BTreeMap<i64, usize> = row_starts
        .iter()
        .enumerate()
        .map(|(i, &y)| (float_key(y), i))
        .collect();
    let col_index: BTreeMap<i64, usize> = col_starts
        .iter()
        .enumerate()
        .map(|(i, &x)| (float_key(x), i))
        .collect();

    let mut rows = vec![vec![None; col_starts.len()]; row_starts.len()];
    for cell in cells {
        let r = row_index.get(&float_key(cell.bbox.top))?;
        let c = col_index.get(&float_key(cell.bbox.x0))?;
        rows[*r][*c] = cell.text.clone();
    }

    Some(Grid { bbox, rows })
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut seen = BTreeSet::new();
    let mut out: Vec<f64> = values.filter(|v| seen.insert(float_key(*v))).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Integer key for grouping floats (three decimal places).
fn float_key(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}
