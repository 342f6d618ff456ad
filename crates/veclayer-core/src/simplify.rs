//! Geometry simplification applied before drawing.
//!
//! Tolerances are expressed in map units here; callers convert the pixel
//! threshold of a [`SimplifyMethod`] using the current map-to-pixel scale.

use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, LineString, Point, Polygon};

/// Which parts of the drawing pipeline may be simplified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimplifyHints {
    #[default]
    NoSimplification,
    Geometry,
    Antialiasing,
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimplifyAlgorithm {
    /// Douglas-Peucker distance based simplification.
    #[default]
    Distance,
    SnapToGrid,
    Visvalingam,
}

/// Simplification configuration attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimplifyMethod {
    pub hints: SimplifyHints,
    pub algorithm: SimplifyAlgorithm,
    /// Tolerance in pixels.
    pub threshold: f64,
    /// Simplify in the renderer even if the source could do it.
    pub force_local: bool,
}

impl Default for SimplifyMethod {
    fn default() -> Self {
        Self {
            hints: SimplifyHints::NoSimplification,
            algorithm: SimplifyAlgorithm::Distance,
            threshold: 1.0,
            force_local: true,
        }
    }
}

impl SimplifyMethod {
    pub fn geometry(algorithm: SimplifyAlgorithm, threshold: f64) -> Self {
        Self {
            hints: SimplifyHints::Geometry,
            algorithm,
            threshold,
            ..Default::default()
        }
    }

    pub fn simplifies_geometry(&self) -> bool {
        matches!(self.hints, SimplifyHints::Geometry | SimplifyHints::Full) && self.threshold > 0.0
    }
}

/// Simplify `geometry` with a map-unit `tolerance`. Points are returned unchanged.
pub fn simplify_geometry(geometry: &Geometry, algorithm: SimplifyAlgorithm, tolerance: f64) -> Geometry {
    if tolerance <= 0.0 {
        return geometry.clone();
    }
    let line = |l: &LineString| simplify_line(l, algorithm, tolerance, 2);
    let polygon = |p: &Polygon| Polygon {
        exterior: simplify_line(&p.exterior, algorithm, tolerance, 4),
        interiors: p
            .interiors
            .iter()
            .map(|r| simplify_line(r, algorithm, tolerance, 4))
            .collect(),
    };
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => geometry.clone(),
        Geometry::LineString(l) => Geometry::LineString(line(l)),
        Geometry::MultiLineString(ls) => Geometry::MultiLineString(ls.iter().map(line).collect()),
        Geometry::Polygon(p) => Geometry::Polygon(polygon(p)),
        Geometry::MultiPolygon(ps) => Geometry::MultiPolygon(ps.iter().map(polygon).collect()),
    }
}

fn simplify_line(
    line: &LineString,
    algorithm: SimplifyAlgorithm,
    tolerance: f64,
    min_points: usize,
) -> LineString {
    if line.points.len() <= min_points {
        return line.clone();
    }
    let simplified = match algorithm {
        SimplifyAlgorithm::Distance => douglas_peucker(&line.points, tolerance),
        SimplifyAlgorithm::SnapToGrid => snap_to_grid(&line.points, tolerance),
        SimplifyAlgorithm::Visvalingam => visvalingam(&line.points, tolerance * tolerance),
    };
    // A degenerate result would change the geometry type; keep the input instead.
    if simplified.len() < min_points {
        line.clone()
    } else {
        LineString::new(simplified)
    }
}

fn perpendicular_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (index, dist) = (start + 1..end)
            .map(|i| (i, perpendicular_distance(&points[i], &points[start], &points[end])))
            .fold((start, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if dist > tolerance {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn snap_to_grid(points: &[Point], grid: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        let snapped = Point::new((p.x / grid).round() * grid, (p.y / grid).round() * grid);
        if out.last() != Some(&snapped) {
            out.push(snapped);
        }
    }
    // Snapping may merge the closing vertex into its predecessor.
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if first == last && out.len() > 1 && out.first() != out.last() {
            out.push(out[0]);
        }
    }
    out
}

fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

fn visvalingam(points: &[Point], min_area: f64) -> Vec<Point> {
    let mut out = points.to_vec();
    while out.len() > 2 {
        let smallest = (1..out.len() - 1)
            .map(|i| (i, triangle_area(&out[i - 1], &out[i], &out[i + 1])))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match smallest {
            Some((i, area)) if area < min_area => {
                out.remove(i);
            }
            _ => break,
        }
    }
    out
}
