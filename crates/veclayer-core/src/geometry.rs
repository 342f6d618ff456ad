use serde::{Deserialize, Serialize};

/// A 2D point in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest box covering `points`; `None` when there are none.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |bb, p| Self {
            min: Point::new(bb.min.x.min(p.x), bb.min.y.min(p.y)),
            max: Point::new(bb.max.x.max(p.x), bb.max.y.max(p.y)),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

/// An ordered sequence of vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    pub points: Vec<Point>,
}

impl LineString {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.points)
    }
}

/// A polygon with one exterior ring and any number of holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: LineString,
    pub interiors: Vec<LineString>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior: LineString::new(exterior),
            interiors: Vec::new(),
        }
    }

    pub fn with_interior(mut self, ring: Vec<Point>) -> Self {
        self.interiors.push(LineString::new(ring));
        self
    }

    pub fn rings(&self) -> impl Iterator<Item = &LineString> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.exterior.bbox()
    }

    pub fn vertex_count(&self) -> usize {
        self.rings().map(|r| r.points.len()).sum()
    }
}

/// Coarse classification of a geometry, used to pick default symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Line,
    Polygon,
}

/// A vector geometry attached to a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    MultiPoint(Vec<Point>),
    LineString(LineString),
    MultiLineString(Vec<LineString>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => GeometryType::Point,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => GeometryType::Line,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => GeometryType::Polygon,
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        let vertices: Vec<Point> = self.vertices().collect();
        BBox::from_points(&vertices)
    }

    /// Iterate every vertex of the geometry, rings included.
    pub fn vertices(&self) -> Box<dyn Iterator<Item = Point> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(*p)),
            Geometry::MultiPoint(points) => Box::new(points.iter().copied()),
            Geometry::LineString(line) => Box::new(line.points.iter().copied()),
            Geometry::MultiLineString(lines) => {
                Box::new(lines.iter().flat_map(|l| l.points.iter().copied()))
            }
            Geometry::Polygon(poly) => Box::new(poly.rings().flat_map(|r| r.points.iter().copied())),
            Geometry::MultiPolygon(polys) => Box::new(
                polys
                    .iter()
                    .flat_map(|p| p.rings().flat_map(|r| r.points.iter().copied())),
            ),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().count()
    }

    /// Point members of a point geometry; empty for lines and polygons.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(points) => points.clone(),
            _ => Vec::new(),
        }
    }

    /// Every line part, including polygon rings.
    pub fn lines(&self) -> Vec<&LineString> {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Vec::new(),
            Geometry::LineString(line) => vec![line],
            Geometry::MultiLineString(lines) => lines.iter().collect(),
            Geometry::Polygon(poly) => poly.rings().collect(),
            Geometry::MultiPolygon(polys) => polys.iter().flat_map(|p| p.rings()).collect(),
        }
    }

    pub fn polygons(&self) -> Vec<&Polygon> {
        match self {
            Geometry::Polygon(poly) => vec![poly],
            Geometry::MultiPolygon(polys) => polys.iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
            Point::new(x, y),
        ]
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_bbox_center_and_size() {
        let bb = BBox::from_points(&square(2.0, 4.0, 6.0)).unwrap();
        assert!((bb.width() - 6.0).abs() < 1e-10);
        assert!((bb.height() - 6.0).abs() < 1e-10);
        assert_eq!(bb.center(), Point::new(5.0, 7.0));
        assert!(BBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_polygon_with_hole_counts_all_rings() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0)).with_interior(square(2.0, 2.0, 2.0));
        assert_eq!(poly.vertex_count(), 10);
        let geom = Geometry::Polygon(poly);
        assert_eq!(geom.lines().len(), 2);
        assert_eq!(geom.geometry_type(), GeometryType::Polygon);
    }

    #[test]
    fn test_geometry_bbox() {
        let geom = Geometry::MultiPoint(vec![Point::new(-1.0, 2.0), Point::new(4.0, -3.0)]);
        let bb = geom.bbox().unwrap();
        assert!((bb.min.x + 1.0).abs() < 1e-10);
        assert!((bb.min.y + 3.0).abs() < 1e-10);
        assert!((bb.max.x - 4.0).abs() < 1e-10);
        assert!((bb.max.y - 2.0).abs() < 1e-10);
    }
}
