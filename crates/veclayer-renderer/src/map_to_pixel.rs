use serde::{Deserialize, Serialize};

use veclayer_core::geometry::{BBox, Point};

/// A position on the output surface, in pixels (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Transform between map coordinates and surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapToPixel {
    /// Map coordinate at the center of the surface.
    pub center_x: f64,
    pub center_y: f64,
    /// Map units covered by one pixel.
    pub map_units_per_pixel: f64,
    /// Surface size in pixels.
    pub width: f64,
    pub height: f64,
}

impl MapToPixel {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            map_units_per_pixel: 1.0,
            width,
            height,
        }
    }

    /// A transform showing `extent` in a `width` x `height` surface.
    pub fn fit_extent(extent: &BBox, width: f64, height: f64) -> Self {
        let mut m = Self::new(width, height);
        let center = extent.center();
        m.center_x = center.x;
        m.center_y = center.y;
        if extent.width() > 0.0 && extent.height() > 0.0 {
            m.map_units_per_pixel = (extent.width() / width).max(extent.height() / height);
        }
        m
    }

    pub fn transform(&self, p: &Point) -> ScreenPoint {
        ScreenPoint {
            x: (p.x - self.center_x) / self.map_units_per_pixel + self.width / 2.0,
            y: self.height / 2.0 - (p.y - self.center_y) / self.map_units_per_pixel,
        }
    }

    pub fn transform_all(&self, points: &[Point]) -> Vec<ScreenPoint> {
        points.iter().map(|p| self.transform(p)).collect()
    }

    pub fn to_map(&self, s: ScreenPoint) -> Point {
        Point::new(
            (s.x - self.width / 2.0) * self.map_units_per_pixel + self.center_x,
            (self.height / 2.0 - s.y) * self.map_units_per_pixel + self.center_y,
        )
    }

    /// Map extent covered by the surface.
    pub fn visible_extent(&self) -> BBox {
        let half_w = self.width * self.map_units_per_pixel / 2.0;
        let half_h = self.height * self.map_units_per_pixel / 2.0;
        BBox::new(
            Point::new(self.center_x - half_w, self.center_y - half_h),
            Point::new(self.center_x + half_w, self.center_y + half_h),
        )
    }
}
