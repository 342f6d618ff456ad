use serde::{Deserialize, Serialize};

use veclayer_core::layer::{BlendMode, FillPattern, VertexMarkerStyle};

use crate::map_to_pixel::ScreenPoint;

/// Shape of a point marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerShape {
    Circle,
    Square,
    Triangle,
    Cross,
}

/// Low-level drawing target. Rasterization is up to the implementation.
pub trait Surface {
    fn draw_polyline(&mut self, points: &[ScreenPoint], color: [f32; 4], width: f64);

    /// Fill a polygon given as exterior ring followed by holes.
    fn fill_polygon(&mut self, rings: &[Vec<ScreenPoint>], color: [f32; 4], pattern: FillPattern);

    fn draw_marker(&mut self, at: ScreenPoint, shape: MarkerShape, color: [f32; 4], size: f64);

    fn draw_vertex_marker(&mut self, at: ScreenPoint, style: VertexMarkerStyle, size: f64);

    fn set_opacity(&mut self, opacity: f32);

    fn set_blend_mode(&mut self, mode: BlendMode);
}

/// A recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Polyline {
        /// Flat array of vertices: [x0, y0, x1, y1, ...]
        vertices: Vec<f64>,
        color: [f32; 4],
        width: f64,
    },
    Polygon {
        rings: Vec<Vec<f64>>,
        color: [f32; 4],
        pattern: FillPattern,
    },
    Marker {
        at: [f64; 2],
        shape: MarkerShape,
        color: [f32; 4],
        size: f64,
    },
    VertexMarker {
        at: [f64; 2],
        style: VertexMarkerStyle,
        size: f64,
    },
    Opacity(f32),
    Blend(BlendMode),
}

impl DrawCommand {
    /// Whether the command puts pixels on the surface (as opposed to state changes).
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DrawCommand::Opacity(_) | DrawCommand::Blend(_))
    }
}

fn flatten(points: &[ScreenPoint]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// A surface that records every command, ready to be replayed or sent to a
/// frontend canvas as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawing_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| c.is_drawing())
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Surface for RecordingSurface {
    fn draw_polyline(&mut self, points: &[ScreenPoint], color: [f32; 4], width: f64) {
        self.commands.push(DrawCommand::Polyline {
            vertices: flatten(points),
            color,
            width,
        });
    }

    fn fill_polygon(&mut self, rings: &[Vec<ScreenPoint>], color: [f32; 4], pattern: FillPattern) {
        self.commands.push(DrawCommand::Polygon {
            rings: rings.iter().map(|r| flatten(r)).collect(),
            color,
            pattern,
        });
    }

    fn draw_marker(&mut self, at: ScreenPoint, shape: MarkerShape, color: [f32; 4], size: f64) {
        self.commands.push(DrawCommand::Marker {
            at: [at.x, at.y],
            shape,
            color,
            size,
        });
    }

    fn draw_vertex_marker(&mut self, at: ScreenPoint, style: VertexMarkerStyle, size: f64) {
        self.commands.push(DrawCommand::VertexMarker {
            at: [at.x, at.y],
            style,
            size,
        });
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.commands.push(DrawCommand::Opacity(opacity));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(DrawCommand::Blend(mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_flattens_vertices() {
        let mut surface = RecordingSurface::new();
        surface.set_opacity(0.5);
        surface.draw_polyline(
            &[ScreenPoint { x: 1.0, y: 2.0 }, ScreenPoint { x: 3.0, y: 4.0 }],
            [0.0, 0.0, 0.0, 1.0],
            1.5,
        );
        assert_eq!(surface.commands.len(), 2);
        let drawn: Vec<_> = surface.drawing_commands().collect();
        assert_eq!(drawn.len(), 1);
        match drawn[0] {
            DrawCommand::Polyline { vertices, .. } => assert_eq!(vertices, &vec![1.0, 2.0, 3.0, 4.0]),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(surface.to_json().unwrap().contains("Polyline"));
    }
}
