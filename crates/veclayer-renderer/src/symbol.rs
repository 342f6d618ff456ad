//! Symbols: stacks of symbol layers (sub-symbols) drawn for a feature.
//!
//! Each symbol layer carries a rendering pass number. When a renderer draws
//! with symbol levels, all layers of pass N are drawn for every feature before
//! any layer of pass N+1.

use serde::{Deserialize, Serialize};

use veclayer_core::geometry::{Geometry, GeometryType};
use veclayer_core::layer::{Color, FillPattern, VertexMarkerStyle};

use crate::context::RenderContext;
use crate::surface::MarkerShape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolLayerKind {
    SimpleMarker {
        shape: MarkerShape,
        color: Color,
        size: f64,
    },
    SimpleLine {
        color: Color,
        width: f64,
    },
    SimpleFill {
        color: Color,
        pattern: FillPattern,
    },
}

/// One drawable component of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolLayer {
    pub kind: SymbolLayerKind,
    /// Stacking level used when rendering with symbol levels.
    pub rendering_pass: i32,
    pub enabled: bool,
}

impl SymbolLayer {
    pub fn marker(shape: MarkerShape, color: Color, size: f64) -> Self {
        Self::new(SymbolLayerKind::SimpleMarker { shape, color, size })
    }

    pub fn line(color: Color, width: f64) -> Self {
        Self::new(SymbolLayerKind::SimpleLine { color, width })
    }

    pub fn fill(color: Color, pattern: FillPattern) -> Self {
        Self::new(SymbolLayerKind::SimpleFill { color, pattern })
    }

    fn new(kind: SymbolLayerKind) -> Self {
        Self {
            kind,
            rendering_pass: 0,
            enabled: true,
        }
    }

    pub fn with_pass(mut self, pass: i32) -> Self {
        self.rendering_pass = pass;
        self
    }

    fn with_color(&self, color: Color) -> SymbolLayerKind {
        match &self.kind {
            SymbolLayerKind::SimpleMarker { shape, size, .. } => SymbolLayerKind::SimpleMarker {
                shape: *shape,
                color,
                size: *size,
            },
            SymbolLayerKind::SimpleLine { width, .. } => SymbolLayerKind::SimpleLine {
                color,
                width: *width,
            },
            SymbolLayerKind::SimpleFill { pattern, .. } => SymbolLayerKind::SimpleFill {
                color,
                pattern: *pattern,
            },
        }
    }

    /// Draw this layer for `geometry`, using the selection color if `selected`.
    pub fn render(&self, geometry: &Geometry, ctx: &mut RenderContext<'_>, selected: bool) {
        if !self.enabled {
            return;
        }
        let kind = if selected {
            self.with_color(ctx.selection_color())
        } else {
            self.kind.clone()
        };
        let m2p = *ctx.map_to_pixel();
        match kind {
            SymbolLayerKind::SimpleMarker { shape, color, size } => {
                let mut points = geometry.points();
                if points.is_empty() {
                    points.extend(geometry.bbox().map(|b| b.center()));
                }
                for p in points {
                    ctx.surface()
                        .draw_marker(m2p.transform(&p), shape, color.to_f32_array(1.0), size);
                }
            }
            SymbolLayerKind::SimpleLine { color, width } => {
                for line in geometry.lines() {
                    ctx.surface().draw_polyline(
                        &m2p.transform_all(&line.points),
                        color.to_f32_array(1.0),
                        width,
                    );
                }
            }
            SymbolLayerKind::SimpleFill { color, pattern } => {
                for poly in geometry.polygons() {
                    let rings: Vec<_> = poly.rings().map(|r| m2p.transform_all(&r.points)).collect();
                    ctx.surface()
                        .fill_polygon(&rings, color.to_f32_array(1.0), pattern);
                }
            }
        }
    }
}

/// A complete style definition for a class of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub symbol_type: GeometryType,
    pub layers: Vec<SymbolLayer>,
}

impl Symbol {
    pub fn new(symbol_type: GeometryType, layers: Vec<SymbolLayer>) -> Self {
        Self {
            symbol_type,
            layers,
        }
    }

    /// The symbol used for features of `geometry_type` when nothing else applies.
    pub fn default_for(geometry_type: GeometryType) -> Self {
        let grey = Color::default();
        let dark = Color::rgb(35, 35, 35);
        match geometry_type {
            GeometryType::Point => Self::new(
                geometry_type,
                vec![SymbolLayer::marker(MarkerShape::Circle, grey, 2.0)],
            ),
            GeometryType::Line => Self::new(geometry_type, vec![SymbolLayer::line(grey, 0.26)]),
            GeometryType::Polygon => Self::new(
                geometry_type,
                vec![
                    SymbolLayer::fill(grey, FillPattern::Solid),
                    SymbolLayer::line(dark, 0.26),
                ],
            ),
        }
    }

    /// A flat highlight symbol drawn over selected features.
    pub fn selection(geometry_type: GeometryType, color: Color) -> Self {
        let mut symbol = Self::default_for(geometry_type);
        for layer in &mut symbol.layers {
            layer.kind = layer.with_color(color);
        }
        symbol
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Draw every layer, in stacking order within the symbol.
    pub fn render(&self, geometry: &Geometry, ctx: &mut RenderContext<'_>, selected: bool) {
        for layer in &self.layers {
            layer.render(geometry, ctx, selected);
        }
    }

    /// Draw a single layer; out-of-range indices draw nothing.
    pub fn render_layer(
        &self,
        index: usize,
        geometry: &Geometry,
        ctx: &mut RenderContext<'_>,
        selected: bool,
    ) {
        match self.layers.get(index) {
            Some(layer) => layer.render(geometry, ctx, selected),
            None => log::warn!("Symbol has no layer {index}"),
        }
    }
}

/// Draw editing markers at every vertex of `geometry`.
pub fn render_vertex_markers(
    geometry: &Geometry,
    ctx: &mut RenderContext<'_>,
    style: VertexMarkerStyle,
    size: f64,
) {
    if style == VertexMarkerStyle::None {
        return;
    }
    let m2p = *ctx.map_to_pixel();
    for vertex in geometry.vertices() {
        ctx.surface()
            .draw_vertex_marker(m2p.transform(&vertex), style, size);
    }
}
