//! Symbol renderer facade.
//!
//! [`FeatureRenderer`] is the capability set a render pass needs from a
//! symbology model: classify a feature to a symbol, draw it (whole or one
//! symbol layer at a time), and report whether symbol levels are in use.
//! [`SymbologyRenderer`] implements it for single-symbol, categorized and
//! rule-based styling.

use serde::{Deserialize, Serialize};

use veclayer_core::feature::{AttributeValue, Feature, Fields};
use veclayer_core::layer::VertexMarkerStyle;

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::expression::Expression;
use crate::levels::{SymbolId, SymbolLevelOrder};
use crate::symbol::{render_vertex_markers, Symbol};

pub trait FeatureRenderer: Send {
    /// Short type name used in logs.
    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn FeatureRenderer>;

    /// Attribute names the renderer reads while classifying features.
    fn used_attributes(&self) -> Vec<String>;

    /// Prepare for a render pass. An error aborts the pass before any feature is drawn.
    fn start(&mut self, ctx: &mut RenderContext<'_>, fields: &Fields) -> Result<(), RenderError>;

    fn stop(&mut self, ctx: &mut RenderContext<'_>);

    /// Whether features must be drawn level by level.
    fn uses_levels(&self) -> bool;

    /// Whether `is_selected` is honoured with an inline highlight. Renderers
    /// returning false get selected features overdrawn by a selection renderer.
    fn supports_inline_selection(&self) -> bool {
        true
    }

    /// All symbols, indexed by [`SymbolId`].
    fn symbols(&self) -> Vec<&Symbol>;

    fn symbol_for(&self, feature: &Feature, ctx: &RenderContext<'_>) -> Option<SymbolId>;

    fn levels(&self) -> SymbolLevelOrder {
        SymbolLevelOrder::from_symbols(&self.symbols())
    }

    fn set_vertex_marker_appearance(&mut self, _style: VertexMarkerStyle, _size: f64) {}

    /// Draw the whole symbol of `feature`. Returns false if nothing could be drawn
    /// (no geometry or no matching symbol).
    fn render_feature(
        &mut self,
        feature: &Feature,
        ctx: &mut RenderContext<'_>,
        selected: bool,
        draw_vertex_marker: bool,
    ) -> bool;

    /// Draw one layer of one symbol for `feature`.
    fn render_symbol_layer(
        &mut self,
        symbol: SymbolId,
        layer: usize,
        feature: &Feature,
        ctx: &mut RenderContext<'_>,
        selected: bool,
        draw_vertex_marker: bool,
    );
}

impl Clone for Box<dyn FeatureRenderer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A categorized class: features whose attribute equals `value` get `symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub value: AttributeValue,
    pub symbol: Symbol,
    pub label: String,
}

impl Category {
    pub fn new(value: impl Into<AttributeValue>, symbol: Symbol) -> Self {
        let value = value.into();
        Self {
            label: value.to_string(),
            value,
            symbol,
        }
    }
}

/// A rule: features passing `filter` (all features if `None`) get `symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub label: String,
    pub filter: Option<Expression>,
    pub symbol: Symbol,
}

impl Rule {
    pub fn new(label: &str, filter: Option<Expression>, symbol: Symbol) -> Self {
        Self {
            label: label.to_string(),
            filter,
            symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RendererKind {
    Simple {
        symbol: Symbol,
    },
    Categorized {
        field: String,
        categories: Vec<Category>,
        /// Symbol for values matching no category.
        default_symbol: Option<Symbol>,
    },
    RuleBased {
        /// Evaluated in order; the first matching rule wins.
        rules: Vec<Rule>,
        else_symbol: Option<Symbol>,
    },
}

/// Symbology model of a vector layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbologyRenderer {
    pub kind: RendererKind,
    pub use_levels: bool,
    pub inline_selection: bool,
    vertex_style: VertexMarkerStyle,
    vertex_size: f64,
    /// Field index of the classification attribute, resolved on start.
    #[serde(skip)]
    classify_index: Option<usize>,
}

impl SymbologyRenderer {
    fn with_kind(kind: RendererKind) -> Self {
        Self {
            kind,
            use_levels: false,
            inline_selection: true,
            vertex_style: VertexMarkerStyle::default(),
            vertex_size: 3.0,
            classify_index: None,
        }
    }

    pub fn simple(symbol: Symbol) -> Self {
        Self::with_kind(RendererKind::Simple { symbol })
    }

    pub fn categorized(field: &str, categories: Vec<Category>) -> Self {
        Self::with_kind(RendererKind::Categorized {
            field: field.to_string(),
            categories,
            default_symbol: None,
        })
    }

    pub fn rule_based(rules: Vec<Rule>) -> Self {
        Self::with_kind(RendererKind::RuleBased {
            rules,
            else_symbol: None,
        })
    }

    /// Fallback symbol for categorized and rule-based renderers.
    pub fn with_default_symbol(mut self, symbol: Symbol) -> Self {
        match &mut self.kind {
            RendererKind::Simple { .. } => {}
            RendererKind::Categorized { default_symbol, .. } => *default_symbol = Some(symbol),
            RendererKind::RuleBased { else_symbol, .. } => *else_symbol = Some(symbol),
        }
        self
    }

    pub fn with_levels(mut self, use_levels: bool) -> Self {
        self.use_levels = use_levels;
        self
    }

    pub fn with_inline_selection(mut self, inline: bool) -> Self {
        self.inline_selection = inline;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn draw_markers_if(&self, feature: &Feature, ctx: &mut RenderContext<'_>, draw: bool) {
        if let (true, Some(geometry)) = (draw, feature.geometry.as_ref()) {
            render_vertex_markers(geometry, ctx, self.vertex_style, self.vertex_size);
        }
    }
}

impl FeatureRenderer for SymbologyRenderer {
    fn name(&self) -> &str {
        match self.kind {
            RendererKind::Simple { .. } => "simple",
            RendererKind::Categorized { .. } => "categorized",
            RendererKind::RuleBased { .. } => "rule-based",
        }
    }

    fn clone_box(&self) -> Box<dyn FeatureRenderer> {
        Box::new(self.clone())
    }

    fn used_attributes(&self) -> Vec<String> {
        match &self.kind {
            RendererKind::Simple { .. } => Vec::new(),
            RendererKind::Categorized { field, .. } => vec![field.clone()],
            RendererKind::RuleBased { rules, .. } => {
                let mut out: Vec<String> = Vec::new();
                for field in rules
                    .iter()
                    .filter_map(|r| r.filter.as_ref())
                    .flat_map(|f| f.referenced_fields())
                {
                    if !out.contains(&field) {
                        out.push(field);
                    }
                }
                out
            }
        }
    }

    fn start(&mut self, _ctx: &mut RenderContext<'_>, fields: &Fields) -> Result<(), RenderError> {
        match &self.kind {
            RendererKind::Categorized { field, .. } => {
                let index = fields
                    .index_of(field)
                    .ok_or_else(|| RenderError::UnknownClassificationField(field.clone()))?;
                self.classify_index = Some(index);
            }
            RendererKind::RuleBased { .. } => {
                for field in self.used_attributes() {
                    if fields.index_of(&field).is_none() {
                        log::warn!("Rule filter references unknown field '{field}'");
                    }
                }
            }
            RendererKind::Simple { .. } => {}
        }
        log::debug!("Started {} renderer ({} symbols)", self.name(), self.symbols().len());
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut RenderContext<'_>) {
        self.classify_index = None;
        log::debug!("Stopped {} renderer", self.name());
    }

    fn uses_levels(&self) -> bool {
        self.use_levels
    }

    fn supports_inline_selection(&self) -> bool {
        self.inline_selection
    }

    fn symbols(&self) -> Vec<&Symbol> {
        match &self.kind {
            RendererKind::Simple { symbol } => vec![symbol],
            RendererKind::Categorized {
                categories,
                default_symbol,
                ..
            } => categories
                .iter()
                .map(|c| &c.symbol)
                .chain(default_symbol.iter())
                .collect(),
            RendererKind::RuleBased { rules, else_symbol } => rules
                .iter()
                .map(|r| &r.symbol)
                .chain(else_symbol.iter())
                .collect(),
        }
    }

    fn symbol_for(&self, feature: &Feature, ctx: &RenderContext<'_>) -> Option<SymbolId> {
        match &self.kind {
            RendererKind::Simple { .. } => Some(0),
            RendererKind::Categorized {
                categories,
                default_symbol,
                ..
            } => {
                let value = feature.attribute(self.classify_index?);
                categories
                    .iter()
                    .position(|c| c.value.matches(value))
                    .or_else(|| default_symbol.as_ref().map(|_| categories.len()))
            }
            RendererKind::RuleBased { rules, else_symbol } => {
                let scope = ctx.expression_scope();
                rules
                    .iter()
                    .position(|r| r.filter.as_ref().map_or(true, |f| f.evaluate(scope)))
                    .or_else(|| else_symbol.as_ref().map(|_| rules.len()))
            }
        }
    }

    fn set_vertex_marker_appearance(&mut self, style: VertexMarkerStyle, size: f64) {
        self.vertex_style = style;
        self.vertex_size = size;
    }

    fn render_feature(
        &mut self,
        feature: &Feature,
        ctx: &mut RenderContext<'_>,
        selected: bool,
        draw_vertex_marker: bool,
    ) -> bool {
        let Some(geometry) = feature.geometry.as_ref() else {
            return false;
        };
        let Some(id) = self.symbol_for(feature, ctx) else {
            return false;
        };
        let highlight = selected && self.inline_selection;
        if let Some(symbol) = self.symbols().get(id) {
            symbol.render(geometry, ctx, highlight);
        }
        self.draw_markers_if(feature, ctx, draw_vertex_marker);
        true
    }

    fn render_symbol_layer(
        &mut self,
        symbol: SymbolId,
        layer: usize,
        feature: &Feature,
        ctx: &mut RenderContext<'_>,
        selected: bool,
        draw_vertex_marker: bool,
    ) {
        let Some(geometry) = feature.geometry.as_ref() else {
            return;
        };
        let highlight = selected && self.inline_selection;
        match self.symbols().get(symbol) {
            Some(sym) => sym.render_layer(layer, geometry, ctx, highlight),
            None => log::warn!("{} renderer has no symbol {symbol}", self.name()),
        }
        self.draw_markers_if(feature, ctx, draw_vertex_marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_to_pixel::MapToPixel;
    use crate::surface::RecordingSurface;
    use crate::symbol::SymbolLayer;
    use veclayer_core::feature::{Field, FieldType};
    use veclayer_core::geometry::{Geometry, GeometryType, Point};
    use veclayer_core::layer::Color;

    fn fields() -> Fields {
        Fields::new(vec![
            Field::new("kind", FieldType::Text),
            Field::new("size", FieldType::Integer),
        ])
    }

    fn marker(r: u8) -> Symbol {
        Symbol::new(
            GeometryType::Point,
            vec![SymbolLayer::marker(crate::surface::MarkerShape::Circle, Color::rgb(r, 0, 0), 2.0)],
        )
    }

    fn feature(id: i64, kind: &str, size: i64) -> Feature {
        Feature::new(
            id,
            Some(Geometry::Point(Point::new(0.0, 0.0))),
            vec![kind.into(), AttributeValue::Int(size)],
        )
    }

    #[test]
    fn test_categorized_classification() {
        let mut renderer = SymbologyRenderer::categorized(
            "kind",
            vec![Category::new("school", marker(1)), Category::new("hospital", marker(2))],
        )
        .with_default_symbol(marker(3));
        let mut surface = RecordingSurface::new();
        let mut ctx = RenderContext::new(&mut surface, MapToPixel::new(10.0, 10.0));
        renderer.start(&mut ctx, &fields()).unwrap();

        assert_eq!(renderer.symbol_for(&feature(1, "hospital", 0), &ctx), Some(1));
        assert_eq!(renderer.symbol_for(&feature(2, "park", 0), &ctx), Some(2));
        assert_eq!(renderer.used_attributes(), vec!["kind"]);
        assert_eq!(renderer.symbols().len(), 3);
    }

    #[test]
    fn test_categorized_unknown_field_refuses_start() {
        let mut renderer = SymbologyRenderer::categorized("missing", vec![]);
        let mut surface = RecordingSurface::new();
        let mut ctx = RenderContext::new(&mut surface, MapToPixel::new(10.0, 10.0));
        let err = renderer.start(&mut ctx, &fields()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownClassificationField(f) if f == "missing"));
    }

    #[test]
    fn test_rule_based_first_match_and_else() {
        let renderer = SymbologyRenderer::rule_based(vec![
            Rule::new(
                "big",
                Some(Expression::compare("size", crate::expression::CompareOp::Gt, 10i64)),
                marker(1),
            ),
            Rule::new("schools", Some(Expression::eq("kind", "school")), marker(2)),
        ])
        .with_default_symbol(marker(9));
        assert_eq!(renderer.used_attributes(), vec!["size", "kind"]);

        let mut surface = RecordingSurface::new();
        let mut ctx = RenderContext::new(&mut surface, MapToPixel::new(10.0, 10.0));
        let cases = [
            (feature(1, "school", 50), Some(0)),
            (feature(2, "school", 5), Some(1)),
            (feature(3, "park", 5), Some(2)),
        ];
        for (f, expected) in cases {
            ctx.expression_scope_mut().set_feature(&f, &fields());
            assert_eq!(renderer.symbol_for(&f, &ctx), expected, "feature {}", f.id);
        }
    }

    #[test]
    fn test_render_feature_without_match_or_geometry() {
        let mut renderer = SymbologyRenderer::categorized("kind", vec![Category::new("a", marker(1))]);
        let mut surface = RecordingSurface::new();
        {
            let mut ctx = RenderContext::new(&mut surface, MapToPixel::new(10.0, 10.0));
            renderer.start(&mut ctx, &fields()).unwrap();
            assert!(!renderer.render_feature(&feature(1, "b", 0), &mut ctx, false, false));
            let mut no_geom = feature(2, "a", 0);
            no_geom.geometry = None;
            assert!(!renderer.render_feature(&no_geom, &mut ctx, false, false));
            assert!(renderer.render_feature(&feature(3, "a", 0), &mut ctx, false, true));
            renderer.stop(&mut ctx);
        }
        // One marker plus one vertex marker for the point.
        assert_eq!(surface.commands.len(), 2);
    }

    #[test]
    fn test_renderer_json_roundtrip() {
        let renderer = SymbologyRenderer::simple(marker(5)).with_levels(true);
        let json = renderer.to_json().unwrap();
        let restored = SymbologyRenderer::from_json(&json).unwrap();
        assert_eq!(restored, renderer);
        assert!(restored.uses_levels());
    }
}
