use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use veclayer_core::feature::{AttributeValue, Feature, FeatureId, Fields};
use veclayer_core::geometry::BBox;
use veclayer_core::layer::Color;

use crate::map_to_pixel::MapToPixel;
use crate::surface::Surface;

/// Cancellation flag shared between a render pass and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Variables visible to symbology expressions while a feature is processed.
#[derive(Debug, Clone, Default)]
pub struct ExpressionScope {
    feature_id: Option<FeatureId>,
    has_geometry: bool,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the scope to `feature`, exposing its attributes by field name.
    pub fn set_feature(&mut self, feature: &Feature, fields: &Fields) {
        self.feature_id = Some(feature.id);
        self.has_geometry = feature.has_geometry();
        self.values.clear();
        for (index, name) in fields.names().enumerate() {
            self.values
                .insert(name.to_string(), feature.attribute(index).clone());
        }
    }

    pub fn clear(&mut self) {
        self.feature_id = None;
        self.has_geometry = false;
        self.values.clear();
    }

    pub fn feature_id(&self) -> Option<FeatureId> {
        self.feature_id
    }

    pub fn has_geometry(&self) -> bool {
        self.has_geometry
    }

    /// Value of a field for the current feature; unknown names read as `Null`.
    pub fn value(&self, name: &str) -> &AttributeValue {
        static NULL: AttributeValue = AttributeValue::Null;
        self.values.get(name).unwrap_or(&NULL)
    }
}

/// Shared mutable state of a map render: target surface, transform,
/// cancellation and expression scope.
pub struct RenderContext<'s> {
    surface: &'s mut dyn Surface,
    map_to_pixel: MapToPixel,
    extent: Option<BBox>,
    cancel: CancellationToken,
    expression_scope: ExpressionScope,
    selection_color: Color,
    draw_editing_information: bool,
}

impl<'s> RenderContext<'s> {
    pub fn new(surface: &'s mut dyn Surface, map_to_pixel: MapToPixel) -> Self {
        Self {
            surface,
            map_to_pixel,
            extent: None,
            cancel: CancellationToken::new(),
            expression_scope: ExpressionScope::new(),
            selection_color: Color::SELECTION,
            draw_editing_information: false,
        }
    }

    pub fn with_extent(mut self, extent: BBox) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    pub fn with_editing_information(mut self, draw: bool) -> Self {
        self.draw_editing_information = draw;
        self
    }

    pub fn surface(&mut self) -> &mut dyn Surface {
        &mut *self.surface
    }

    pub fn map_to_pixel(&self) -> &MapToPixel {
        &self.map_to_pixel
    }

    /// Extent to fetch features for; `None` renders everything.
    pub fn extent(&self) -> Option<BBox> {
        self.extent
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn rendering_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn expression_scope(&self) -> &ExpressionScope {
        &self.expression_scope
    }

    pub fn expression_scope_mut(&mut self) -> &mut ExpressionScope {
        &mut self.expression_scope
    }

    pub fn selection_color(&self) -> Color {
        self.selection_color
    }

    pub fn draw_editing_information(&self) -> bool {
        self.draw_editing_information
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use veclayer_core::feature::{Field, FieldType};

    #[test]
    fn test_cancellation_is_shared() {
        let mut surface = RecordingSurface::new();
        let token = CancellationToken::new();
        let ctx = RenderContext::new(&mut surface, MapToPixel::new(10.0, 10.0))
            .with_cancellation(token.clone());
        assert!(!ctx.rendering_stopped());
        let remote = ctx.cancellation_token();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
        assert!(ctx.rendering_stopped());
    }

    #[test]
    fn test_scope_binds_feature() {
        let fields = Fields::new(vec![
            Field::new("kind", FieldType::Text),
            Field::new("width", FieldType::Double),
        ]);
        let feature = Feature::new(9, None, vec!["road".into(), AttributeValue::Double(7.5)]);
        let mut scope = ExpressionScope::new();
        scope.set_feature(&feature, &fields);
        assert_eq!(scope.feature_id(), Some(9));
        assert!(!scope.has_geometry());
        assert_eq!(scope.value("kind"), &AttributeValue::Text("road".into()));
        assert!(scope.value("nope").is_null());
        scope.clear();
        assert!(scope.value("kind").is_null());
    }
}
