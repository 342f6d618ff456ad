use std::sync::Arc;

use uuid::Uuid;

use veclayer_core::feature::{FeatureId, FeatureIds, Fields};
use veclayer_core::geometry::GeometryType;
use veclayer_core::layer::{DiagramSettings, LabelingSettings, LayerId, LayerRenderSettings};
use veclayer_core::source::FeatureSource;

use crate::renderer::FeatureRenderer;

/// A renderable vector layer: data source, symbology, selection and settings.
pub struct VectorLayer {
    pub id: LayerId,
    pub name: String,
    pub geometry_type: GeometryType,
    source: Arc<dyn FeatureSource>,
    renderer: Option<Box<dyn FeatureRenderer>>,
    selected: FeatureIds,
    pub labeling: Option<LabelingSettings>,
    pub diagrams: Option<DiagramSettings>,
    pub settings: LayerRenderSettings,
}

impl VectorLayer {
    pub fn new(name: &str, geometry_type: GeometryType, source: Arc<dyn FeatureSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            geometry_type,
            source,
            renderer: None,
            selected: FeatureIds::new(),
            labeling: None,
            diagrams: None,
            settings: LayerRenderSettings::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn FeatureRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_labeling(mut self, labeling: LabelingSettings) -> Self {
        self.labeling = Some(labeling);
        self
    }

    pub fn with_diagrams(mut self, diagrams: DiagramSettings) -> Self {
        self.diagrams = Some(diagrams);
        self
    }

    pub fn with_settings(mut self, settings: LayerRenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn set_renderer(&mut self, renderer: Option<Box<dyn FeatureRenderer>>) {
        self.renderer = renderer;
    }

    pub fn renderer(&self) -> Option<&dyn FeatureRenderer> {
        self.renderer.as_deref()
    }

    pub fn source(&self) -> &Arc<dyn FeatureSource> {
        &self.source
    }

    pub fn fields(&self) -> &Fields {
        self.source.fields()
    }

    pub fn select(&mut self, ids: impl IntoIterator<Item = FeatureId>) {
        self.selected.extend(ids);
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn selected_ids(&self) -> &FeatureIds {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::SymbologyRenderer;
    use crate::symbol::Symbol;
    use veclayer_core::feature::{Field, FieldType};
    use veclayer_core::source::MemoryFeatureSource;

    #[test]
    fn test_layer_selection_and_renderer() {
        let source = Arc::new(MemoryFeatureSource::new(
            Fields::new(vec![Field::new("name", FieldType::Text)]),
            Vec::new(),
        ));
        let mut layer = VectorLayer::new("towns", GeometryType::Point, source).with_renderer(
            Box::new(SymbologyRenderer::simple(Symbol::default_for(GeometryType::Point))),
        );
        layer.select([3, 5, 3]);
        assert_eq!(layer.selected_ids().len(), 2);
        assert_eq!(layer.renderer().map(|r| r.name()), Some("simple"));
        assert_eq!(layer.fields().len(), 1);
        layer.deselect_all();
        assert!(layer.selected_ids().is_empty());
    }
}
