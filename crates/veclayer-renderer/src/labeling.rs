use veclayer_core::feature::Feature;
use veclayer_core::layer::{DiagramSettings, LabelingSettings, LayerId};

use crate::context::RenderContext;

/// Label and diagram placement engine fed by render passes.
///
/// Layers are registered once per pass before streaming starts; features are
/// registered as they are read. A feature may arrive without geometry when the
/// layer offers attribute-only features; placement that needs geometry should
/// skip those.
pub trait LabelingEngine {
    fn prepare_layer(&mut self, layer: LayerId, settings: &LabelingSettings, ctx: &RenderContext<'_>);

    fn prepare_diagram_layer(
        &mut self,
        layer: LayerId,
        settings: &DiagramSettings,
        ctx: &RenderContext<'_>,
    );

    fn register_feature(&mut self, layer: LayerId, feature: &Feature, ctx: &RenderContext<'_>);

    fn register_diagram_feature(&mut self, layer: LayerId, feature: &Feature, ctx: &RenderContext<'_>);
}
