//! Render pass orchestration for one vector layer.
//!
//! A [`VectorLayerRenderer`] is built per pass from a [`VectorLayer`] snapshot.
//! It computes the attributes the pass needs, opens the feature stream, starts
//! the symbol renderer, draws every feature (directly or level by level),
//! feeds labeling and diagrams, and always stops the renderer once started.

use std::sync::Arc;

use veclayer_core::cache::GeometryCache;
use veclayer_core::feature::{Feature, FeatureIds, Fields};
use veclayer_core::geometry::GeometryType;
use veclayer_core::layer::{
    BlendMode, DiagramSettings, LabelingSettings, LayerId, LayerRenderSettings,
    UnmatchedFeaturePolicy, VertexMarkerStyle,
};
use veclayer_core::simplify::simplify_geometry;
use veclayer_core::source::{FeatureIterator, FeatureRequest, FeatureSource, SimplifyRequest};

use crate::attributes::AttributeRequirements;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::labeling::LabelingEngine;
use crate::levels::LevelBuffer;
use crate::renderer::{FeatureRenderer, SymbologyRenderer};
use crate::state::{RenderOutcome, RenderPassState};
use crate::symbol::Symbol;
use crate::vector_layer::VectorLayer;

/// Counters collected during a pass, for logging and inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub features_read: usize,
    pub features_drawn: usize,
    pub skipped_without_geometry: usize,
    pub unmatched: usize,
    pub registered_for_labeling: usize,
}

/// How the feature stream ended.
enum StreamEnd {
    Exhausted,
    Cancelled,
}

/// Renderers started for the pass; held outside `self` while streaming.
struct PassRenderers {
    primary: Box<dyn FeatureRenderer>,
    selection: Option<Box<dyn FeatureRenderer>>,
}

pub struct VectorLayerRenderer<'a, 's> {
    context: &'a mut RenderContext<'s>,
    layer_id: LayerId,
    layer_name: String,
    geometry_type: GeometryType,
    fields: Fields,
    selected: FeatureIds,
    source: Arc<dyn FeatureSource>,
    renderer: Option<Box<dyn FeatureRenderer>>,
    labeling: Option<LabelingSettings>,
    diagrams: Option<DiagramSettings>,
    settings: LayerRenderSettings,
    cache: Option<&'a GeometryCache>,
    labeling_engine: Option<&'a mut dyn LabelingEngine>,
    state: RenderPassState,
    requirements: AttributeRequirements,
    local_simplify: Option<SimplifyRequest>,
    composition_applied: bool,
    stats: RenderStats,
}

impl<'a, 's> VectorLayerRenderer<'a, 's> {
    /// Snapshot `layer` for one pass drawing into `context`.
    pub fn new(layer: &VectorLayer, context: &'a mut RenderContext<'s>) -> Self {
        Self {
            context,
            layer_id: layer.id,
            layer_name: layer.name.clone(),
            geometry_type: layer.geometry_type,
            fields: layer.fields().clone(),
            selected: layer.selected_ids().clone(),
            source: Arc::clone(layer.source()),
            renderer: layer.renderer().map(|r| r.clone_box()),
            labeling: layer.labeling.clone(),
            diagrams: layer.diagrams.clone(),
            settings: layer.settings.clone(),
            cache: None,
            labeling_engine: None,
            state: RenderPassState::Idle,
            requirements: AttributeRequirements::default(),
            local_simplify: None,
            composition_applied: false,
            stats: RenderStats::default(),
        }
    }

    /// Record drawn geometries into `cache`. The cache is borrowed, never cleared.
    pub fn set_geometry_cache(&mut self, cache: &'a GeometryCache) {
        self.cache = Some(cache);
    }

    pub fn set_labeling_engine(&mut self, engine: &'a mut dyn LabelingEngine) {
        self.labeling_engine = Some(engine);
    }

    pub fn state(&self) -> RenderPassState {
        self.state
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn requirements(&self) -> &AttributeRequirements {
        &self.requirements
    }

    /// Run the pass. A renderer can only be run once.
    pub fn render(&mut self) -> RenderOutcome {
        if self.state != RenderPassState::Idle {
            log::warn!(
                "Layer '{}': render pass already ran ({:?})",
                self.layer_name,
                self.state
            );
            return RenderOutcome::Failed;
        }
        self.transition(RenderPassState::Preparing);

        let Some(primary) = self.renderer.take() else {
            log::error!("Layer '{}': {}", self.layer_name, RenderError::NoRenderer);
            self.transition(RenderPassState::Failed);
            return RenderOutcome::Failed;
        };
        let mut renderers = PassRenderers {
            primary,
            selection: None,
        };
        let outcome = self.run(&mut renderers);
        self.renderer = Some(renderers.primary);
        outcome
    }

    fn run(&mut self, renderers: &mut PassRenderers) -> RenderOutcome {
        let source = Arc::clone(&self.source);
        let features = match self.prepare(source.as_ref(), renderers) {
            Ok(features) => features,
            Err(err) => {
                log::error!("Layer '{}': render preparation failed: {err}", self.layer_name);
                self.transition(RenderPassState::Failed);
                return RenderOutcome::Failed;
            }
        };

        let use_levels = renderers.primary.uses_levels();
        self.transition(RenderPassState::Streaming);
        let streamed = if use_levels {
            self.draw_levels(features, renderers)
        } else {
            self.draw_direct(features, renderers)
        };

        self.transition(RenderPassState::Finalizing);
        self.stop_renderers(renderers);

        let outcome = match streamed {
            Ok(StreamEnd::Exhausted) => RenderOutcome::Completed,
            Ok(StreamEnd::Cancelled) => {
                log::info!("Layer '{}': rendering cancelled", self.layer_name);
                RenderOutcome::Cancelled
            }
            Err(err) => {
                log::error!("Layer '{}': rendering failed: {err}", self.layer_name);
                RenderOutcome::Failed
            }
        };
        self.transition(outcome.state());
        log::debug!("Layer '{}': {:?} {:?}", self.layer_name, outcome, self.stats);
        outcome
    }

    /// Compute attributes, open the stream and start the renderers. On error
    /// nothing is left started.
    fn prepare<'src>(
        &mut self,
        source: &'src dyn FeatureSource,
        renderers: &mut PassRenderers,
    ) -> Result<FeatureIterator<'src>, RenderError> {
        let has_engine = self.labeling_engine.is_some();
        self.requirements = AttributeRequirements::compute(
            &self.fields,
            renderers.primary.as_ref(),
            self.labeling.as_ref().filter(|_| has_engine),
            self.diagrams.as_ref().filter(|_| has_engine),
        );

        let mut request = FeatureRequest::new().with_attributes(self.requirements.indices.clone());
        if let Some(extent) = self.context.extent() {
            request = request.with_filter_rect(extent);
        }
        let simplify = self.settings.simplify;
        if simplify.simplifies_geometry() {
            let tolerance = simplify.threshold * self.context.map_to_pixel().map_units_per_pixel;
            let simplify_request = SimplifyRequest {
                algorithm: simplify.algorithm,
                tolerance,
            };
            if !simplify.force_local && source.supports_simplification() {
                request = request.with_simplify(simplify_request);
            } else {
                self.local_simplify = Some(simplify_request);
            }
        }
        let features = source.get_features(&request)?;

        let markers = self.settings.vertex_markers;
        renderers
            .primary
            .set_vertex_marker_appearance(markers.style, markers.size);
        renderers.primary.start(self.context, &self.fields)?;

        if !renderers.primary.supports_inline_selection() && !self.selected.is_empty() {
            let symbol = Symbol::selection(self.geometry_type, self.context.selection_color());
            let mut selection: Box<dyn FeatureRenderer> = Box::new(SymbologyRenderer::simple(symbol));
            if let Err(err) = selection.start(self.context, &self.fields) {
                renderers.primary.stop(self.context);
                return Err(err);
            }
            renderers.selection = Some(selection);
        }

        self.prepare_labeling();
        self.prepare_diagrams();
        self.apply_composition();
        Ok(features)
    }

    fn prepare_labeling(&mut self) {
        if !self.requirements.labeling {
            return;
        }
        if let (Some(engine), Some(settings)) =
            (self.labeling_engine.as_deref_mut(), self.labeling.as_ref())
        {
            engine.prepare_layer(self.layer_id, settings, self.context);
        }
    }

    fn prepare_diagrams(&mut self) {
        if !self.requirements.diagrams {
            return;
        }
        if let (Some(engine), Some(settings)) =
            (self.labeling_engine.as_deref_mut(), self.diagrams.as_ref())
        {
            engine.prepare_diagram_layer(self.layer_id, settings, self.context);
        }
    }

    fn apply_composition(&mut self) {
        let opacity = self.settings.opacity();
        let mode = self.settings.blend_mode;
        if opacity < 1.0 || mode != BlendMode::SourceOver {
            let surface = self.context.surface();
            surface.set_opacity(opacity);
            surface.set_blend_mode(mode);
            self.composition_applied = true;
        }
    }

    fn reset_composition(&mut self) {
        if self.composition_applied {
            let surface = self.context.surface();
            surface.set_opacity(1.0);
            surface.set_blend_mode(BlendMode::SourceOver);
            self.composition_applied = false;
        }
    }

    /// Draw features in stream order.
    fn draw_direct(
        &mut self,
        mut features: FeatureIterator<'_>,
        renderers: &mut PassRenderers,
    ) -> Result<StreamEnd, RenderError> {
        let markers = self.vertex_markers_enabled();
        loop {
            if self.context.rendering_stopped() {
                return Ok(StreamEnd::Cancelled);
            }
            let Some(next) = features.next() else {
                break;
            };
            let mut feature = next?;
            let selected = self.begin_feature(&mut feature);

            if feature.has_geometry() {
                self.cache_geometry(&feature);
                let marker = markers && self.marker_wanted(selected);
                if renderers
                    .primary
                    .render_feature(&feature, self.context, selected, marker)
                {
                    self.stats.features_drawn += 1;
                } else {
                    self.draw_unmatched(&feature, selected);
                }
                if let (true, Some(selection)) = (selected, renderers.selection.as_mut()) {
                    selection.render_feature(&feature, self.context, true, false);
                }
            } else {
                self.skip_without_geometry(&feature);
            }

            self.register_for_labeling(&feature);
        }
        Ok(StreamEnd::Exhausted)
    }

    /// Buffer the whole stream by symbol, then draw symbol layers level by level.
    fn draw_levels(
        &mut self,
        mut features: FeatureIterator<'_>,
        renderers: &mut PassRenderers,
    ) -> Result<StreamEnd, RenderError> {
        let mut buffer = LevelBuffer::default();
        let mut unmatched: Vec<(Feature, bool)> = Vec::new();

        loop {
            if self.context.rendering_stopped() {
                return Ok(StreamEnd::Cancelled);
            }
            let Some(next) = features.next() else {
                break;
            };
            let mut feature = next?;
            let selected = self.begin_feature(&mut feature);
            self.register_for_labeling(&feature);

            if !feature.has_geometry() {
                self.skip_without_geometry(&feature);
                continue;
            }
            self.cache_geometry(&feature);
            match renderers.primary.symbol_for(&feature, self.context) {
                Some(symbol) => buffer.push(symbol, feature, selected),
                None => unmatched.push((feature, selected)),
            }
        }
        log::debug!(
            "Layer '{}': {} features buffered for symbol levels",
            self.layer_name,
            buffer.len()
        );

        let order = renderers.primary.levels();
        let markers = self.vertex_markers_enabled();
        let mut drawn = vec![false; buffer.len()];
        for (level, items) in order.iter() {
            for item in items {
                // Markers go with the topmost layer of each feature's own symbol.
                let marker_level = markers && order.last_level_of(item.symbol) == Some(level);
                for (index, record) in buffer.records_for(item.symbol) {
                    if self.context.rendering_stopped() {
                        return Ok(StreamEnd::Cancelled);
                    }
                    self.context
                        .expression_scope_mut()
                        .set_feature(&record.feature, &self.fields);
                    let marker = marker_level && self.marker_wanted(record.selected);
                    renderers.primary.render_symbol_layer(
                        item.symbol,
                        item.layer,
                        &record.feature,
                        self.context,
                        record.selected,
                        marker,
                    );
                    if !drawn[index] {
                        drawn[index] = true;
                        self.stats.features_drawn += 1;
                    }
                }
            }
        }

        if let Some(selection) = renderers.selection.as_mut() {
            for record in buffer.records().filter(|r| r.selected) {
                selection.render_feature(&record.feature, self.context, true, false);
            }
        }
        for (feature, selected) in &unmatched {
            self.draw_unmatched(feature, *selected);
        }
        Ok(StreamEnd::Exhausted)
    }

    /// Per-feature bookkeeping shared by both modes. Returns the selection flag.
    fn begin_feature(&mut self, feature: &mut Feature) -> bool {
        self.stats.features_read += 1;
        if let Some(s) = self.local_simplify {
            feature.geometry = feature
                .geometry
                .take()
                .map(|g| simplify_geometry(&g, s.algorithm, s.tolerance));
        }
        self.context
            .expression_scope_mut()
            .set_feature(feature, &self.fields);
        self.selected.contains(&feature.id)
    }

    fn skip_without_geometry(&mut self, feature: &Feature) {
        log::debug!(
            "Layer '{}': feature {} has no geometry, not drawn",
            self.layer_name,
            feature.id
        );
        self.stats.skipped_without_geometry += 1;
    }

    fn cache_geometry(&self, feature: &Feature) {
        if let (Some(cache), Some(geometry)) = (self.cache, feature.geometry.as_ref()) {
            cache.insert(feature.id, geometry.clone());
        }
    }

    fn draw_unmatched(&mut self, feature: &Feature, selected: bool) {
        self.stats.unmatched += 1;
        if self.settings.unmatched != UnmatchedFeaturePolicy::DrawDefault {
            return;
        }
        if let Some(geometry) = feature.geometry.as_ref() {
            Symbol::default_for(geometry.geometry_type()).render(geometry, self.context, selected);
            self.stats.features_drawn += 1;
        }
    }

    fn register_for_labeling(&mut self, feature: &Feature) {
        if !feature.has_geometry() && !self.settings.label_attribute_only_features {
            return;
        }
        let Some(engine) = self.labeling_engine.as_deref_mut() else {
            return;
        };
        if self.requirements.labeling {
            engine.register_feature(self.layer_id, feature, self.context);
        }
        if self.requirements.diagrams {
            engine.register_diagram_feature(self.layer_id, feature, self.context);
        }
        if self.requirements.labeling || self.requirements.diagrams {
            self.stats.registered_for_labeling += 1;
        }
    }

    fn vertex_markers_enabled(&self) -> bool {
        let markers = self.settings.vertex_markers;
        markers.enabled
            && markers.style != VertexMarkerStyle::None
            && self.context.draw_editing_information()
    }

    fn marker_wanted(&self, selected: bool) -> bool {
        !self.settings.vertex_markers.only_for_selection || selected
    }

    fn stop_renderers(&mut self, renderers: &mut PassRenderers) {
        renderers.primary.stop(self.context);
        if let Some(selection) = renderers.selection.as_mut() {
            selection.stop(self.context);
        }
        self.reset_composition();
        self.context.expression_scope_mut().clear();
    }

    fn transition(&mut self, next: RenderPassState) {
        if !self.state.can_transition_to(next) {
            log::warn!(
                "Layer '{}': invalid render state transition {:?} -> {:?}",
                self.layer_name,
                self.state,
                next
            );
            return;
        }
        log::debug!("Layer '{}': {:?} -> {:?}", self.layer_name, self.state, next);
        self.state = next;
    }
}
