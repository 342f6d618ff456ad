use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::simplify::SimplifyMethod;

/// Unique layer identifier.
pub type LayerId = Uuid;

/// RGBA color used by symbols and highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 128,
            g: 128,
            b: 128,
            a: 255,
        }
    }
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// The default selection highlight (yellow).
    pub const SELECTION: Color = Color::rgb(255, 255, 0);

    pub fn with_alpha(mut self, a: u8) -> Self {
        self.a = a;
        self
    }

    /// Normalized RGBA, with the alpha channel scaled by `opacity`.
    pub fn to_f32_array(&self, opacity: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0 * opacity,
        ]
    }
}

/// Fill pattern for polygon symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPattern {
    Solid,
    Hatched,
    CrossHatched,
    Dotted,
    NoFill,
}

/// Composition mode used when drawing a layer's features onto the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

/// Shape of the editing markers drawn at geometry vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexMarkerStyle {
    None,
    Cross,
    #[default]
    SemiTransparentCircle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexMarkerSettings {
    pub enabled: bool,
    /// Draw markers only on selected features.
    pub only_for_selection: bool,
    pub style: VertexMarkerStyle,
    /// Marker size in pixels.
    pub size: f64,
}

impl Default for VertexMarkerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            only_for_selection: false,
            style: VertexMarkerStyle::default(),
            size: 3.0,
        }
    }
}

/// What to do with features the symbol renderer cannot classify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnmatchedFeaturePolicy {
    #[default]
    Skip,
    /// Draw with the default symbol for the layer's geometry type.
    DrawDefault,
}

/// Layer-level labeling configuration handed to the labeling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelingSettings {
    pub enabled: bool,
    pub label_field: String,
    /// Fields feeding data-defined label properties (size, rotation, ...).
    pub data_defined_fields: Vec<String>,
}

impl LabelingSettings {
    pub fn new(label_field: &str) -> Self {
        Self {
            enabled: true,
            label_field: label_field.to_string(),
            data_defined_fields: Vec::new(),
        }
    }

    pub fn with_data_defined_field(mut self, field: &str) -> Self {
        self.data_defined_fields.push(field.to_string());
        self
    }

    pub fn required_fields(&self) -> Vec<String> {
        std::iter::once(&self.label_field)
            .chain(self.data_defined_fields.iter())
            .cloned()
            .collect()
    }
}

/// Layer-level diagram configuration handed to the diagram engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSettings {
    pub enabled: bool,
    pub attributes: Vec<String>,
    /// Data-defined placement columns.
    pub x_position_field: Option<String>,
    pub y_position_field: Option<String>,
}

impl DiagramSettings {
    pub fn new(attributes: &[&str]) -> Self {
        Self {
            enabled: true,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            x_position_field: None,
            y_position_field: None,
        }
    }

    pub fn with_position_fields(mut self, x: &str, y: &str) -> Self {
        self.x_position_field = Some(x.to_string());
        self.y_position_field = Some(y.to_string());
        self
    }

    pub fn required_fields(&self) -> Vec<String> {
        self.attributes
            .iter()
            .chain(self.x_position_field.iter())
            .chain(self.y_position_field.iter())
            .cloned()
            .collect()
    }
}

/// Render configuration snapshot of a vector layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRenderSettings {
    /// Layer transparency in percent (0 = opaque, 100 = invisible).
    pub transparency: u8,
    pub blend_mode: BlendMode,
    pub simplify: SimplifyMethod,
    pub vertex_markers: VertexMarkerSettings,
    pub unmatched: UnmatchedFeaturePolicy,
    /// Offer geometry-less features to labeling and diagrams.
    pub label_attribute_only_features: bool,
}

impl Default for LayerRenderSettings {
    fn default() -> Self {
        Self {
            transparency: 0,
            blend_mode: BlendMode::SourceOver,
            simplify: SimplifyMethod::default(),
            vertex_markers: VertexMarkerSettings::default(),
            unmatched: UnmatchedFeaturePolicy::Skip,
            label_attribute_only_features: true,
        }
    }
}

impl LayerRenderSettings {
    pub fn with_transparency(mut self, transparency: u8) -> Self {
        self.transparency = transparency.min(100);
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn with_simplify(mut self, simplify: SimplifyMethod) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn with_vertex_markers(mut self, markers: VertexMarkerSettings) -> Self {
        self.vertex_markers = markers;
        self
    }

    pub fn with_unmatched(mut self, policy: UnmatchedFeaturePolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Surface opacity derived from the layer transparency.
    pub fn opacity(&self) -> f32 {
        1.0 - f32::from(self.transparency.min(100)) / 100.0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplify::SimplifyAlgorithm;

    #[test]
    fn test_opacity_from_transparency() {
        let settings = LayerRenderSettings::default().with_transparency(25);
        assert!((settings.opacity() - 0.75).abs() < 1e-6);
        let clamped = LayerRenderSettings::default().with_transparency(250);
        assert_eq!(clamped.transparency, 100);
        assert!(clamped.opacity().abs() < 1e-6);
    }

    #[test]
    fn test_settings_json_roundtrip() {
        let settings = LayerRenderSettings::default()
            .with_blend_mode(BlendMode::Multiply)
            .with_simplify(SimplifyMethod::geometry(SimplifyAlgorithm::SnapToGrid, 2.0))
            .with_unmatched(UnmatchedFeaturePolicy::DrawDefault);
        let json = settings.to_json().unwrap();
        let restored = LayerRenderSettings::from_json(&json).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_diagram_required_fields_include_positions() {
        let diagrams = DiagramSettings::new(&["pop_2000", "pop_2010"]).with_position_fields("dx", "dy");
        assert_eq!(
            diagrams.required_fields(),
            vec!["pop_2000", "pop_2010", "dx", "dy"]
        );
    }

    #[test]
    fn test_labeling_required_fields() {
        let labeling = LabelingSettings::new("name").with_data_defined_field("label_size");
        assert_eq!(labeling.required_fields(), vec!["name", "label_size"]);
    }
}
