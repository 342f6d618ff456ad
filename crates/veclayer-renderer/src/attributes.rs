use veclayer_core::feature::Fields;
use veclayer_core::layer::{DiagramSettings, LabelingSettings};

use crate::renderer::FeatureRenderer;

/// Attributes a render pass must fetch, and which registrars are active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRequirements {
    /// Deduplicated names: renderer fields, then labeling, then diagrams.
    pub names: Vec<String>,
    /// Field indices of `names` that exist in the layer.
    pub indices: Vec<usize>,
    pub labeling: bool,
    pub diagrams: bool,
}

impl AttributeRequirements {
    /// Collect the attributes needed by the renderer and the optional labeling
    /// and diagram configurations. Disabled or absent configurations add nothing.
    pub fn compute(
        fields: &Fields,
        renderer: &dyn FeatureRenderer,
        labeling: Option<&LabelingSettings>,
        diagrams: Option<&DiagramSettings>,
    ) -> Self {
        let labeling = labeling.filter(|l| l.enabled);
        let diagrams = diagrams.filter(|d| d.enabled);

        let mut names: Vec<String> = Vec::new();
        let sources = renderer
            .used_attributes()
            .into_iter()
            .chain(labeling.map(|l| l.required_fields()).unwrap_or_default())
            .chain(diagrams.map(|d| d.required_fields()).unwrap_or_default());
        for name in sources {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let indices = names
            .iter()
            .filter_map(|name| {
                let index = fields.index_of(name);
                if index.is_none() {
                    log::warn!("Required attribute '{name}' is not a layer field; skipped");
                }
                index
            })
            .collect();

        Self {
            names,
            indices,
            labeling: labeling.is_some(),
            diagrams: diagrams.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Category, SymbologyRenderer};
    use crate::symbol::Symbol;
    use veclayer_core::feature::{Field, FieldType};
    use veclayer_core::geometry::GeometryType;

    fn fields() -> Fields {
        Fields::new(vec![
            Field::new("name", FieldType::Text),
            Field::new("type", FieldType::Text),
            Field::new("pop", FieldType::Integer),
            Field::new("x", FieldType::Double),
            Field::new("y", FieldType::Double),
        ])
    }

    fn renderer() -> SymbologyRenderer {
        SymbologyRenderer::categorized(
            "type",
            vec![Category::new("city", Symbol::default_for(GeometryType::Point))],
        )
    }

    #[test]
    fn test_order_and_deduplication() {
        let labeling = LabelingSettings::new("name").with_data_defined_field("type");
        let diagrams = DiagramSettings::new(&["pop", "name"]).with_position_fields("x", "y");
        let req = AttributeRequirements::compute(&fields(), &renderer(), Some(&labeling), Some(&diagrams));
        assert_eq!(req.names, vec!["type", "name", "pop", "x", "y"]);
        assert_eq!(req.indices, vec![1, 0, 2, 3, 4]);
        assert!(req.labeling);
        assert!(req.diagrams);
    }

    #[test]
    fn test_absent_configs_contribute_nothing() {
        let req = AttributeRequirements::compute(&fields(), &renderer(), None, None);
        assert_eq!(req.names, vec!["type"]);
        assert!(!req.labeling);
        assert!(!req.diagrams);

        let mut disabled = LabelingSettings::new("name");
        disabled.enabled = false;
        let req = AttributeRequirements::compute(&fields(), &renderer(), Some(&disabled), None);
        assert_eq!(req.names, vec!["type"]);
        assert!(!req.labeling);
    }

    #[test]
    fn test_unknown_names_not_indexed() {
        let labeling = LabelingSettings::new("label_text");
        let req = AttributeRequirements::compute(&fields(), &renderer(), Some(&labeling), None);
        assert_eq!(req.names, vec!["type", "label_text"]);
        assert_eq!(req.indices, vec![1]);
    }

    #[test]
    fn test_idempotent() {
        let labeling = LabelingSettings::new("name");
        let diagrams = DiagramSettings::new(&["pop"]);
        let a = AttributeRequirements::compute(&fields(), &renderer(), Some(&labeling), Some(&diagrams));
        let b = AttributeRequirements::compute(&fields(), &renderer(), Some(&labeling), Some(&diagrams));
        assert_eq!(a, b);
    }
}
