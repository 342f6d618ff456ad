//! Feature source adapter: the boundary between a render pass and the data provider.

use thiserror::Error;

use crate::feature::{Feature, Fields};
use crate::geometry::BBox;
use crate::simplify::{simplify_geometry, SimplifyAlgorithm};
use crate::spatial::{SpatialEntry, SpatialIndex};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Attribute index {index} out of range ({count} fields)")]
    InvalidAttribute { index: usize, count: usize },

    #[error("Data provider error: {0}")]
    Provider(String),
}

/// Simplification a source is asked to apply while reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyRequest {
    pub algorithm: SimplifyAlgorithm,
    /// Tolerance in map units.
    pub tolerance: f64,
}

/// Parameters of a feature query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRequest {
    /// Attribute indices to fetch; `None` fetches all of them.
    pub attributes: Option<Vec<usize>>,
    pub filter_rect: Option<BBox>,
    pub simplify: Option<SimplifyRequest>,
}

impl FeatureRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes(mut self, attributes: Vec<usize>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_filter_rect(mut self, rect: BBox) -> Self {
        self.filter_rect = Some(rect);
        self
    }

    pub fn with_simplify(mut self, simplify: SimplifyRequest) -> Self {
        self.simplify = Some(simplify);
        self
    }
}

/// Lazy feature stream. Dropping it ends the query early.
pub type FeatureIterator<'a> = Box<dyn Iterator<Item = Result<Feature, SourceError>> + 'a>;

/// A data provider that can stream a layer's features.
pub trait FeatureSource: Send + Sync {
    fn fields(&self) -> &Fields;

    fn get_features(&self, request: &FeatureRequest) -> Result<FeatureIterator<'_>, SourceError>;

    /// Whether the source honours [`FeatureRequest::simplify`] itself.
    fn supports_simplification(&self) -> bool {
        false
    }
}

/// A feature source backed by an in-memory vector and an R-tree.
#[derive(Debug)]
pub struct MemoryFeatureSource {
    fields: Fields,
    features: Vec<Feature>,
    index: SpatialIndex,
}

impl MemoryFeatureSource {
    pub fn new(fields: Fields, features: Vec<Feature>) -> Self {
        let entries = features
            .iter()
            .enumerate()
            .filter_map(|(slot, f)| {
                let bbox = f.geometry.as_ref()?.bbox()?;
                Some(SpatialEntry { slot, bbox })
            })
            .collect();
        log::debug!("Memory source indexed {} features", features.len());
        Self {
            fields,
            features,
            index: SpatialIndex::build(entries),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    fn validate(&self, request: &FeatureRequest) -> Result<(), SourceError> {
        let count = self.fields.len();
        if let Some(attributes) = &request.attributes {
            if let Some(&index) = attributes.iter().find(|&&i| i >= count) {
                return Err(SourceError::InvalidAttribute { index, count });
            }
        }
        Ok(())
    }
}

impl FeatureSource for MemoryFeatureSource {
    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn get_features(&self, request: &FeatureRequest) -> Result<FeatureIterator<'_>, SourceError> {
        self.validate(request)?;

        // Geometry-less features never intersect an extent.
        let slots: Vec<usize> = match &request.filter_rect {
            Some(rect) => self.index.query_extent(rect),
            None => (0..self.features.len()).collect(),
        };
        let attributes = request.attributes.clone();
        let simplify = request.simplify;

        Ok(Box::new(slots.into_iter().map(move |slot| {
            let mut feature = self.features[slot].clone();
            if let Some(indices) = &attributes {
                feature.project(indices);
            }
            if let Some(s) = simplify {
                feature.geometry = feature
                    .geometry
                    .map(|g| simplify_geometry(&g, s.algorithm, s.tolerance));
            }
            Ok(feature)
        })))
    }

    fn supports_simplification(&self) -> bool {
        true
    }
}
