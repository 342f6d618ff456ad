//! # Veclayer Core
//!
//! Feature model for vector layer rendering: geometries, attributes and
//! fields, the feature source adapter contract with an R-tree backed
//! in-memory source, geometry simplification, the shared geometry cache and
//! the serializable layer render settings.

pub mod geometry;
pub mod feature;
pub mod layer;
pub mod simplify;
pub mod spatial;
pub mod source;
pub mod cache;

pub use cache::GeometryCache;
pub use feature::{AttributeValue, Feature, FeatureId, FeatureIds, Field, FieldType, Fields};
pub use geometry::{BBox, Geometry, GeometryType, LineString, Point, Polygon};
pub use layer::{
    BlendMode, Color, DiagramSettings, FillPattern, LabelingSettings, LayerId,
    LayerRenderSettings, UnmatchedFeaturePolicy, VertexMarkerSettings, VertexMarkerStyle,
};
pub use simplify::{SimplifyAlgorithm, SimplifyHints, SimplifyMethod};
pub use source::{
    FeatureIterator, FeatureRequest, FeatureSource, MemoryFeatureSource, SimplifyRequest,
    SourceError,
};
