//! # Veclayer Renderer
//!
//! Symbology and render pass orchestration for vector layers.
//! A [`VectorLayerRenderer`] streams a layer's features from its source, draws
//! them through a [`FeatureRenderer`] onto a [`Surface`] (directly or by symbol
//! levels), and feeds labeling and diagram placement along the way.

pub mod attributes;
pub mod context;
pub mod error;
pub mod expression;
pub mod labeling;
pub mod layer_renderer;
pub mod levels;
pub mod map_to_pixel;
pub mod renderer;
pub mod state;
pub mod surface;
pub mod symbol;
pub mod vector_layer;

pub use attributes::AttributeRequirements;
pub use context::{CancellationToken, ExpressionScope, RenderContext};
pub use error::RenderError;
pub use expression::{CompareOp, Expression};
pub use labeling::LabelingEngine;
pub use layer_renderer::{RenderStats, VectorLayerRenderer};
pub use levels::{SymbolId, SymbolLevelItem, SymbolLevelOrder};
pub use map_to_pixel::{MapToPixel, ScreenPoint};
pub use renderer::{Category, FeatureRenderer, RendererKind, Rule, SymbologyRenderer};
pub use state::{RenderOutcome, RenderPassState};
pub use surface::{DrawCommand, MarkerShape, RecordingSurface, Surface};
pub use symbol::{Symbol, SymbolLayer, SymbolLayerKind};
pub use vector_layer::VectorLayer;
