use thiserror::Error;

use veclayer_core::source::SourceError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Layer has no symbol renderer")]
    NoRenderer,

    #[error("Renderer '{renderer}' refused to start: {reason}")]
    StartRefused { renderer: String, reason: String },

    #[error("Classification field '{0}' not found in layer fields")]
    UnknownClassificationField(String),

    #[error("Feature source error: {0}")]
    Source(#[from] SourceError),
}
