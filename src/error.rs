//! Error type shared by every stage of the cascade.

use thiserror::Error;

/// Boxed error produced by an inference engine implementation.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that terminate a cascade run.
///
/// Per-frame outcomes such as "no detections" or a rejected candidate are not
/// errors and never show up here.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// The detector reported more detections than its output arrays hold.
    #[error(
        "detector output shape mismatch: count {count} exceeds scores ({scores}) or boxes ({boxes})"
    )]
    ShapeMismatch {
        count: usize,
        scores: usize,
        boxes: usize,
    },

    /// An engine did not expose an output tensor the cascade reads.
    #[error("{stage} engine has no output at index {index}")]
    MissingOutput { stage: &'static str, index: usize },

    /// An engine failed to accept input or to run.
    #[error("{stage} inference failed: {source}")]
    Inference {
        stage: &'static str,
        #[source]
        source: EngineError,
    },

    /// The frame source delivered an empty frame.
    #[error("frame source returned an empty frame (stream ended or broken)")]
    StreamEnded,

    /// A frame buffer does not match its declared dimensions.
    #[error("invalid frame buffer: expected {expected} bytes, got {got}")]
    InvalidFrame { expected: usize, got: usize },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid font file: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}

impl CascadeError {
    pub(crate) fn inference<E>(stage: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Inference {
            stage,
            source: Box::new(err),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CascadeError> = std::result::Result<T, E>;
