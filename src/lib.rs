//! Two-stage visual detection cascade.
//!
//! A primary detector proposes candidate boxes, greedy non-maximum suppression
//! removes duplicates, and a secondary classifier verifies each survivor on a
//! crop of the original frame. Inference runtimes, frame capture and rendering
//! are collaborators behind traits.

pub mod config;
pub mod detection;
pub mod error;
pub mod integration;

pub use config::{CascadeConfig, DetectorConfig, NmsConfig, VerifierConfig};
pub use detection::{BoundingBox, BoxDecoder, NmsEngine, PixelRect, iou, non_max_suppression};
pub use error::{CascadeError, Result};
pub use integration::{
    AnyOf, CascadePipeline, ChannelOrder, ConstantClassifier, ExitSignal, Frame, FrameLimit,
    FrameMetrics, FrameOutcome, FrameReport, FrameSink, FrameSource, InferenceEngine, LabelFont,
    LogSink, ObjectDetector, RunSummary, ScriptedDetector, SnapshotSink, SyntheticSource, Verdict, Verifier,
    annotate,
};

#[cfg(feature = "burn-backend")]
pub use integration::{BurnEngine, BurnEngineError, BurnModel};
