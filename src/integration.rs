//! Integration module connecting inference engines, frame sources and sinks
//! into the detection cascade.
//!
//! This module provides the collaborator traits (`InferenceEngine`,
//! `FrameSource`, `FrameSink`, `ExitSignal`), the detector and verifier stages
//! built on them, and the `CascadePipeline` that drives one frame at a time.

mod detector;
mod engine;
mod frame;
mod metrics;
mod pipeline;
mod signal;
mod sink;
mod stub;
mod verifier;

pub use detector::ObjectDetector;
pub use engine::InferenceEngine;
pub use frame::{ChannelOrder, Frame, FrameSource};
pub use metrics::FrameMetrics;
pub use pipeline::{CascadePipeline, FrameOutcome, FrameReport, RunSummary};
pub use signal::{AnyOf, ExitSignal, FrameLimit};
pub use sink::{FrameSink, LabelFont, LogSink, SnapshotSink, annotate};
pub use stub::{ConstantClassifier, ScriptedDetector, SyntheticSource};
pub use verifier::{Verdict, Verifier};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnEngine, BurnEngineError, BurnModel};
