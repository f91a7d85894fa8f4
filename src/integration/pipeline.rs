//! CascadePipeline: detect, suppress and verify once per frame.

use crate::config::CascadeConfig;
use crate::detection::{BoundingBox, NmsEngine};
use crate::error::{CascadeError, Result};

use super::{
    ExitSignal, Frame, FrameMetrics, FrameSink, FrameSource, InferenceEngine, ObjectDetector,
    Verdict, Verifier,
};

/// How far a frame made it through the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Detector reported nothing; decode, NMS and verification were skipped.
    /// `run` still renders the frame and checks the exit signal.
    NoDetections,
    /// Candidates were decoded, suppressed and verified.
    Processed,
}

/// Result of one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub outcome: FrameOutcome,
    /// Candidates above the confidence threshold
    pub candidates: usize,
    /// Candidates left after NMS
    pub after_nms: usize,
    /// Boxes the classifier accepted, in descending detector confidence
    pub detections: Vec<BoundingBox>,
    /// Lifetime average FPS including this frame
    pub fps: f64,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub verified: u64,
    pub fps: f64,
}

/// Two-stage detection cascade over a detector and a classifier engine.
///
/// Owns both engines exclusively; frames are processed strictly one at a time.
pub struct CascadePipeline<D: InferenceEngine, C: InferenceEngine> {
    detector: ObjectDetector<D>,
    nms: NmsEngine,
    verifier: Verifier<C>,
    metrics: FrameMetrics,
}

impl<D: InferenceEngine, C: InferenceEngine> CascadePipeline<D, C> {
    /// Create a pipeline after validating `config`.
    pub fn new(detector: D, classifier: C, config: &CascadeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: ObjectDetector::new(detector, config.detector.clone()),
            nms: NmsEngine::new(config.nms.iou_threshold),
            verifier: Verifier::new(classifier, config.verifier.clone()),
            metrics: FrameMetrics::new(),
        })
    }

    /// Create a pipeline with default thresholds and input sizes.
    pub fn with_default_config(detector: D, classifier: C) -> Result<Self> {
        Self::new(detector, classifier, &CascadeConfig::default())
    }

    /// Run the cascade on one frame.
    ///
    /// An empty frame is a stream failure. Zero detections, an empty NMS result
    /// and rejected candidates are ordinary outcomes. The frame counter always
    /// advances.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        if frame.is_empty() {
            return Err(CascadeError::StreamEnded);
        }

        let rgb = frame.to_rgb()?;
        let count = self.detector.detect(&rgb)?;
        if count == 0 {
            let fps = self.metrics.record_frame();
            log::debug!("no detections, fps {fps:.1}");
            return Ok(FrameReport {
                outcome: FrameOutcome::NoDetections,
                candidates: 0,
                after_nms: 0,
                detections: Vec::new(),
                fps,
            });
        }

        let candidates = self.detector.decode(count)?;
        let num_candidates = candidates.len();

        let kept = self.nms.suppress(candidates);
        let after_nms = kept.len();

        let mut detections = Vec::with_capacity(after_nms);
        for candidate in kept {
            match self.verifier.verify(&rgb, &candidate)? {
                Verdict::Accepted(_) => detections.push(candidate),
                Verdict::Rejected(score) => {
                    log::debug!(
                        "classifier rejected box (detector {:.3}, classifier {score:.3})",
                        candidate.confidence
                    );
                }
                Verdict::Degenerate => {}
            }
        }

        let fps = self.metrics.record_frame();
        log::info!(
            "detections {num_candidates}, after NMS {after_nms}, verified {}, fps {fps:.1}",
            detections.len()
        );

        Ok(FrameReport {
            outcome: FrameOutcome::Processed,
            candidates: num_candidates,
            after_nms,
            detections,
            fps,
        })
    }

    /// Capture, process and render frames until `exit` fires or a fatal error occurs.
    ///
    /// The source and sink are released on every exit path.
    pub fn run<S, K, X>(&mut self, source: &mut S, sink: &mut K, exit: &mut X) -> Result<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
        X: ExitSignal + ?Sized,
    {
        let result = self.drive(source, sink, exit);
        source.release();
        sink.release();

        match &result {
            Ok(summary) => log::info!(
                "pipeline stopped after {} frames ({} verified detections, {:.1} fps)",
                summary.frames,
                summary.verified,
                summary.fps
            ),
            Err(err) => log::error!("pipeline aborted: {err}"),
        }
        result
    }

    fn drive<S, K, X>(&mut self, source: &mut S, sink: &mut K, exit: &mut X) -> Result<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
        X: ExitSignal + ?Sized,
    {
        let first_frame = self.metrics.frame_count();
        let mut verified = 0u64;

        loop {
            let frame = source.read_frame()?;
            let report = self.process_frame(&frame)?;
            verified += report.detections.len() as u64;

            sink.render(&frame, &report.detections, report.fps)?;

            if exit.should_exit() {
                return Ok(RunSummary {
                    frames: self.metrics.frame_count() - first_frame,
                    verified,
                    fps: report.fps,
                });
            }
        }
    }

    /// Get a reference to the frame metrics.
    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// Get a reference to the detector stage.
    pub fn detector(&self) -> &ObjectDetector<D> {
        &self.detector
    }

    /// Get a mutable reference to the detector stage.
    pub fn detector_mut(&mut self) -> &mut ObjectDetector<D> {
        &mut self.detector
    }

    /// Get a reference to the verification stage.
    pub fn verifier(&self) -> &Verifier<C> {
        &self.verifier
    }

    /// Get a mutable reference to the verification stage.
    pub fn verifier_mut(&mut self) -> &mut Verifier<C> {
        &mut self.verifier
    }
}
