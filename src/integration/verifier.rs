//! Secondary classifier stage that confirms or rejects each surviving box.

use std::time::Instant;

use image::{RgbImage, imageops};
use ndarray::Array4;

use super::InferenceEngine;
use super::frame::{fill_tensor, input_tensor};
use crate::config::VerifierConfig;
use crate::detection::BoundingBox;
use crate::error::{CascadeError, Result};

const STAGE: &str = "classifier";

/// Decision for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Classifier score above the accept threshold
    Accepted(f32),
    /// Classifier score at or below the accept threshold
    Rejected(f32),
    /// Crop collapsed to zero width or height; the classifier was not run
    Degenerate,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Crops candidates out of the full frame and runs the classifier on them.
pub struct Verifier<E: InferenceEngine> {
    engine: E,
    accept_threshold: f32,
    input: Array4<f32>,
}

impl<E: InferenceEngine> Verifier<E> {
    pub fn new(engine: E, config: VerifierConfig) -> Self {
        Self {
            engine,
            accept_threshold: config.accept_threshold,
            input: input_tensor(config.input_size),
        }
    }

    /// Classify the region of `frame` covered by `candidate`.
    pub fn verify(&mut self, frame: &RgbImage, candidate: &BoundingBox) -> Result<Verdict> {
        let (width, height) = frame.dimensions();
        let rect = candidate.to_pixel_rect(width, height);
        if rect.is_degenerate() {
            log::warn!(
                "degenerate crop {:?} for box with confidence {:.3}, rejecting",
                rect,
                candidate.confidence
            );
            return Ok(Verdict::Degenerate);
        }

        let crop = imageops::crop_imm(frame, rect.x1, rect.y1, rect.width(), rect.height());
        fill_tensor(&*crop, &mut self.input);

        let started = Instant::now();
        self.engine
            .set_input(self.input.view())
            .map_err(|e| CascadeError::inference(STAGE, e))?;
        self.engine
            .invoke()
            .map_err(|e| CascadeError::inference(STAGE, e))?;
        log::debug!(
            "classification took {:.1} ms",
            started.elapsed().as_secs_f64() * 1000.0
        );

        let score = self
            .engine
            .output(0)
            .and_then(|out| out.first().copied())
            .ok_or(CascadeError::MissingOutput {
                stage: STAGE,
                index: 0,
            })?;
        log::debug!("classifier score {score:.3}");

        if score > self.accept_threshold {
            Ok(Verdict::Accepted(score))
        } else {
            Ok(Verdict::Rejected(score))
        }
    }

    /// Get a reference to the underlying classifier engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Get a mutable reference to the underlying classifier engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
