//! Primary detector stage: preprocessing, invocation and output decoding.

use std::time::Instant;

use image::RgbImage;
use ndarray::Array4;

use super::InferenceEngine;
use super::frame::{fill_tensor, input_tensor};
use crate::config::DetectorConfig;
use crate::detection::{BoundingBox, BoxDecoder};
use crate::error::{CascadeError, Result};

const STAGE: &str = "detector";

/// Wraps a detector engine with its input buffer and output layout.
pub struct ObjectDetector<E: InferenceEngine> {
    engine: E,
    config: DetectorConfig,
    decoder: BoxDecoder,
    input: Array4<f32>,
}

impl<E: InferenceEngine> ObjectDetector<E> {
    pub fn new(engine: E, config: DetectorConfig) -> Self {
        Self {
            input: input_tensor(config.input_size),
            decoder: BoxDecoder::new(config.confidence_threshold),
            engine,
            config,
        }
    }

    /// Run the detector on an RGB frame and return the valid-detection count.
    pub fn detect(&mut self, frame: &RgbImage) -> Result<usize> {
        fill_tensor(frame, &mut self.input);

        let started = Instant::now();
        self.engine
            .set_input(self.input.view())
            .map_err(|e| CascadeError::inference(STAGE, e))?;
        self.engine
            .invoke()
            .map_err(|e| CascadeError::inference(STAGE, e))?;
        log::debug!(
            "object detection took {:.1} ms",
            started.elapsed().as_secs_f64() * 1000.0
        );

        let count = self.output(self.config.count_output)?;
        // Detectors report the count as a float; negative or NaN reads as zero.
        Ok(count.first().map_or(0, |&c| c as usize))
    }

    /// Decode the last invocation's outputs into candidates above the threshold.
    pub fn decode(&self, count: usize) -> Result<Vec<BoundingBox>> {
        let scores = self.output(self.config.scores_output)?;
        let boxes = self.output(self.config.boxes_output)?;
        self.decoder.decode(count, scores, boxes)
    }

    fn output(&self, index: usize) -> Result<&[f32]> {
        self.engine
            .output(index)
            .ok_or(CascadeError::MissingOutput {
                stage: STAGE,
                index,
            })
    }

    /// Get a reference to the underlying detector engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Get a mutable reference to the underlying detector engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
