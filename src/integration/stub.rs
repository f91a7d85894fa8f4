//! Synthetic collaborators for demos and tests: no camera, no model files.

use std::convert::Infallible;

use ndarray::ArrayView4;

use super::{ChannelOrder, Frame, FrameSource, InferenceEngine};
use crate::detection::BoundingBox;
use crate::error::Result;

/// Produces BGR gradient frames, then an empty frame once `limit` is reached.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    limit: Option<u64>,
    produced: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            limit: None,
            produced: 0,
        }
    }

    /// End the stream after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl FrameSource for SyntheticSource {
    fn read_frame(&mut self) -> Result<Frame> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(Frame::empty());
        }

        let shift = (self.produced % 256) as u32;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let b = ((x + shift) % 256) as u8;
                let g = ((y + shift) % 256) as u8;
                let r = ((x + y) % 256) as u8;
                data.extend_from_slice(&[b, g, r]);
            }
        }
        self.produced += 1;
        Frame::new(data, self.width, self.height, ChannelOrder::Bgr)
    }

    fn release(&mut self) {
        log::info!("SyntheticSource: released after {} frames", self.produced);
    }
}

static ZERO_COUNT: [f32; 1] = [0.0];
static NO_OUTPUT: [f32; 0] = [];

/// Detector engine that replays a fixed sequence of per-frame results.
///
/// Outputs follow the default layout: scores at 0, boxes at 1, count at 2.
#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    script: Vec<[Vec<f32>; 3]>,
    cursor: usize,
    current: usize,
}

impl ScriptedDetector {
    /// Each entry is the list of boxes the detector "sees" on one frame; the
    /// sequence repeats once exhausted. An empty entry reports zero detections.
    pub fn new(frames: Vec<Vec<BoundingBox>>) -> Self {
        let script = frames
            .into_iter()
            .map(|boxes| {
                let scores = boxes.iter().map(|b| b.confidence).collect();
                let quads = boxes
                    .iter()
                    .flat_map(|b| [b.ymin, b.xmin, b.ymax, b.xmax])
                    .collect();
                [scores, quads, vec![boxes.len() as f32]]
            })
            .collect();
        Self {
            script,
            cursor: 0,
            current: 0,
        }
    }
}

impl InferenceEngine for ScriptedDetector {
    type Error = Infallible;

    fn set_input(&mut self, _input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        if !self.script.is_empty() {
            self.current = self.cursor % self.script.len();
            self.cursor += 1;
        }
        Ok(())
    }

    fn output(&self, index: usize) -> Option<&[f32]> {
        match self.script.get(self.current) {
            Some(outputs) => outputs.get(index).map(Vec::as_slice),
            // An empty script always reports zero detections.
            None if index == 2 => Some(&ZERO_COUNT[..]),
            None => Some(&NO_OUTPUT[..]),
        }
    }
}

/// Classifier engine that returns the same score for every crop.
#[derive(Debug, Clone, Copy)]
pub struct ConstantClassifier {
    score: [f32; 1],
}

impl ConstantClassifier {
    pub fn new(score: f32) -> Self {
        Self { score: [score] }
    }
}

impl InferenceEngine for ConstantClassifier {
    type Error = Infallible;

    fn set_input(&mut self, _input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn output(&self, index: usize) -> Option<&[f32]> {
        (index == 0).then_some(&self.score[..])
    }
}
