//! Decoding of raw detector outputs into candidate boxes.

use crate::detection::BoundingBox;
use crate::error::{CascadeError, Result};

/// Turns the detector's flattened score/box arrays into [`BoundingBox`] candidates.
#[derive(Debug, Clone, Copy)]
pub struct BoxDecoder {
    confidence_threshold: f32,
}

impl Default for BoxDecoder {
    fn default() -> Self {
        Self::new(0.4)
    }
}

impl BoxDecoder {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Decode the first `count` detector slots.
    ///
    /// `boxes` holds `[ymin, xmin, ymax, xmax]` quadruples back to back. Slots whose
    /// score is below the threshold are dropped; the rest keep the detector's order
    /// and coordinates verbatim.
    ///
    /// Fails with [`CascadeError::ShapeMismatch`] when `count` exceeds either array,
    /// which means the model's output layout does not match what the cascade expects.
    pub fn decode(&self, count: usize, scores: &[f32], boxes: &[f32]) -> Result<Vec<BoundingBox>> {
        if count > scores.len() || count > boxes.len() / 4 {
            return Err(CascadeError::ShapeMismatch {
                count,
                scores: scores.len(),
                boxes: boxes.len() / 4,
            });
        }

        let decoded = scores[..count]
            .iter()
            .zip(boxes[..count * 4].chunks_exact(4))
            .filter(|&(&score, _)| score >= self.confidence_threshold)
            .map(|(&score, quad)| {
                BoundingBox::from_yxyx([quad[0], quad[1], quad[2], quad[3]], score)
            })
            .collect();

        Ok(decoded)
    }
}
