//! Greedy non-maximum suppression.

use crate::detection::BoundingBox;

/// Greedy NMS over a single class of candidates.
#[derive(Debug, Clone, Copy)]
pub struct NmsEngine {
    iou_threshold: f32,
}

impl Default for NmsEngine {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl NmsEngine {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Suppress overlapping candidates, reusing the input allocation for the pool.
    ///
    /// The pool is sorted ascending so the best remaining box is always at the end;
    /// each pop accepts it and drops every remaining box overlapping it by more than
    /// the threshold. Accepted boxes come out in descending confidence.
    pub fn suppress(&self, mut candidates: Vec<BoundingBox>) -> Vec<BoundingBox> {
        candidates.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));

        let mut accepted = Vec::with_capacity(candidates.len());
        while let Some(best) = candidates.pop() {
            candidates.retain(|other| best.iou(other) <= self.iou_threshold);
            accepted.push(best);
        }
        accepted
    }
}

/// Run [`NmsEngine::suppress`] with the given IoU threshold.
pub fn non_max_suppression(candidates: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    NmsEngine::new(iou_threshold).suppress(candidates)
}
