//! Post-processing of raw detector outputs: decoding, overlap and suppression.

mod bounding_box;
mod decoder;
mod nms;

pub use bounding_box::{BoundingBox, PixelRect, iou};
pub use decoder::BoxDecoder;
pub use nms::{NmsEngine, non_max_suppression};
