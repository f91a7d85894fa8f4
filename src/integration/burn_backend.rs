//! Burn inference backend.
//!
//! This module provides a `BurnEngine` that implements `InferenceEngine` for
//! detector or classifier models built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use cascade_rs::{BurnEngine, BurnModel};
//! use burn::backend::NdArray;
//!
//! // Implement BurnModel for your detection model
//! struct MySsdModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MySsdModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<burn::tensor::Tensor<NdArray, 1>> {
//!         // Run inference, return [scores, boxes, count]
//!     }
//! }
//!
//! let model = MySsdModel::load("detector.bin");
//! let engine = BurnEngine::new(model, Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use ndarray::ArrayView4;
use thiserror::Error;

use super::InferenceEngine;

/// Error type for Burn engine failures.
#[derive(Debug, Clone, Error)]
pub enum BurnEngineError {
    /// Input tensor does not match the model's expected shape.
    #[error("invalid input dimensions: expected {expected:?}, got {got:?}")]
    InvalidInputDimensions {
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },
    /// `invoke` was called before any input was set.
    #[error("no input tensor set before invoke")]
    MissingInput,
    /// An output tensor could not be read back as `f32`.
    #[error("failed to read output {index}: {message}")]
    Output { index: usize, message: String },
}

/// Trait for Burn-based models.
///
/// Implement this trait for your specific model architecture.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run forward pass on the input tensor.
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape [batch, channels, height, width] when
    ///   `channels_first` is true, otherwise [batch, height, width, channels]
    ///
    /// # Returns
    /// Flattened output tensors, in the order the cascade reads them by index.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<Tensor<B, 1>>;

    /// Get the expected input size (height, width, channels).
    fn input_size(&self) -> (usize, usize, usize) {
        (416, 416, 3)
    }

    /// Whether the model wants NCHW input (vs NHWC).
    fn channels_first(&self) -> bool {
        true
    }
}

/// Burn-based engine implementing `InferenceEngine`.
pub struct BurnEngine<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    input: Option<Tensor<B, 4>>,
    outputs: Vec<Vec<f32>>,
}

impl<B: Backend, M: BurnModel<B>> BurnEngine<B, M> {
    /// Create a new Burn engine with the given model and device.
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            input: None,
            outputs: Vec::new(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<B: Backend, M: BurnModel<B>> InferenceEngine for BurnEngine<B, M> {
    type Error = BurnEngineError;

    fn set_input(&mut self, input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        let (_, height, width, channels) = input.dim();
        let expected = self.model.input_size();
        if (height, width, channels) != expected {
            return Err(BurnEngineError::InvalidInputDimensions {
                expected,
                got: (height, width, channels),
            });
        }

        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
            1,
            height,
            width,
            channels,
        ]);

        // NHWC -> NCHW
        let tensor = if self.model.channels_first() {
            tensor.swap_dims(1, 3).swap_dims(2, 3)
        } else {
            tensor
        };

        self.input = Some(tensor);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        let input = self.input.clone().ok_or(BurnEngineError::MissingInput)?;
        self.outputs = self
            .model
            .forward(input)
            .into_iter()
            .enumerate()
            .map(|(index, tensor)| {
                tensor
                    .into_data()
                    .to_vec::<f32>()
                    .map_err(|err| BurnEngineError::Output {
                        index,
                        message: format!("{err:?}"),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn output(&self, index: usize) -> Option<&[f32]> {
        self.outputs.get(index).map(Vec::as_slice)
    }
}
