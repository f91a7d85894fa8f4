//! Trait for opaque tensor-in/tensor-out inference engines.

use ndarray::ArrayView4;

/// Trait for inference runtimes driven by the cascade.
///
/// Both the primary detector and the secondary classifier sit behind this trait.
/// The cascade writes one input tensor, invokes the model, then reads flat `f32`
/// outputs by index. Engines own their buffers; the cascade never retains them
/// past a single frame.
///
/// # Example
///
/// ```ignore
/// use cascade_rs::InferenceEngine;
/// use ndarray::ArrayView4;
///
/// struct MyRuntime {
///     outputs: Vec<Vec<f32>>,
/// }
///
/// impl InferenceEngine for MyRuntime {
///     type Error = std::io::Error;
///
///     fn set_input(&mut self, input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
///         // Copy `input` into the runtime's input tensor
///         Ok(())
///     }
///
///     fn invoke(&mut self) -> Result<(), Self::Error> {
///         // Run the model and refresh `outputs`
///         Ok(())
///     }
///
///     fn output(&self, index: usize) -> Option<&[f32]> {
///         self.outputs.get(index).map(Vec::as_slice)
///     }
/// }
/// ```
pub trait InferenceEngine {
    /// Error type for engine failures. Any such failure ends the run.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the input tensor, shaped `[1, height, width, channels]`.
    fn set_input(&mut self, input: ArrayView4<'_, f32>) -> Result<(), Self::Error>;

    /// Run the model on the current input.
    fn invoke(&mut self) -> Result<(), Self::Error>;

    /// Flattened contents of output tensor `index` from the last invocation.
    fn output(&self, index: usize) -> Option<&[f32]>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    type Error = E::Error;

    fn set_input(&mut self, input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        (**self).set_input(input)
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        (**self).invoke()
    }

    fn output(&self, index: usize) -> Option<&[f32]> {
        (**self).output(index)
    }
}
