//! Captured frames, the frame source trait and tensor preprocessing.

use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

use crate::error::{CascadeError, Result};

/// Byte order of the three interleaved channels in a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    /// Typical of camera capture APIs.
    Bgr,
}

/// One captured frame: tightly packed 8-bit, 3-channel pixels.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
}

impl Frame {
    /// Wrap a raw buffer. Fails unless `data.len() == width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CascadeError::InvalidFrame {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// The end-of-stream marker sources hand out when they run dry.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            order: ChannelOrder::Rgb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy into an RGB image, swapping channels when the frame is BGR.
    pub fn to_rgb(&self) -> Result<RgbImage> {
        let data = match self.order {
            ChannelOrder::Rgb => self.data.clone(),
            ChannelOrder::Bgr => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        };
        let got = data.len();
        RgbImage::from_raw(self.width, self.height, data).ok_or(CascadeError::InvalidFrame {
            expected: self.width as usize * self.height as usize * 3,
            got,
        })
    }
}

/// Trait for frame producers (camera, stream, file, synthetic).
///
/// A source signals end-of-stream or failure by returning an empty frame; the
/// pipeline treats that as fatal.
pub trait FrameSource {
    /// Block until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Release capture resources. Called once when the pipeline stops.
    fn release(&mut self) {}
}

/// Allocate an NHWC input tensor for a square model input.
pub(crate) fn input_tensor(size: u32) -> Array4<f32> {
    Array4::zeros((1, size as usize, size as usize, 3))
}

/// Resize `src` to the tensor's square resolution and write it normalized to [0, 1].
///
/// The tensor is reused across frames; only its contents change.
pub(crate) fn fill_tensor<I>(src: &I, tensor: &mut Array4<f32>)
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (_, h, w, _) = tensor.dim();
    let resized = imageops::resize(src, w as u32, h as u32, FilterType::Triangle);
    for (dst, &px) in tensor.iter_mut().zip(resized.as_raw().iter()) {
        *dst = px as f32 / 255.0;
    }
}
