//! Render sinks and box annotation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use super::Frame;
use crate::detection::BoundingBox;
use crate::error::Result;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;
const LABEL_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_TEXT: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_PADDING: u32 = 3;
const FPS_ORIGIN: (i32, i32) = (10, 10);

/// Fonts tried by [`LabelFont::system`], in order.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font used for score labels and the FPS overlay.
pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    /// Load a TrueType/OpenType font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self {
            font: FontVec::try_from_vec(bytes)?,
            scale: PxScale::from(14.0),
        })
    }

    /// First loadable font from a list of well-known system locations.
    pub fn system() -> Option<Self> {
        SYSTEM_FONTS
            .iter()
            .find_map(|path| Self::load(path).ok())
    }

    /// Glyph height in pixels.
    pub fn with_scale(mut self, px: f32) -> Self {
        self.scale = PxScale::from(px);
        self
    }

    /// Black text on a white box whose top-left corner is at `(x, y)`.
    fn draw_boxed(&self, image: &mut RgbImage, x: i32, y: i32, text: &str) {
        let (w, h) = text_size(self.scale, &self.font, text);
        if w == 0 || h == 0 {
            return;
        }
        let background = Rect::at(x, y).of_size(w + 2 * LABEL_PADDING, h + 2 * LABEL_PADDING);
        draw_filled_rect_mut(image, background, LABEL_BACKGROUND);
        let pad = LABEL_PADDING as i32;
        draw_text_mut(image, LABEL_TEXT, x + pad, y + pad, self.scale, &self.font, text);
    }

    fn label_height(&self, text: &str) -> u32 {
        text_size(self.scale, &self.font, text).1 + 2 * LABEL_PADDING
    }
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFont")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// Trait for consumers of the per-frame result (display, recorder, logger).
pub trait FrameSink {
    /// Receive the frame, its verified detections and the current FPS.
    fn render(&mut self, frame: &Frame, detections: &[BoundingBox], fps: f64) -> Result<()>;

    /// Release display resources. Called once when the pipeline stops.
    fn release(&mut self) {}
}

/// Draw each detection as a green rectangle outline in pixel space.
///
/// With a font, each box also gets a `Score: <confidence>` label above it and
/// the frame gets an `FPS: <n>` overlay in the top-left corner.
pub fn annotate(
    image: &mut RgbImage,
    detections: &[BoundingBox],
    fps: f64,
    font: Option<&LabelFont>,
) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    for det in detections {
        let r = det.to_pixel_rect(width, height);
        let (w, h) = (r.width(), r.height());
        for t in 0..BOX_THICKNESS {
            if w <= 2 * t || h <= 2 * t {
                break;
            }
            let outline =
                Rect::at((r.x1 + t) as i32, (r.y1 + t) as i32).of_size(w - 2 * t, h - 2 * t);
            draw_hollow_rect_mut(image, outline, BOX_COLOR);
        }

        if let Some(font) = font {
            let label = format!("Score: {:.3}", det.confidence);
            // Above the box, or inside it when the box touches the top edge.
            let y = r.y1.saturating_sub(font.label_height(&label));
            font.draw_boxed(image, r.x1 as i32, y as i32, &label);
        }
    }

    if let Some(font) = font {
        // Truncated like the integer FPS readout; NaN reads as 0.
        let text = format!("FPS: {}", fps as u64);
        font.draw_boxed(image, FPS_ORIGIN.0, FPS_ORIGIN.1, &text);
    }
}

/// Logs detections and FPS; draws nothing.
#[derive(Debug, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn render(&mut self, _frame: &Frame, detections: &[BoundingBox], fps: f64) -> Result<()> {
        for det in detections {
            log::info!(
                "detection score {:.3} at [{:.3}, {:.3}, {:.3}, {:.3}]",
                det.confidence,
                det.xmin,
                det.ymin,
                det.xmax,
                det.ymax
            );
        }
        log::debug!("fps {fps:.1}");
        Ok(())
    }
}

/// Writes annotated frames as PNG files, one every `every` frames.
#[derive(Debug)]
pub struct SnapshotSink {
    dir: PathBuf,
    every: u64,
    seen: u64,
    written: u64,
    font: Option<LabelFont>,
}

impl SnapshotSink {
    /// Create the output directory if needed. `every` of 0 is treated as 1.
    ///
    /// Labels use [`LabelFont::system`]; without one only boxes are drawn.
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let font = LabelFont::system();
        if font.is_none() {
            log::warn!("no system font found, snapshots will carry boxes without labels");
        }
        Ok(Self {
            dir,
            every: every.max(1),
            seen: 0,
            written: 0,
            font,
        })
    }

    /// Use `font` for score labels and the FPS overlay.
    pub fn with_font(mut self, font: LabelFont) -> Self {
        self.font = Some(font);
        self
    }

    /// Number of PNG files written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for SnapshotSink {
    fn render(&mut self, frame: &Frame, detections: &[BoundingBox], fps: f64) -> Result<()> {
        let index = self.seen;
        self.seen += 1;
        if index % self.every != 0 {
            return Ok(());
        }

        let mut image = frame.to_rgb()?;
        annotate(&mut image, detections, fps, self.font.as_ref());
        let path = self.dir.join(format!("frame_{index:06}.png"));
        image.save(&path)?;
        self.written += 1;
        log::debug!("wrote snapshot {}", path.display());
        Ok(())
    }
}
