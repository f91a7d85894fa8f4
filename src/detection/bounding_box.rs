/// Detector box in normalized coordinates with its confidence.
///
/// Coordinates are fractions of the frame width (`x*`) and height (`y*`), with
/// `(xmin, ymin)` the top-left corner and `(xmax, ymax)` the bottom-right one.
/// Zero-area boxes are legal; they simply never overlap anything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    /// Left edge
    pub xmin: f32,
    /// Top edge
    pub ymin: f32,
    /// Right edge
    pub xmax: f32,
    /// Bottom edge
    pub ymax: f32,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
}

impl BoundingBox {
    /// Create a box from its edges (x1, y1, x2, y2) and a confidence.
    #[inline]
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            confidence,
        }
    }

    /// Create a box from a detector quadruple laid out as `[ymin, xmin, ymax, xmax]`.
    #[inline]
    pub fn from_yxyx(quad: [f32; 4], confidence: f32) -> Self {
        let [ymin, xmin, ymax, xmax] = quad;
        Self::new(xmin, ymin, xmax, ymax, confidence)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Calculate Intersection over Union (IoU) with another box.
    ///
    /// Returns 0 when the union is empty, so two degenerate boxes never yield NaN.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix_min = self.xmin.max(other.xmin);
        let iy_min = self.ymin.max(other.ymin);
        let ix_max = self.xmax.min(other.xmax);
        let iy_max = self.ymax.min(other.ymax);

        let intersection = (ix_max - ix_min).max(0.0) * (iy_max - iy_min).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Scale to pixel space for a `width` x `height` frame.
    ///
    /// Each coordinate is truncated toward zero and clamped to `[0, dim - 1]`, so
    /// boxes that spill past the frame edge still map onto valid pixels.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> PixelRect {
        let max_x = i64::from(width.saturating_sub(1));
        let max_y = i64::from(height.saturating_sub(1));
        let scale = |v: f32, dim: u32, max: i64| -> u32 {
            ((v * dim as f32) as i64).clamp(0, max) as u32
        };

        PixelRect {
            x1: scale(self.xmin, width, max_x),
            y1: scale(self.ymin, height, max_y),
            x2: scale(self.xmax, width, max_x),
            y2: scale(self.ymax, height, max_y),
        }
    }
}

/// Calculate IoU between two boxes. See [`BoundingBox::iou`].
#[inline]
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.iou(b)
}

/// Clamped pixel rectangle with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    /// True when the rectangle collapsed to a line or a point after clamping.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Inclusive width in pixels (0 for degenerate rectangles).
    #[inline]
    pub fn width(&self) -> u32 {
        if self.is_degenerate() {
            0
        } else {
            self.x2 - self.x1 + 1
        }
    }

    /// Inclusive height in pixels (0 for degenerate rectangles).
    #[inline]
    pub fn height(&self) -> u32 {
        if self.is_degenerate() {
            0
        } else {
            self.y2 - self.y1 + 1
        }
    }
}
