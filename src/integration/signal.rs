//! Exit signals polled once per frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Checked after each frame is rendered; `true` stops the pipeline.
pub trait ExitSignal {
    fn should_exit(&mut self) -> bool;
}

/// Flag flipped from elsewhere, e.g. a Ctrl-C handler.
impl ExitSignal for Arc<AtomicBool> {
    fn should_exit(&mut self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl ExitSignal for &AtomicBool {
    fn should_exit(&mut self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Stop after a fixed number of frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameLimit {
    remaining: u64,
}

impl FrameLimit {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }
}

impl ExitSignal for FrameLimit {
    fn should_exit(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Exit when either signal fires.
#[derive(Debug, Clone)]
pub struct AnyOf<A, B>(pub A, pub B);

impl<A: ExitSignal, B: ExitSignal> ExitSignal for AnyOf<A, B> {
    fn should_exit(&mut self) -> bool {
        // Poll both so counters like FrameLimit keep ticking.
        let a = self.0.should_exit();
        let b = self.1.should_exit();
        a || b
    }
}
