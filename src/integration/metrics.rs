//! Frame throughput counters.

use std::time::Instant;

/// Lifetime throughput: frames processed since the pipeline started.
///
/// FPS is `frame_count / seconds_since_start`, an average over the whole run rather
/// than a windowed rate.
#[derive(Debug, Clone)]
pub struct FrameMetrics {
    frame_count: u64,
    started: Instant,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self {
            frame_count: 0,
            started,
        }
    }

    /// Count one more frame and return the updated FPS.
    pub fn record_frame(&mut self) -> f64 {
        self.record_frame_at(Instant::now())
    }

    pub fn record_frame_at(&mut self, now: Instant) -> f64 {
        self.frame_count += 1;
        self.fps_at(now)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f64 {
        self.fps_at(Instant::now())
    }

    /// FPS as of `now`; 0 until measurable time has passed.
    pub fn fps_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        if elapsed > 0.0 {
            self.frame_count as f64 / elapsed
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_lifetime_average() {
        let start = Instant::now();
        let mut metrics = FrameMetrics::starting_at(start);

        metrics.record_frame_at(start + Duration::from_millis(500));
        let fps = metrics.record_frame_at(start + Duration::from_secs(1));
        assert_eq!(metrics.frame_count(), 2);
        assert!((fps - 2.0).abs() < 1e-9);

        // A slow frame drags the whole average down.
        let fps = metrics.record_frame_at(start + Duration::from_secs(6));
        assert!((fps - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_elapsed_time_is_zero_fps() {
        let start = Instant::now();
        let mut metrics = FrameMetrics::starting_at(start);
        assert_eq!(metrics.record_frame_at(start), 0.0);
        assert_eq!(metrics.frame_count(), 1);
    }
}
