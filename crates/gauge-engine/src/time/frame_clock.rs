use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick.
    pub dt: Duration,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Per-surface frame clock.
///
/// The host owns frame timing; this clock only observes it so the panel can
/// report how long frames take between host callbacks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    last: Instant,
    frame_index: u64,
    slowest: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
            frame_index: 0,
            slowest: Duration::ZERO,
        }
    }

    /// Advances the clock and returns the timing of the frame that just ended.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.slowest = self.slowest.max(dt);

        let ft = FrameTime { dt, frame_index: self.frame_index };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Number of completed ticks.
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// Wall time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.last.saturating_duration_since(self.started)
    }

    /// Mean frame time over all ticks, or zero before the first tick.
    pub fn mean_frame_time(&self) -> Duration {
        match u32::try_from(self.frame_index) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.elapsed() / n,
            Err(_) => Duration::from_secs_f64(self.elapsed().as_secs_f64() / self.frame_index as f64),
        }
    }

    /// Longest single frame observed.
    pub fn slowest_frame(&self) -> Duration {
        self.slowest
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_frames_from_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn mean_is_zero_before_first_tick() {
        let clock = FrameClock::new();
        assert_eq!(clock.mean_frame_time(), Duration::ZERO);
    }

    #[test]
    fn slowest_frame_bounds_mean() {
        let mut clock = FrameClock::new();
        for _ in 0..3 {
            clock.tick();
        }
        assert!(clock.slowest_frame() >= clock.mean_frame_time());
    }
}
