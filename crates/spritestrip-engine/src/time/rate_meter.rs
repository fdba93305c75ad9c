use std::time::{Duration, Instant};

/// Averaged frame rate over a reporting window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RateSample {
    pub frames: u32,
    pub fps: f32,
    /// Mean frame time in milliseconds.
    pub frame_ms: f32,
}

/// Counts frames and yields a [`RateSample`] once per `window`.
#[derive(Debug, Clone)]
pub struct RateMeter {
    window: Duration,
    started: Instant,
    frames: u32,
}

impl RateMeter {
    pub fn new(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    pub fn starting_at(window: Duration, now: Instant) -> Self {
        Self {
            window,
            started: now,
            frames: 0,
        }
    }

    /// Records one frame at `now`; returns a sample when the window elapsed.
    pub fn record(&mut self, now: Instant) -> Option<RateSample> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.window {
            return None;
        }

        let secs = elapsed.as_secs_f32();
        let sample = RateSample {
            frames: self.frames,
            fps: self.frames as f32 / secs,
            frame_ms: secs * 1000.0 / self.frames as f32,
        };
        self.started = now;
        self.frames = 0;
        Some(sample)
    }
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
