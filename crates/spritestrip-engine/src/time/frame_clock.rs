use std::time::{Duration, Instant};

/// Timing of one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped seconds since the previous tick.
    pub dt: f32,
    /// Sum of clamped `dt` since the clock started. Animation time.
    pub elapsed: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces [`FrameTime`]s.
///
/// `dt` is clamped so a debugger pause or a minimized window does not fling
/// sprites across the screen on the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Moves the baseline to now, e.g. after the window was restored.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// `tick` with an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max)
            .as_secs_f32();

        self.last = now;
        self.elapsed += dt;

        let ft = FrameTime {
            dt,
            elapsed: self.elapsed,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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
    fn long_stall_is_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn elapsed_accumulates_and_index_advances() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        clock.tick_at(start + Duration::from_millis(10));
        let ft = clock.tick_at(start + Duration::from_millis(30));
        assert!((ft.dt - 0.02).abs() < 1e-6);
        assert!((ft.elapsed - 0.03).abs() < 1e-6);
        assert_eq!(ft.frame_index, 1);
    }
}
