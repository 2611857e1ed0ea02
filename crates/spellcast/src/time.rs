//! Frame timing.
//!
//! [`TickStep`] is the value every system and behavior sees for one frame.
//! [`Time`] accumulates it so code outside the frame (the host, diagnostics)
//! can read totals.

/// Timing for one frame. Produced once per frame by the scheduler and passed
/// unchanged to every system and entity behavior run in that frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickStep {
    /// Monotonic clock reading for this frame, in seconds.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// Accumulated frame timing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    /// The most recent step.
    last: TickStep,
    /// Total simulated time (sum of deltas; excludes time spent paused).
    elapsed: f32,
    /// Frame counter.
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed step.
    pub(crate) fn advance(&mut self, step: TickStep) {
        self.last = step;
        self.elapsed += step.delta;
        self.frame_count += 1;
    }

    /// The step of the most recent frame.
    pub fn last_step(&self) -> TickStep {
        self.last
    }

    /// Delta time in seconds of the most recent frame.
    pub fn delta_secs(&self) -> f32 {
        self.last.delta
    }

    /// Simulated seconds, not counting paused time.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed
    }

    /// Number of frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.last.delta > 0.0 {
            1.0 / self.last.delta
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut time = Time::new();
        time.advance(TickStep { time: 1.0, delta: 0.5 });
        time.advance(TickStep { time: 1.25, delta: 0.25 });
        assert_eq!(time.frame_count(), 2);
        assert_eq!(time.elapsed_secs(), 0.75);
        assert_eq!(time.delta_secs(), 0.25);
        assert_eq!(time.fps(), 4.0);
    }

    #[test]
    fn fps_is_zero_before_first_frame() {
        assert_eq!(Time::new().fps(), 0.0);
    }
}
