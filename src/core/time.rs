//! Simulation clock

/// Tracks elapsed simulation time and the clamped per-tick delta
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    elapsed: f32,
    delta: f32,
    max_delta: f32,
    frame_count: u64,
}

impl SimClock {
    /// Create a clock that never steps more than `max_delta` seconds at once
    #[must_use]
    pub fn new(max_delta: f32) -> Self {
        Self {
            elapsed: 0.0,
            delta: 0.0,
            max_delta: max_delta.max(0.0),
            frame_count: 0,
        }
    }

    /// Advance by a raw frame delta and return the delta actually applied.
    ///
    /// Negative and NaN deltas count as zero.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        self.delta = if raw_delta.is_nan() {
            0.0
        } else {
            raw_delta.clamp(0.0, self.max_delta)
        };
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.delta
    }

    /// Delta of the last tick in seconds
    #[must_use]
    pub const fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Seconds since the clock started
    #[must_use]
    pub const fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0.1)
    }
}
