//! Fixed-step frame timing.
//!
//! Particle aging and emission are driven by the `dt` the host passes in.
//! [`FrameClock`] turns irregular wall-clock frames into a whole number of
//! fixed steps so a host loop can call `update` with the same `dt` every
//! time:
//!
//! ```ignore
//! use motes::clock::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In your frame loop:
//! for _ in 0..clock.tick() {
//!     system.update(clock.step());
//!     emitter.update(clock.step());
//! }
//! system.render(&mut surface)?;
//! ```

use std::time::{Duration, Instant};

/// Default fixed step, one sixtieth of a second.
pub const DEFAULT_STEP: Duration = Duration::from_nanos(16_666_667);

/// Upper bound on steps returned by a single call, so a stalled frame does
/// not trigger an unbounded catch-up.
pub const MAX_STEPS_PER_FRAME: u32 = 8;

/// Accumulating fixed-step clock with pause and time scale.
#[derive(Debug)]
pub struct FrameClock {
    step: Duration,
    last_frame: Instant,
    accumulated: Duration,
    /// Simulated time handed out as steps.
    elapsed: Duration,
    frame_count: u64,
    paused: bool,
    time_scale: f32,
}

impl FrameClock {
    /// Create a clock with [`DEFAULT_STEP`], starting from now.
    pub fn new() -> Self {
        Self::with_step(DEFAULT_STEP)
    }

    /// Create a clock with a custom fixed step. A zero step is replaced by
    /// [`DEFAULT_STEP`].
    pub fn with_step(step: Duration) -> Self {
        Self {
            step: if step.is_zero() { DEFAULT_STEP } else { step },
            last_frame: Instant::now(),
            accumulated: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            paused: false,
            time_scale: 1.0,
        }
    }

    /// The fixed `dt` to pass to each update.
    #[inline]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Measure the wall-clock time since the last tick and return the number
    /// of fixed steps now due.
    pub fn tick(&mut self) -> u32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(raw)
    }

    /// Feed `raw` frame time into the accumulator and return the number of
    /// fixed steps now due.
    ///
    /// Returns 0 while paused. When more than [`MAX_STEPS_PER_FRAME`] steps
    /// are due, the excess is dropped.
    pub fn advance(&mut self, raw: Duration) -> u32 {
        self.frame_count += 1;
        if self.paused {
            return 0;
        }

        self.accumulated += if self.time_scale == 1.0 {
            raw
        } else {
            raw.mul_f64(self.time_scale as f64)
        };

        let mut steps = 0;
        while self.accumulated >= self.step {
            self.accumulated -= self.step;
            steps += 1;
            if steps == MAX_STEPS_PER_FRAME {
                log::debug!("Frame clock fell behind, dropping {:?}", self.accumulated);
                self.accumulated = Duration::ZERO;
                break;
            }
        }
        self.elapsed += self.step * steps;
        steps
    }

    /// Simulated time handed out so far.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Frames seen by [`tick`](Self::tick) or [`advance`](Self::advance).
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop handing out steps.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after pausing. Time spent paused is not simulated.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    ///
    /// Negative and non-finite values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
