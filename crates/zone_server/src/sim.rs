//! Fixed-step simulation clock of one zone.
//!
//! Wall-clock deltas are decomposed into whole frames of `1_000_000 / fps`
//! microseconds. The remainder carries into the next update, so the number
//! of steps only depends on the total time fed in, not on how it was chunked.

use std::time::Duration;

/// Default simulation rate of a zone.
pub const DEFAULT_SIM_FPS: u32 = 64;

/// One elapsed simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimFrame {
    /// Zone clock after this step, in microseconds.
    pub timestamp: u64,
    /// Length of the step, in microseconds.
    pub period: u64,
}

impl SimFrame {
    pub fn dt_seconds(&self) -> f64 {
        self.period as f64 / 1_000_000.0
    }
}

#[derive(Debug, Clone)]
pub struct Sim {
    timestamp: u64,
    carry: u64,
    fps: u32,
    steps: u64,
}

impl Sim {
    pub fn new(fps: u32) -> Self {
        Self {
            timestamp: 0,
            carry: 0,
            fps: fps.max(1),
            steps: 0,
        }
    }

    /// Frame period in microseconds.
    pub fn frame_period(&self) -> u64 {
        1_000_000 / self.fps as u64
    }

    /// Zone clock at the last completed step.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Time fed in but not yet consumed by a step.
    pub fn carry(&self) -> u64 {
        self.carry
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Total steps performed since creation.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances the clock by `delta`, calling `step` once per whole frame.
    /// Returns the number of steps performed.
    pub fn update<F: FnMut(SimFrame)>(&mut self, delta: Duration, mut step: F) -> u64 {
        let period = self.frame_period();
        self.carry = self.carry.saturating_add(delta.as_micros().min(u64::MAX as u128) as u64);

        let mut performed = 0;
        while self.carry >= period {
            self.carry -= period;
            self.timestamp += period;
            step(SimFrame {
                timestamp: self.timestamp,
                period,
            });
            performed += 1;
        }

        self.steps += performed;
        performed
    }
}

impl Default for Sim {
    fn default() -> Self {
        Self::new(DEFAULT_SIM_FPS)
    }
}
