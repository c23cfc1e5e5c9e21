//! Fixed-timestep clock
//!
//! Turns variable wall-clock deltas into whole simulation ticks. At most
//! `max_substeps` ticks run per callback; anything beyond that is dropped so
//! the leftover debt stays under one tick.

use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct FixedClock {
    step: f64,
    accumulator: f64,
    max_substeps: u32,
    ticks: u64,
}

impl FixedClock {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step: step.max(f32::EPSILON) as f64,
            accumulator: 0.0,
            max_substeps: max_substeps.max(1),
            ticks: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.tick_dt(), settings.max_substeps)
    }

    /// Feed elapsed seconds, running `step_fn` once per due tick
    ///
    /// Returns the number of ticks run.
    pub fn advance(&mut self, elapsed: f32, mut step_fn: impl FnMut(f32)) -> u32 {
        if !elapsed.is_finite() || elapsed < 0.0 {
            log::debug!("Ignoring bogus clock delta {}", elapsed);
            return 0;
        }
        self.accumulator += elapsed as f64;

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            step_fn(self.step as f32);
            self.accumulator -= self.step;
            substeps += 1;
        }
        self.ticks += substeps as u64;

        if self.accumulator >= self.step {
            let dropped = (self.accumulator / self.step).floor();
            log::warn!(
                "Simulation fell behind, dropping {} ticks ({:.3}s)",
                dropped,
                dropped * self.step
            );
            self.accumulator %= self.step;
        }
        substeps
    }

    /// Unsimulated time, always below one step
    pub fn debt(&self) -> f32 {
        self.accumulator as f32
    }

    /// Fraction of the next tick already elapsed (for interpolation)
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step) as f32
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn step(&self) -> f32 {
        self.step as f32
    }
}
