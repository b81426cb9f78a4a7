//! Decoupling simulation time from frame arrival.
//!
//! [`TimestepMode::Display`] steps once per displayed frame, so simulation
//! speed follows the refresh rate. [`TimestepMode::Fixed`] feeds frame time
//! into a [`FixedStepper`] and advances physics in constant increments.

use tracing::debug;

use crate::simulation::DEFAULT_STEP;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TimestepMode {
    Fixed { step: f32, max_substeps: usize },
    Display,
}

impl Default for TimestepMode {
    fn default() -> Self {
        TimestepMode::Fixed {
            step: DEFAULT_STEP,
            max_substeps: 5,
        }
    }
}

/// Accumulates frame time and hands out whole fixed steps.
#[derive(Clone, Debug)]
pub struct FixedStepper {
    step: f32,
    max_substeps: usize,
    accumulator: f32,
}

impl FixedStepper {
    /// `step` must be positive; non-positive values fall back to
    /// [`DEFAULT_STEP`].
    #[must_use]
    pub fn new(step: f32, max_substeps: usize) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            DEFAULT_STEP
        };
        Self {
            step,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    #[must_use]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Adds `frame_dt` seconds and returns how many fixed steps are due.
    /// Time beyond `max_substeps` steps is dropped.
    pub fn advance(&mut self, frame_dt: f32) -> usize {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }
        let due = (self.accumulator / self.step).floor() as usize;
        let steps = due.min(self.max_substeps);
        self.accumulator -= steps as f32 * self.step;
        if due > steps {
            debug!(
                dropped = due - steps,
                "frame too slow, dropping simulation time"
            );
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    /// Fraction of a step left in the accumulator, for interpolation.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}
