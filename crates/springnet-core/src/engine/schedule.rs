use super::config::DynamicsConfig;
use std::f64::consts::PI;

/// Frequencies at or below this are treated as a static (non-oscillating) drive.
pub const STATIC_FREQUENCY: f64 = 1e-15;

/// Steps per oscillation used when the drive does not oscillate.
pub const STATIC_STEPS_PER_OSCILLATION: usize = 1000;

/// Time discretization of an oscillatory-shear run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSchedule {
    pub time_step: f64,
    pub steps_per_oscillation: usize,
    pub total_steps: usize,
    /// Number of steps between two recorded frames.
    pub frame_separation: usize,
    strain_amplitude: f64,
    frequency: f64,
}

impl TimeSchedule {
    /// Resolves a period into at least a thousand steps, capped at `max_time_step`.
    pub fn from_dynamics(dynamics: &DynamicsConfig) -> Self {
        let omega = dynamics.frequency;
        let (time_step, steps_per_oscillation) = if omega <= STATIC_FREQUENCY {
            (dynamics.max_time_step, STATIC_STEPS_PER_OSCILLATION)
        } else {
            let dt = (2.0 * PI / (1000.0 * omega)).min(dynamics.max_time_step);
            // The nudge keeps an exact multiple from flooring one step short.
            let steps = (2.0 * PI / (omega * dt) + 1e-9).floor() as usize;
            (dt, steps.max(1))
        };
        let frame_separation = (steps_per_oscillation / dynamics.outputs_per_oscillation).max(1);

        Self {
            time_step,
            steps_per_oscillation,
            total_steps: steps_per_oscillation * dynamics.num_oscillations,
            frame_separation,
            strain_amplitude: dynamics.strain_amplitude,
            frequency: omega,
        }
    }

    #[inline]
    pub fn time(&self, step: usize) -> f64 {
        step as f64 * self.time_step
    }

    /// Imposed shear rate `γ₀ ω cos(ω t)` at `step`.
    #[inline]
    pub fn strain_rate(&self, step: usize) -> f64 {
        self.strain_amplitude * self.frequency * (self.frequency * self.time(step)).cos()
    }

    #[inline]
    pub fn is_frame(&self, step: usize) -> bool {
        step % self.frame_separation == 0
    }

    pub fn frame_count(&self) -> usize {
        self.total_steps.div_ceil(self.frame_separation)
    }
}
