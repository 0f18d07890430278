use super::config::OscillationConfig;
use super::error::{DivergenceError, DivergentQuantity};
use super::progress::ProgressReporter;
use super::schedule::TimeSchedule;

/// Read-only view of a running oscillatory-shear simulation.
#[derive(Clone, Copy)]
pub struct SimulationContext<'a> {
    pub config: &'a OscillationConfig,
    pub schedule: TimeSchedule,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> SimulationContext<'a> {
    pub fn new(config: &'a OscillationConfig, reporter: &'a ProgressReporter<'a>) -> Self {
        Self {
            config,
            schedule: TimeSchedule::from_dynamics(&config.dynamics),
            reporter,
        }
    }

    /// Builds the error reported when `quantity` stops being finite at `step`.
    pub fn divergence(&self, quantity: DivergentQuantity, step: usize) -> DivergenceError {
        DivergenceError {
            quantity,
            step,
            time: self.schedule.time(step),
            bond_probability: self.config.lattice.bond_probability,
            frequency: self.config.dynamics.frequency,
            size: self.config.lattice.size,
            strain_amplitude: self.config.dynamics.strain_amplitude,
        }
    }
}
