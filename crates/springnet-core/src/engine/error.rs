use super::config::ConfigError;
use crate::core::io::OutputError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Divergence(#[from] DivergenceError),

    #[error("Minimization failed: {0}")]
    Convergence(#[from] ConvergenceError),

    #[error("Failed to record a frame: {0}")]
    Output(#[from] OutputError),
}

/// The quantity that stopped being finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DivergentQuantity {
    Position { node: usize },
    Stress,
}

impl fmt::Display for DivergentQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergentQuantity::Position { node } => write!(f, "position of node {node}"),
            DivergentQuantity::Stress => write!(f, "stress"),
        }
    }
}

/// A NaN appeared during time integration.
///
/// Carries the run parameters so a failed run in a parameter sweep can be identified.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "Simulation diverged: {quantity} is not finite at step {step} (t = {time}); \
     p = {bond_probability}, ω = {frequency}, N = {size}, γ₀ = {strain_amplitude}"
)]
pub struct DivergenceError {
    pub quantity: DivergentQuantity,
    pub step: usize,
    pub time: f64,
    pub bond_probability: f64,
    pub frequency: f64,
    pub size: usize,
    pub strain_amplitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvergenceError {
    #[error("Conjugate gradient did not converge after {iterations} iterations")]
    TooManyIterations { iterations: usize },

    #[error("Line minimization did not converge after {iterations} iterations")]
    LineSearch { iterations: usize },

    #[error("Could not bracket a minimum after {expansions} expansions")]
    Bracket { expansions: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_message_names_the_run() {
        let error = DivergenceError {
            quantity: DivergentQuantity::Position { node: 17 },
            step: 42,
            time: 0.5,
            bond_probability: 0.6,
            frequency: 2.0,
            size: 10,
            strain_amplitude: 0.01,
        };
        let message = EngineError::from(error).to_string();
        assert!(message.contains("position of node 17"));
        assert!(message.contains("step 42"));
        assert!(message.contains("p = 0.6"));
        assert!(message.contains("N = 10"));
    }

    #[test]
    fn convergence_errors_convert_into_engine_errors() {
        let error: EngineError = ConvergenceError::LineSearch { iterations: 1000 }.into();
        assert!(matches!(
            error,
            EngineError::Convergence(ConvergenceError::LineSearch { iterations: 1000 })
        ));
    }
}
