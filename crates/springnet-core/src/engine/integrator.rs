use super::context::SimulationContext;
use super::error::{DivergentQuantity, EngineError};
use crate::core::lattice::geometry::LatticeGeometry;
use crate::core::lattice::network::Network;
use crate::core::lattice::shear::ShearState;
use crate::core::mechanics::forces::BondForces;
use nalgebra::Vector2;
use rand::Rng;
use std::f64::consts::PI;

/// Temperatures at or below this skip the thermal kick entirely.
pub const ZERO_TEMPERATURE: f64 = 1e-15;

/// Imposed affine flow velocity of `row` at shear rate `strain_rate`.
#[inline]
pub fn affine_velocity(geometry: &LatticeGeometry, strain_rate: f64, row: usize) -> f64 {
    strain_rate * geometry.row_height() * (row as f64 - geometry.mid_row())
}

/// Two independent normal deviates of standard deviation `sigma` (Box–Muller).
pub fn gaussian_pair(sigma: f64, rng: &mut impl Rng) -> Vector2<f64> {
    let theta = 2.0 * PI * rng.gen_range(0.0..1.0);
    let u: f64 = 1.0 - rng.gen_range(0.0..1.0);
    let radius = sigma * (-2.0 * u.ln()).sqrt();
    Vector2::new(radius * theta.cos(), radius * theta.sin())
}

/// Explicit Euler integrator for overdamped (Brownian) node dynamics in an affine shear flow.
///
/// A node moves by `Δt (F / γ + v_affine)` plus, at finite temperature, a Gaussian kick of
/// variance `2 D Δt` per axis with `D = k_B T / γ`.
#[derive(Debug, Clone)]
pub struct OverdampedIntegrator {
    drag: f64,
    temperature: f64,
    time_step: f64,
    displacements: Vec<f64>,
}

impl OverdampedIntegrator {
    pub fn new(drag: f64, temperature: f64, time_step: f64, dof: usize) -> Self {
        Self {
            drag,
            temperature,
            time_step,
            displacements: vec![0.0; dof],
        }
    }

    pub fn from_context(context: &SimulationContext) -> Self {
        let dynamics = &context.config.dynamics;
        Self::new(
            dynamics.drag(),
            dynamics.temperature,
            context.schedule.time_step,
            2 * context.config.lattice.size * context.config.lattice.size,
        )
    }

    pub fn drag(&self) -> f64 {
        self.drag
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Diffusion constant `D = k_B T / γ` with `k_B = 1`.
    pub fn diffusion(&self) -> f64 {
        self.temperature / self.drag
    }

    /// Per-node displacement of the most recent step, interleaved `(x, y)`.
    pub fn displacements(&self) -> &[f64] {
        &self.displacements
    }

    fn thermal_sigma(&self) -> Option<f64> {
        (self.temperature > ZERO_TEMPERATURE)
            .then(|| (2.0 * self.diffusion() * self.time_step).sqrt())
    }

    /// Moves every node one time step and advances the boundary with the affine flow.
    ///
    /// Displacements are computed for all nodes from `forces` before any node moves. The
    /// shear rate is the one the schedule imposes at `step`.
    pub fn step(
        &mut self,
        network: &mut Network,
        shear: &mut ShearState,
        forces: &BondForces,
        rng: &mut impl Rng,
        context: &SimulationContext,
        step: usize,
    ) -> Result<(), EngineError> {
        let geometry = *network.geometry();
        let dt = self.time_step;
        let strain_rate = context.schedule.strain_rate(step);
        let sigma = self.thermal_sigma();

        for row in 0..geometry.size() {
            let drift = affine_velocity(&geometry, strain_rate, row);
            for col in 0..geometry.size() {
                let node = geometry.index(row, col);
                let force = forces.net_force(&geometry, row, col);
                let kick = sigma.map_or_else(Vector2::zeros, |s| gaussian_pair(s, rng));
                self.displacements[2 * node] = dt * (force.x / self.drag + drift) + kick.x;
                self.displacements[2 * node + 1] = dt * force.y / self.drag + kick.y;
            }
        }

        for (position, delta) in network.positions_mut().iter_mut().zip(&self.displacements) {
            *position += delta;
        }
        if let Some(node) = network.first_nan_node() {
            return Err(context
                .divergence(DivergentQuantity::Position { node }, step)
                .into());
        }

        shear.advance(affine_velocity(&geometry, strain_rate, geometry.size() - 1) * dt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::disorder::BondStiffness;
    use crate::core::mechanics::forces::{ForceCutoff, compute_bond_forces};
    use crate::engine::config::{OscillationConfig, OscillationConfigBuilder};
    use crate::engine::progress::ProgressReporter;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(size: usize, temperature: f64, frequency: f64) -> OscillationConfig {
        OscillationConfigBuilder::new()
            .size(size)
            .bond_probability(1.0)
            .strain_amplitude(0.3)
            .frequency(frequency)
            .temperature(temperature)
            .build()
            .unwrap()
    }

    fn rest_network(size: usize) -> Network {
        let geometry = LatticeGeometry::new(size, 1.0);
        Network::new(geometry, BondStiffness::uniform(&geometry, 1.0))
    }

    #[test]
    fn force_free_lattice_follows_affine_flow() {
        let config = config(5, 0.0, 1.0);
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&config, &reporter);
        let mut integrator = OverdampedIntegrator::from_context(&context);
        let mut rng = StdRng::seed_from_u64(1);

        let mut network = rest_network(5);
        let geometry = *network.geometry();
        let mut shear = ShearState::unstrained();
        let forces = BondForces::zeros(geometry.node_count());
        let rate = context.schedule.strain_rate(0);
        assert!((rate - 0.3).abs() < 1e-15);
        integrator
            .step(&mut network, &mut shear, &forces, &mut rng, &context, 0)
            .unwrap();

        let dt = integrator.time_step();
        for row in 0..5 {
            let moved = network.position(row, 2) - geometry.rest_position(row, 2);
            assert!((moved.x - dt * affine_velocity(&geometry, rate, row)).abs() < 1e-14);
            assert_eq!(moved.y, 0.0);
        }
        let expected_offset = rate * geometry.row_height() * geometry.mid_row() * dt;
        assert!((shear.affine_offset() - expected_offset).abs() < 1e-15);
        assert!((shear.strain(&geometry) - rate * dt).abs() < 1e-14);
    }

    #[test]
    fn displacement_is_force_over_drag() {
        let config = config(4, 0.0, 0.0);
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&config, &reporter);
        let mut integrator = OverdampedIntegrator::from_context(&context);
        let mut rng = StdRng::seed_from_u64(2);

        let mut network = rest_network(4);
        let geometry = *network.geometry();
        let node = geometry.index(1, 1);
        network.positions_mut()[2 * node + 1] += 0.1;
        let mut shear = ShearState::unstrained();
        let forces = compute_bond_forces(&network, &shear, None, ForceCutoff::Disabled);
        let expected =
            forces.net_force(&geometry, 1, 1) * integrator.time_step() / integrator.drag();

        integrator
            .step(&mut network, &mut shear, &forces, &mut rng, &context, 0)
            .unwrap();

        let moved = Vector2::new(
            integrator.displacements()[2 * node],
            integrator.displacements()[2 * node + 1],
        );
        assert!((moved - expected).norm() < 1e-15);
        assert!(moved.y < 0.0);
    }

    #[test]
    fn nan_position_is_reported_with_its_node() {
        let config = config(4, 0.0, 0.0);
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&config, &reporter);
        let mut integrator = OverdampedIntegrator::from_context(&context);
        let mut rng = StdRng::seed_from_u64(3);

        let mut network = rest_network(4);
        network.positions_mut()[11] = f64::NAN;
        let mut shear = ShearState::unstrained();
        let forces = BondForces::zeros(16);

        let error = integrator
            .step(&mut network, &mut shear, &forces, &mut rng, &context, 9)
            .unwrap_err();
        match error {
            EngineError::Divergence(divergence) => {
                assert_eq!(divergence.quantity, DivergentQuantity::Position { node: 5 });
                assert_eq!(divergence.step, 9);
                assert_eq!(divergence.size, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn thermal_kicks_have_variance_two_d_dt() {
        let config = config(30, 0.5, 0.0);
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&config, &reporter);
        let mut integrator = OverdampedIntegrator::from_context(&context);
        let mut rng = StdRng::seed_from_u64(4);

        let mut network = rest_network(30);
        let mut shear = ShearState::unstrained();
        let forces = BondForces::zeros(900);
        let mut sum_sq = 0.0;
        let mut count = 0usize;
        for step in 0..20 {
            integrator
                .step(&mut network, &mut shear, &forces, &mut rng, &context, step)
                .unwrap();
            sum_sq += integrator.displacements().iter().map(|d| d * d).sum::<f64>();
            count += integrator.displacements().len();
        }
        let variance = sum_sq / count as f64;
        let expected = 2.0 * integrator.diffusion() * integrator.time_step();
        assert!(
            (variance / expected - 1.0).abs() < 0.05,
            "variance {variance}, expected {expected}"
        );
    }

    #[test]
    fn gaussian_pair_is_centered() {
        let mut rng = StdRng::seed_from_u64(5);
        let n = 100_000;
        let mean = (0..n)
            .map(|_| gaussian_pair(1.0, &mut rng))
            .fold(Vector2::zeros(), |acc, v| acc + v)
            / n as f64;
        assert!(mean.norm() < 0.02);
    }
}
