use super::seeded_rng;
use crate::core::io::records::{NonaffinitySample, StressSample};
use crate::core::lattice::disorder::BondStiffness;
use crate::core::lattice::network::Network;
use crate::core::lattice::shear::ShearState;
use crate::core::mechanics::energy::elastic_energy;
use crate::core::mechanics::forces::{ActiveForces, compute_bond_forces, compute_stress};
use crate::engine::config::OscillationConfig;
use crate::engine::context::SimulationContext;
use crate::engine::error::{DivergentQuantity, EngineError};
use crate::engine::integrator::OverdampedIntegrator;
use crate::engine::motors::MotorField;
use crate::engine::nonaffinity::{nonaffinity, velocity_nonaffinity};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument, warn};

/// A recorded instant of an oscillation run.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Zero-based frame number.
    pub index: usize,
    pub step: usize,
    pub time: f64,
    pub stress: f64,
    pub strain: f64,
    /// Imposed shear rate at this step.
    pub strain_rate: f64,
    pub nonaffinity: f64,
    /// Velocity non-affinity of the step that led here; zero on the first frame.
    pub velocity_nonaffinity: f64,
    pub network: &'a Network,
    pub shear: &'a ShearState,
}

impl Frame<'_> {
    pub fn stress_sample(&self) -> StressSample {
        StressSample {
            stress: self.stress,
            strain: self.strain,
            time: self.time,
        }
    }

    pub fn nonaffinity_sample(&self) -> NonaffinitySample {
        NonaffinitySample {
            time: self.time,
            affine_offset: self.shear.affine_offset(),
            nonaffinity: self.nonaffinity,
            strain_rate: self.strain_rate,
            velocity_nonaffinity: self.velocity_nonaffinity,
        }
    }
}

/// Receives every frame of an oscillation run as it is produced.
pub trait FrameSink {
    fn record(&mut self, frame: &Frame<'_>) -> Result<(), EngineError>;
}

/// A sink that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardFrames;

impl FrameSink for DiscardFrames {
    fn record(&mut self, _frame: &Frame<'_>) -> Result<(), EngineError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OscillationResult {
    /// One stress sample per frame.
    pub stress_samples: Vec<StressSample>,
    /// One non-affinity sample per frame.
    pub nonaffinity_samples: Vec<NonaffinitySample>,
    /// Elastic energy of the final configuration.
    pub final_energy: f64,
    /// Fraction of motors bound at the end of the run, if motors were enabled.
    pub bound_motor_fraction: Option<f64>,
    pub network: Network,
    pub shear: ShearState,
}

#[instrument(skip_all, name = "oscillation_workflow")]
pub fn run(
    config: &OscillationConfig,
    reporter: &ProgressReporter,
    sink: &mut impl FrameSink,
) -> Result<OscillationResult, EngineError> {
    // === Phase 0: Network generation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let context = SimulationContext::new(config, reporter);
    let schedule = context.schedule;
    let mut rng = seeded_rng(config.seed);

    let geometry = config.lattice.geometry();
    let stiffness = BondStiffness::generate(
        &geometry,
        config.lattice.bond_probability,
        config.lattice.youngs_modulus,
        &mut rng,
    );
    let mut network = Network::new(geometry, stiffness);
    let mut shear = ShearState::unstrained();
    let mut motors = config
        .motors
        .map(|motor_config| MotorField::new(geometry.node_count(), motor_config, &mut rng));
    let mut integrator = OverdampedIntegrator::from_context(&context);

    info!(
        size = geometry.size(),
        bond_probability = config.lattice.bond_probability,
        time_step = schedule.time_step,
        total_steps = schedule.total_steps,
        frame_separation = schedule.frame_separation,
        motors = motors.is_some(),
        "Starting oscillatory shear."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Time integration ===
    reporter.report(Progress::PhaseStart {
        name: "Oscillatory Shear",
    });
    reporter.report(Progress::TaskStart {
        total_steps: schedule.total_steps as u64,
    });

    let viscosity = config
        .dynamics
        .viscous_stress
        .then_some(config.dynamics.viscosity);
    let mut stress_samples = Vec::with_capacity(schedule.frame_count());
    let mut nonaffinity_samples = Vec::with_capacity(schedule.frame_count());

    for step in 0..schedule.total_steps {
        if let Some(motors) = motors.as_mut() {
            motors.step(network.stiffness(), schedule.time_step, &mut rng);
        }

        let active = motors.as_ref().map(|m| m as &dyn ActiveForces);
        let forces = compute_bond_forces(&network, &shear, active, config.dynamics.force_cutoff);
        let strain_rate = schedule.strain_rate(step);
        let stress = compute_stress(&forces, &network, &shear, strain_rate, viscosity);
        if stress.is_nan() {
            warn!(step, "Stress is no longer finite; aborting run.");
            return Err(context.divergence(DivergentQuantity::Stress, step).into());
        }

        if schedule.is_frame(step) {
            let velocity_nonaffinity = if step == 0 {
                0.0
            } else {
                velocity_nonaffinity(
                    integrator.displacements(),
                    &geometry,
                    schedule.strain_rate(step - 1),
                    schedule.time_step,
                )
            };
            let frame = Frame {
                index: step / schedule.frame_separation,
                step,
                time: schedule.time(step),
                stress,
                strain: shear.strain(&geometry),
                strain_rate,
                nonaffinity: nonaffinity(&network, &shear),
                velocity_nonaffinity,
                network: &network,
                shear: &shear,
            };
            debug!(frame = frame.index, stress, strain = frame.strain, "Frame recorded.");
            sink.record(&frame)?;
            stress_samples.push(frame.stress_sample());
            nonaffinity_samples.push(frame.nonaffinity_sample());
        }

        integrator.step(&mut network, &mut shear, &forces, &mut rng, &context, step)?;

        if (step + 1) % schedule.frame_separation == 0 {
            reporter.report(Progress::TaskAdvance {
                steps: schedule.frame_separation as u64,
            });
        }
    }

    let remainder = schedule.total_steps % schedule.frame_separation;
    if remainder > 0 {
        reporter.report(Progress::TaskAdvance {
            steps: remainder as u64,
        });
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Final state ===
    let final_energy = elastic_energy(&network, &shear);
    let bound_motor_fraction = motors.as_ref().map(MotorField::bound_fraction);
    info!(
        final_energy,
        frames = stress_samples.len(),
        "Oscillatory shear complete."
    );

    Ok(OscillationResult {
        stress_samples,
        nonaffinity_samples,
        final_energy,
        bound_motor_fraction,
        network,
        shear,
    })
}
