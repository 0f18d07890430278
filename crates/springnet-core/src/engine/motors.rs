use super::config::MotorConfig;
use crate::core::lattice::disorder::{BROKEN_STIFFNESS, BondStiffness};
use crate::core::lattice::geometry::BondDirection;
use crate::core::mechanics::forces::ActiveForces;
use rand::Rng;
use tracing::trace;

/// Exponentially distributed dwell time with the given rate.
#[inline]
pub fn dwell_time(rate: f64, rng: &mut impl Rng) -> f64 {
    let u: f64 = rng.gen_range(0.0..1.0);
    -(1.0 - u).ln() / rate
}

/// Binding state of one motor per bond slot.
///
/// Each slot holds a signed timer: a positive value is the time a bound motor has left
/// before it detaches, a non-positive value is minus the time an unbound slot waits before
/// its next binding attempt.
#[derive(Debug, Clone)]
pub struct MotorField {
    config: MotorConfig,
    timers: Vec<[f64; 3]>,
}

impl MotorField {
    /// Creates a field with every motor unbound and a fresh waiting time on every slot.
    pub fn new(node_count: usize, config: MotorConfig, rng: &mut impl Rng) -> Self {
        let timers = (0..node_count)
            .map(|_| std::array::from_fn(|_| -dwell_time(config.attach_rate, rng)))
            .collect();
        Self { config, timers }
    }

    pub fn from_timers(config: MotorConfig, timers: Vec<[f64; 3]>) -> Self {
        Self { config, timers }
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    #[inline]
    pub fn timer(&self, node: usize, direction: BondDirection) -> f64 {
        self.timers[node][direction.slot()]
    }

    #[inline]
    pub fn is_bound(&self, node: usize, direction: BondDirection) -> bool {
        self.timer(node, direction) > 0.0
    }

    /// Tension a motor adds to its bond: the motor force while bound, zero otherwise.
    #[inline]
    pub fn force(&self, node: usize, direction: BondDirection) -> f64 {
        if self.is_bound(node, direction) {
            self.config.force
        } else {
            0.0
        }
    }

    pub fn bound_fraction(&self) -> f64 {
        if self.timers.is_empty() {
            return 0.0;
        }
        let bound = self
            .timers
            .iter()
            .flat_map(|t| t.iter())
            .filter(|&&t| t > 0.0)
            .count();
        bound as f64 / (3 * self.timers.len()) as f64
    }

    /// Advances every timer by `dt`, binding and unbinding motors whose timers expire.
    ///
    /// Motors never bind to missing bonds: an expired wait on a broken bond just draws
    /// another wait.
    pub fn step(&mut self, stiffness: &BondStiffness, dt: f64, rng: &mut impl Rng) {
        let attach_rate = self.config.attach_rate;
        let detach_rate = self.config.detach_rate;

        for (node, timers) in self.timers.iter_mut().enumerate() {
            let springs = stiffness.node(node);
            for (timer, k) in timers.iter_mut().zip(springs.iter()) {
                if *timer > 0.0 {
                    if *timer <= dt {
                        *timer = -dwell_time(attach_rate, rng);
                    } else {
                        *timer -= dt;
                    }
                } else if *timer >= -dt {
                    *timer = if k.abs() < BROKEN_STIFFNESS {
                        -dwell_time(attach_rate, rng)
                    } else {
                        dwell_time(detach_rate, rng)
                    };
                } else {
                    *timer += dt;
                }
            }
        }

        trace!(bound_fraction = self.bound_fraction(), "Motor timers advanced.");
    }
}

impl ActiveForces for MotorField {
    fn bond_force(&self, node: usize, direction: BondDirection) -> f64 {
        self.force(node, direction)
    }
}
