//! Polak–Ribière conjugate-gradient minimization.
//!
//! The outer loop lives here; [`linmin`] performs the line minimizations, built from a
//! golden-section [`bracket`] search and Brent's method with derivatives ([`dbrent`]).

pub mod bracket;
pub mod dbrent;
pub mod linmin;

use super::config::MinimizerConfig;
use super::error::ConvergenceError;
use super::progress::{Progress, ProgressReporter};
use crate::core::mechanics::energy::ElasticEnergy;
use linmin::line_minimize;
use tracing::{debug, trace};

/// Guards the relative energy test against a minimum at exactly zero.
const EPS: f64 = 1.0e-18;

/// A differentiable scalar function of a flat coordinate vector.
pub trait Objective {
    fn dimension(&self) -> usize;
    fn value(&self, x: &[f64]) -> f64;
    /// Writes the gradient at `x` into `out`.
    fn gradient(&self, x: &[f64], out: &mut [f64]);
}

impl Objective for ElasticEnergy<'_> {
    fn dimension(&self) -> usize {
        self.geometry().dof()
    }

    fn value(&self, x: &[f64]) -> f64 {
        ElasticEnergy::value(self, x)
    }

    fn gradient(&self, x: &[f64], out: &mut [f64]) {
        ElasticEnergy::gradient(self, x, out)
    }
}

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Two successive line minima agreed to within the relative energy tolerance.
    EnergyTolerance,
    /// The scaled gradient fell below the gradient tolerance.
    GradientTolerance,
    /// The gradient vanished exactly.
    ZeroGradient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationReport {
    pub iterations: usize,
    pub energy: f64,
    /// Objective value at the start and after every iteration.
    pub energy_trace: Vec<f64>,
    pub termination: Termination,
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[derive(Debug, Clone, Copy)]
pub struct ConjugateGradient {
    config: MinimizerConfig,
}

impl ConjugateGradient {
    pub fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    /// Minimizes `objective` in place, starting from and overwriting `x`.
    pub fn minimize<O: Objective + ?Sized>(
        &self,
        objective: &O,
        x: &mut [f64],
        reporter: &ProgressReporter,
    ) -> Result<MinimizationReport, ConvergenceError> {
        debug_assert_eq!(x.len(), objective.dimension());
        let n = x.len();

        let mut fp = objective.value(x);
        let mut energy_trace = vec![fp];
        let mut gradient = vec![0.0; n];
        objective.gradient(x, &mut gradient);

        let finish = |iterations: usize,
                      energy: f64,
                      energy_trace: Vec<f64>,
                      termination: Termination|
         -> Result<MinimizationReport, ConvergenceError> {
            debug!(iterations, energy, ?termination, "Conjugate gradient finished.");
            Ok(MinimizationReport {
                iterations,
                energy,
                energy_trace,
                termination,
            })
        };

        if gradient.iter().all(|&g| g == 0.0) {
            return finish(0, fp, energy_trace, Termination::ZeroGradient);
        }

        // `g` is the previous steepest-descent direction, `h` the previous conjugate direction;
        // `xi` carries the current search direction into each line minimization.
        let mut g: Vec<f64> = gradient.iter().map(|v| -v).collect();
        let mut h = g.clone();
        let mut xi = g.clone();

        for iteration in 1..=self.config.max_iterations {
            let fret = line_minimize(objective, x, &mut xi, self.config.line_tolerance)?;
            energy_trace.push(fret);
            trace!(iteration, energy = fret, "Line minimization complete.");
            reporter.report(Progress::Iteration {
                iteration,
                energy: fret,
            });

            if 2.0 * (fret - fp).abs() <= self.config.ftol * (fret.abs() + fp.abs() + EPS) {
                return finish(iteration, fret, energy_trace, Termination::EnergyTolerance);
            }
            fp = fret;

            objective.gradient(x, &mut xi);
            let den = fp.max(1.0);
            let test = xi
                .iter()
                .zip(x.iter())
                .map(|(gj, pj)| gj.abs() * pj.abs().max(1.0) / den)
                .fold(0.0, f64::max);
            if test < self.config.gtol {
                return finish(iteration, fp, energy_trace, Termination::GradientTolerance);
            }

            let gg = dot(&g, &g);
            // Polak–Ribière: (∇f_new - ∇f_old) · ∇f_new, with g holding -∇f_old.
            let dgg: f64 = xi.iter().zip(&g).map(|(x, g)| (x + g) * x).sum();
            if gg == 0.0 {
                return finish(iteration, fp, energy_trace, Termination::ZeroGradient);
            }
            let gam = dgg / gg;
            for j in 0..n {
                g[j] = -xi[j];
                h[j] = g[j] + gam * h[j];
                xi[j] = h[j];
            }
        }

        Err(ConvergenceError::TooManyIterations {
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::disorder::BondStiffness;
    use crate::core::lattice::geometry::LatticeGeometry;
    use crate::core::lattice::network::Network;
    use crate::core::lattice::shear::ShearState;
    use crate::core::mechanics::energy::elastic_energy;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct Quadratic {
        diagonal: Vec<f64>,
        coupling: f64,
        center: Vec<f64>,
    }

    impl Objective for Quadratic {
        fn dimension(&self) -> usize {
            self.diagonal.len()
        }

        fn value(&self, x: &[f64]) -> f64 {
            let d: Vec<f64> = x.iter().zip(&self.center).map(|(x, c)| x - c).collect();
            let mut f = 0.0;
            for i in 0..d.len() {
                f += 0.5 * self.diagonal[i] * d[i] * d[i];
                if i + 1 < d.len() {
                    f += self.coupling * d[i] * d[i + 1];
                }
            }
            f
        }

        fn gradient(&self, x: &[f64], out: &mut [f64]) {
            let d: Vec<f64> = x.iter().zip(&self.center).map(|(x, c)| x - c).collect();
            for i in 0..d.len() {
                out[i] = self.diagonal[i] * d[i];
                if i + 1 < d.len() {
                    out[i] += self.coupling * d[i + 1];
                }
                if i > 0 {
                    out[i] += self.coupling * d[i - 1];
                }
            }
        }
    }

    struct Rosenbrock;

    impl Objective for Rosenbrock {
        fn dimension(&self) -> usize {
            2
        }

        fn value(&self, x: &[f64]) -> f64 {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        }

        fn gradient(&self, x: &[f64], out: &mut [f64]) {
            out[0] = -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]);
            out[1] = 200.0 * (x[1] - x[0] * x[0]);
        }
    }

    fn minimizer() -> ConjugateGradient {
        ConjugateGradient::new(MinimizerConfig {
            max_iterations: 10_000,
            ..MinimizerConfig::default()
        })
    }

    #[test]
    fn converges_on_coupled_quadratic() {
        let objective = Quadratic {
            diagonal: vec![2.0, 3.0, 4.0, 5.0, 6.0],
            coupling: 0.5,
            center: vec![1.0, -1.0, 2.0, 0.5, -3.0],
        };
        let mut x = vec![0.0; 5];
        let report = minimizer()
            .minimize(&objective, &mut x, &ProgressReporter::new())
            .unwrap();
        for (xi, ci) in x.iter().zip(&objective.center) {
            assert!((xi - ci).abs() < 1e-4, "{x:?}");
        }
        assert!(report.energy < 1e-8);
    }

    #[test]
    fn converges_on_rosenbrock() {
        let cg = ConjugateGradient::new(MinimizerConfig {
            ftol: 1e-12,
            max_iterations: 10_000,
            ..MinimizerConfig::default()
        });
        let mut x = vec![-1.2, 1.0];
        let report = cg
            .minimize(&Rosenbrock, &mut x, &ProgressReporter::new())
            .unwrap();
        assert!((x[0] - 1.0).abs() < 1e-3, "{x:?}");
        assert!((x[1] - 1.0).abs() < 1e-3, "{x:?}");
        assert!(report.energy < 1e-6);
    }

    #[test]
    fn stationary_start_needs_no_iterations() {
        let geometry = LatticeGeometry::new(4, 1.0);
        let network = Network::new(geometry, BondStiffness::uniform(&geometry, 1.0));
        let energy = ElasticEnergy::for_network(&network, ShearState::unstrained());
        let mut x = network.positions().as_slice().to_vec();
        let report = minimizer()
            .minimize(&energy, &mut x, &ProgressReporter::new())
            .unwrap();
        assert!(report.iterations <= 1);
        assert!(report.energy < 1e-20);
    }

    #[test]
    fn relaxes_sheared_diluted_network_monotonically() {
        let geometry = LatticeGeometry::new(4, 1.0);
        let mut rng = StdRng::seed_from_u64(12);
        let stiffness = BondStiffness::generate(&geometry, 0.8, 1.0, &mut rng);
        let shear = ShearState::from_strain(0.05, &geometry);
        let mut network = Network::affinely_sheared(geometry, stiffness, &shear);
        for v in network.positions_mut().iter_mut() {
            *v += rng.gen_range(-0.02..0.02);
        }
        let start = elastic_energy(&network, &shear);

        let energy = ElasticEnergy::for_network(&network, shear);
        let mut x = network.positions().as_slice().to_vec();
        let report = minimizer()
            .minimize(&energy, &mut x, &ProgressReporter::new())
            .unwrap();

        assert!(report.energy <= start);
        for pair in report.energy_trace.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-15, "energy rose: {pair:?}");
        }
        assert!((energy.value(&x) - report.energy).abs() < 1e-12);
    }

    #[test]
    fn uniform_network_relaxes_to_at_most_the_affine_energy() {
        let geometry = LatticeGeometry::new(4, 1.0);
        let shear = ShearState::from_strain(0.05, &geometry);
        let network =
            Network::affinely_sheared(geometry, BondStiffness::uniform(&geometry, 1.0), &shear);
        let affine = elastic_energy(&network, &shear);

        let energy = ElasticEnergy::for_network(&network, shear);
        let mut x = network.positions().as_slice().to_vec();
        let report = minimizer()
            .minimize(&energy, &mut x, &ProgressReporter::new())
            .unwrap();
        assert!(report.energy <= affine + 1e-15);
        assert!(report.energy > 0.0);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let cg = ConjugateGradient::new(MinimizerConfig {
            max_iterations: 1,
            ftol: 1e-30,
            gtol: 1e-30,
            ..MinimizerConfig::default()
        });
        let mut x = vec![-1.2, 1.0];
        let result = cg.minimize(&Rosenbrock, &mut x, &ProgressReporter::new());
        assert_eq!(
            result,
            Err(ConvergenceError::TooManyIterations { iterations: 1 })
        );
    }
}
