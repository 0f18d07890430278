use crate::core::lattice::geometry::LatticeGeometry;
use crate::core::mechanics::forces::ForceCutoff;
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a positive number, got {value}")))
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a non-negative number, got {value}")))
    }
}

fn require_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite, got {value}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeConfig {
    pub size: usize,
    /// Probability that any given bond is present, in `[0, 1]`.
    pub bond_probability: f64,
    pub youngs_modulus: f64,
    pub rest_length: f64,
}

impl LatticeConfig {
    pub const DEFAULT_YOUNGS_MODULUS: f64 = 1.0;
    pub const DEFAULT_REST_LENGTH: f64 = 1.0;

    pub fn geometry(&self) -> LatticeGeometry {
        LatticeGeometry::new(self.size, self.rest_length)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.size < 2 {
            return Err(invalid("size", format!("must be at least 2, got {}", self.size)));
        }
        if !(0.0..=1.0).contains(&self.bond_probability) {
            return Err(invalid(
                "bond_probability",
                format!("must lie in [0, 1], got {}", self.bond_probability),
            ));
        }
        require_finite("youngs_modulus", self.youngs_modulus)?;
        require_positive("rest_length", self.rest_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsConfig {
    /// Peak shear strain `γ₀` of the oscillation.
    pub strain_amplitude: f64,
    /// Angular frequency `ω` of the oscillation.
    pub frequency: f64,
    pub num_oscillations: usize,
    pub outputs_per_oscillation: usize,
    pub temperature: f64,
    pub viscosity: f64,
    pub drag_radius: f64,
    /// Geometric prefactor `c` of the drag `c π η R`.
    pub drag_coefficient: f64,
    pub max_time_step: f64,
    /// Add the solvent contribution `η γ̇` to the reported stress.
    pub viscous_stress: bool,
    pub force_cutoff: ForceCutoff,
}

impl DynamicsConfig {
    pub const DEFAULT_NUM_OSCILLATIONS: usize = 6;
    pub const DEFAULT_OUTPUTS_PER_OSCILLATION: usize = 20;
    pub const DEFAULT_VISCOSITY: f64 = 1.0;
    pub const DEFAULT_DRAG_RADIUS: f64 = 1.0;
    pub const DEFAULT_DRAG_COEFFICIENT: f64 = 4.0;
    pub const DEFAULT_MAX_TIME_STEP: f64 = 0.1;

    /// Drag coefficient `γ = c π η R` of a node.
    pub fn drag(&self) -> f64 {
        self.drag_coefficient * PI * self.viscosity * self.drag_radius
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("strain_amplitude", self.strain_amplitude)?;
        require_non_negative("frequency", self.frequency)?;
        if self.num_oscillations == 0 {
            return Err(invalid("num_oscillations", "must be at least 1"));
        }
        if self.outputs_per_oscillation == 0 {
            return Err(invalid("outputs_per_oscillation", "must be at least 1"));
        }
        require_non_negative("temperature", self.temperature)?;
        require_positive("viscosity", self.viscosity)?;
        require_positive("drag_radius", self.drag_radius)?;
        require_positive("drag_coefficient", self.drag_coefficient)?;
        require_positive("max_time_step", self.max_time_step)?;
        if let ForceCutoff::MinDistance(distance) = self.force_cutoff {
            require_non_negative("force_cutoff", distance)?;
        }
        Ok(())
    }
}

/// Kinetics of the force-dipole motors bound to bonds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorConfig {
    /// Extra tension applied along a bond while a motor is bound to it.
    pub force: f64,
    /// Rate of binding; the mean unbound dwell time is `1 / attach_rate`.
    pub attach_rate: f64,
    /// Rate of unbinding; the mean bound dwell time is `1 / detach_rate`.
    pub detach_rate: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            force: 1e-2,
            attach_rate: 20.0,
            detach_rate: 4.0,
        }
    }
}

impl MotorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("motor_force", self.force)?;
        require_positive("attach_rate", self.attach_rate)?;
        require_positive("detach_rate", self.detach_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizerConfig {
    /// Relative energy change below which the minimization stops.
    pub ftol: f64,
    /// Scaled gradient magnitude below which the minimization stops.
    pub gtol: f64,
    /// Fractional tolerance of each line minimization.
    pub line_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-7,
            gtol: 1e-8,
            line_tolerance: 3e-8,
            max_iterations: 1_000_000,
        }
    }
}

impl MinimizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("ftol", self.ftol)?;
        require_positive("gtol", self.gtol)?;
        require_positive("line_tolerance", self.line_tolerance)?;
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

/// Everything the oscillatory-shear workflow needs.
#[derive(Debug, Clone, PartialEq)]
pub struct OscillationConfig {
    pub lattice: LatticeConfig,
    pub dynamics: DynamicsConfig,
    /// `None` disables motors.
    pub motors: Option<MotorConfig>,
    /// `None` seeds from system entropy.
    pub seed: Option<u64>,
}

#[derive(Default)]
pub struct OscillationConfigBuilder {
    size: Option<usize>,
    bond_probability: Option<f64>,
    youngs_modulus: Option<f64>,
    rest_length: Option<f64>,
    strain_amplitude: Option<f64>,
    frequency: Option<f64>,
    num_oscillations: Option<usize>,
    outputs_per_oscillation: Option<usize>,
    temperature: Option<f64>,
    viscosity: Option<f64>,
    drag_radius: Option<f64>,
    drag_coefficient: Option<f64>,
    max_time_step: Option<f64>,
    viscous_stress: Option<bool>,
    force_cutoff: Option<ForceCutoff>,
    motors: Option<MotorConfig>,
    seed: Option<u64>,
}

impl OscillationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
    pub fn bond_probability(mut self, probability: f64) -> Self {
        self.bond_probability = Some(probability);
        self
    }
    pub fn youngs_modulus(mut self, modulus: f64) -> Self {
        self.youngs_modulus = Some(modulus);
        self
    }
    pub fn rest_length(mut self, length: f64) -> Self {
        self.rest_length = Some(length);
        self
    }
    pub fn strain_amplitude(mut self, amplitude: f64) -> Self {
        self.strain_amplitude = Some(amplitude);
        self
    }
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }
    pub fn num_oscillations(mut self, n: usize) -> Self {
        self.num_oscillations = Some(n);
        self
    }
    pub fn outputs_per_oscillation(mut self, n: usize) -> Self {
        self.outputs_per_oscillation = Some(n);
        self
    }
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn viscosity(mut self, viscosity: f64) -> Self {
        self.viscosity = Some(viscosity);
        self
    }
    pub fn drag_radius(mut self, radius: f64) -> Self {
        self.drag_radius = Some(radius);
        self
    }
    pub fn drag_coefficient(mut self, coefficient: f64) -> Self {
        self.drag_coefficient = Some(coefficient);
        self
    }
    pub fn max_time_step(mut self, dt: f64) -> Self {
        self.max_time_step = Some(dt);
        self
    }
    pub fn viscous_stress(mut self, enabled: bool) -> Self {
        self.viscous_stress = Some(enabled);
        self
    }
    pub fn force_cutoff(mut self, cutoff: ForceCutoff) -> Self {
        self.force_cutoff = Some(cutoff);
        self
    }
    pub fn motors(mut self, motors: Option<MotorConfig>) -> Self {
        self.motors = motors;
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<OscillationConfig, ConfigError> {
        let lattice = LatticeConfig {
            size: self.size.ok_or(ConfigError::MissingParameter("size"))?,
            bond_probability: self
                .bond_probability
                .ok_or(ConfigError::MissingParameter("bond_probability"))?,
            youngs_modulus: self
                .youngs_modulus
                .unwrap_or(LatticeConfig::DEFAULT_YOUNGS_MODULUS),
            rest_length: self
                .rest_length
                .unwrap_or(LatticeConfig::DEFAULT_REST_LENGTH),
        };
        let dynamics = DynamicsConfig {
            strain_amplitude: self
                .strain_amplitude
                .ok_or(ConfigError::MissingParameter("strain_amplitude"))?,
            frequency: self
                .frequency
                .ok_or(ConfigError::MissingParameter("frequency"))?,
            num_oscillations: self
                .num_oscillations
                .unwrap_or(DynamicsConfig::DEFAULT_NUM_OSCILLATIONS),
            outputs_per_oscillation: self
                .outputs_per_oscillation
                .unwrap_or(DynamicsConfig::DEFAULT_OUTPUTS_PER_OSCILLATION),
            temperature: self.temperature.unwrap_or(0.0),
            viscosity: self
                .viscosity
                .unwrap_or(DynamicsConfig::DEFAULT_VISCOSITY),
            drag_radius: self
                .drag_radius
                .unwrap_or(DynamicsConfig::DEFAULT_DRAG_RADIUS),
            drag_coefficient: self
                .drag_coefficient
                .unwrap_or(DynamicsConfig::DEFAULT_DRAG_COEFFICIENT),
            max_time_step: self
                .max_time_step
                .unwrap_or(DynamicsConfig::DEFAULT_MAX_TIME_STEP),
            viscous_stress: self.viscous_stress.unwrap_or(false),
            force_cutoff: self.force_cutoff.unwrap_or_default(),
        };

        lattice.validate()?;
        dynamics.validate()?;
        if let Some(motors) = &self.motors {
            motors.validate()?;
        }

        Ok(OscillationConfig {
            lattice,
            dynamics,
            motors: self.motors,
            seed: self.seed,
        })
    }
}

/// Everything the quasi-static minimization workflow needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationConfig {
    pub lattice: LatticeConfig,
    /// Engineering shear strain held fixed during the minimization.
    pub strain: f64,
    pub minimizer: MinimizerConfig,
    pub seed: Option<u64>,
}

#[derive(Default)]
pub struct MinimizationConfigBuilder {
    size: Option<usize>,
    bond_probability: Option<f64>,
    youngs_modulus: Option<f64>,
    rest_length: Option<f64>,
    strain: Option<f64>,
    minimizer: Option<MinimizerConfig>,
    seed: Option<u64>,
}

impl MinimizationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
    pub fn bond_probability(mut self, probability: f64) -> Self {
        self.bond_probability = Some(probability);
        self
    }
    pub fn youngs_modulus(mut self, modulus: f64) -> Self {
        self.youngs_modulus = Some(modulus);
        self
    }
    pub fn rest_length(mut self, length: f64) -> Self {
        self.rest_length = Some(length);
        self
    }
    pub fn strain(mut self, strain: f64) -> Self {
        self.strain = Some(strain);
        self
    }
    pub fn minimizer(mut self, minimizer: MinimizerConfig) -> Self {
        self.minimizer = Some(minimizer);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<MinimizationConfig, ConfigError> {
        let lattice = LatticeConfig {
            size: self.size.ok_or(ConfigError::MissingParameter("size"))?,
            bond_probability: self
                .bond_probability
                .ok_or(ConfigError::MissingParameter("bond_probability"))?,
            youngs_modulus: self
                .youngs_modulus
                .unwrap_or(LatticeConfig::DEFAULT_YOUNGS_MODULUS),
            rest_length: self
                .rest_length
                .unwrap_or(LatticeConfig::DEFAULT_REST_LENGTH),
        };
        let strain = self.strain.ok_or(ConfigError::MissingParameter("strain"))?;
        let minimizer = self.minimizer.unwrap_or_default();

        lattice.validate()?;
        require_finite("strain", strain)?;
        minimizer.validate()?;

        Ok(MinimizationConfig {
            lattice,
            strain,
            minimizer,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillation_builder() -> OscillationConfigBuilder {
        OscillationConfigBuilder::new()
            .size(10)
            .bond_probability(0.8)
            .strain_amplitude(0.01)
            .frequency(1.0)
    }

    #[test]
    fn oscillation_builder_fills_defaults() {
        let config = oscillation_builder().build().unwrap();
        assert_eq!(config.lattice.youngs_modulus, 1.0);
        assert_eq!(config.dynamics.num_oscillations, 6);
        assert_eq!(config.dynamics.outputs_per_oscillation, 20);
        assert_eq!(config.dynamics.force_cutoff, ForceCutoff::Disabled);
        assert!(config.motors.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn oscillation_builder_reports_missing_frequency() {
        let result = OscillationConfigBuilder::new()
            .size(10)
            .bond_probability(0.8)
            .strain_amplitude(0.01)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("frequency")));
    }

    #[test]
    fn oscillation_builder_rejects_tiny_lattice() {
        let result = oscillation_builder().size(1).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "size", .. })
        ));
    }

    #[test]
    fn bond_probability_must_be_a_probability() {
        for p in [-0.1, 1.01, f64::NAN] {
            let result = oscillation_builder().bond_probability(p).build();
            assert!(matches!(
                result,
                Err(ConfigError::InvalidParameter {
                    name: "bond_probability",
                    ..
                })
            ));
        }
    }

    #[test]
    fn oscillation_builder_rejects_negative_temperature() {
        let result = oscillation_builder().temperature(-1.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn oscillation_builder_validates_motor_rates() {
        let motors = MotorConfig {
            attach_rate: 0.0,
            ..MotorConfig::default()
        };
        let result = oscillation_builder().motors(Some(motors)).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "attach_rate",
                ..
            })
        ));
    }

    #[test]
    fn drag_is_c_pi_eta_r() {
        let config = oscillation_builder()
            .viscosity(2.0)
            .drag_radius(0.5)
            .build()
            .unwrap();
        assert!((config.dynamics.drag() - 4.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn minimization_builder_requires_strain() {
        let result = MinimizationConfigBuilder::new()
            .size(4)
            .bond_probability(1.0)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("strain")));
    }

    #[test]
    fn minimization_builder_uses_default_tolerances() {
        let config = MinimizationConfigBuilder::new()
            .size(4)
            .bond_probability(1.0)
            .strain(0.05)
            .seed(Some(3))
            .build()
            .unwrap();
        assert_eq!(config.minimizer, MinimizerConfig::default());
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn minimization_builder_rejects_zero_iterations() {
        let result = MinimizationConfigBuilder::new()
            .size(4)
            .bond_probability(1.0)
            .strain(0.05)
            .minimizer(MinimizerConfig {
                max_iterations: 0,
                ..MinimizerConfig::default()
            })
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                ..
            })
        ));
    }
}
