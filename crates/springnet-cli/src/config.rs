use crate::cli::{MinimizeArgs, MotorToggle, NetworkArgs, OscillateArgs, OutputArgs};
use crate::error::{CliError, Result};
use serde::Deserialize;
use springnet::core::mechanics::forces::ForceCutoff;
use springnet::engine::config::{
    MinimizationConfig, MinimizationConfigBuilder, MinimizerConfig, MotorConfig,
    OscillationConfig, OscillationConfigBuilder,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DEFAULT_SIZE: usize = 20;
const DEFAULT_BOND_PROBABILITY: f64 = 0.8;
const DEFAULT_FREQUENCY: f64 = 1.0;
const DEFAULT_STRAIN: f64 = 0.01;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialLatticeConfig {
    size: Option<usize>,
    bond_probability: Option<f64>,
    youngs_modulus: Option<f64>,
    rest_length: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDynamicsConfig {
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
    /// Minimum bond length below which forces are dropped.
    force_cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMotorConfig {
    enabled: Option<bool>,
    force: Option<f64>,
    attach_rate: Option<f64>,
    detach_rate: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMinimizerConfig {
    strain: Option<f64>,
    ftol: Option<f64>,
    gtol: Option<f64>,
    line_tolerance: Option<f64>,
    max_iterations: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    positions: Option<String>,
    stress: Option<String>,
    energy: Option<String>,
    nonaffinity: Option<String>,
}

/// Configuration as read from a TOML file; every field may be overridden on the command line.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    lattice: Option<PartialLatticeConfig>,
    dynamics: Option<PartialDynamicsConfig>,
    motors: Option<PartialMotorConfig>,
    minimizer: Option<PartialMinimizerConfig>,
    output: Option<PartialOutputConfig>,
    seed: Option<u64>,
}

/// Resolved output locations. A stem of `None` disables that output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPlan {
    pub directory: PathBuf,
    pub positions: Option<String>,
    pub stress: Option<String>,
    pub energy: Option<String>,
    pub nonaffinity: Option<String>,
}

impl OutputPlan {
    pub fn file(&self, stem: &str) -> PathBuf {
        self.directory.join(format!("{stem}.csv"))
    }

    pub fn frame_file(&self, stem: &str, frame: usize) -> PathBuf {
        self.directory.join(format!("{stem}_{frame}.csv"))
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({} expected)",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_oscillation(
        mut self,
        args: &OscillateArgs,
    ) -> Result<(OscillationConfig, OutputPlan)> {
        self.apply_set_values(&args.set_values)?;

        let lattice = self.lattice.take().unwrap_or_default();
        let dynamics = self.dynamics.take().unwrap_or_default();
        let motors = self.motors.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let mut builder = OscillationConfigBuilder::new()
            .size(args.network.size.or(lattice.size).unwrap_or(DEFAULT_SIZE))
            .bond_probability(
                args.network
                    .bond_probability
                    .or(lattice.bond_probability)
                    .unwrap_or(DEFAULT_BOND_PROBABILITY),
            )
            .strain_amplitude(
                args.strain_amplitude
                    .or(dynamics.strain_amplitude)
                    .unwrap_or(DEFAULT_STRAIN),
            )
            .frequency(
                args.frequency
                    .or(dynamics.frequency)
                    .unwrap_or(DEFAULT_FREQUENCY),
            )
            .seed(args.network.seed.or(self.seed));

        if let Some(modulus) = args.network.youngs_modulus.or(lattice.youngs_modulus) {
            builder = builder.youngs_modulus(modulus);
        }
        if let Some(length) = lattice.rest_length {
            builder = builder.rest_length(length);
        }
        if let Some(n) = args.num_oscillations.or(dynamics.num_oscillations) {
            builder = builder.num_oscillations(n);
        }
        if let Some(n) = args
            .outputs_per_oscillation
            .or(dynamics.outputs_per_oscillation)
        {
            builder = builder.outputs_per_oscillation(n);
        }
        if let Some(temperature) = args.temperature.or(dynamics.temperature) {
            builder = builder.temperature(temperature);
        }
        if let Some(viscosity) = dynamics.viscosity {
            builder = builder.viscosity(viscosity);
        }
        if let Some(radius) = dynamics.drag_radius {
            builder = builder.drag_radius(radius);
        }
        if let Some(coefficient) = dynamics.drag_coefficient {
            builder = builder.drag_coefficient(coefficient);
        }
        if let Some(dt) = dynamics.max_time_step {
            builder = builder.max_time_step(dt);
        }
        if let Some(enabled) = dynamics.viscous_stress {
            builder = builder.viscous_stress(enabled);
        }
        if let Some(distance) = dynamics.force_cutoff {
            builder = builder.force_cutoff(ForceCutoff::MinDistance(distance));
        }
        builder = builder.motors(Self::merge_motors(args.motors, motors));

        let config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        let plan = Self::merge_output(&args.output, output)?;
        Ok((config, plan))
    }

    pub fn merge_minimization(
        mut self,
        args: &MinimizeArgs,
    ) -> Result<(MinimizationConfig, OutputPlan)> {
        self.apply_set_values(&args.set_values)?;

        let lattice = self.lattice.take().unwrap_or_default();
        let minimizer = self.minimizer.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let defaults = MinimizerConfig::default();
        let minimizer_config = MinimizerConfig {
            ftol: args.ftol.or(minimizer.ftol).unwrap_or(defaults.ftol),
            gtol: minimizer.gtol.unwrap_or(defaults.gtol),
            line_tolerance: minimizer.line_tolerance.unwrap_or(defaults.line_tolerance),
            max_iterations: args
                .max_iterations
                .or(minimizer.max_iterations)
                .unwrap_or(defaults.max_iterations),
        };

        let NetworkArgs {
            size,
            bond_probability,
            youngs_modulus,
            seed,
        } = args.network.clone();

        let mut builder = MinimizationConfigBuilder::new()
            .size(size.or(lattice.size).unwrap_or(DEFAULT_SIZE))
            .bond_probability(
                bond_probability
                    .or(lattice.bond_probability)
                    .unwrap_or(DEFAULT_BOND_PROBABILITY),
            )
            .strain(args.strain.or(minimizer.strain).unwrap_or(DEFAULT_STRAIN))
            .minimizer(minimizer_config)
            .seed(seed.or(self.seed));

        if let Some(modulus) = youngs_modulus.or(lattice.youngs_modulus) {
            builder = builder.youngs_modulus(modulus);
        }
        if let Some(length) = lattice.rest_length {
            builder = builder.rest_length(length);
        }

        let config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        let plan = Self::merge_output(&args.output, output)?;
        Ok((config, plan))
    }

    fn merge_motors(toggle: MotorToggle, partial: PartialMotorConfig) -> Option<MotorConfig> {
        let enabled = if toggle.with_motors {
            true
        } else if toggle.no_motors {
            false
        } else {
            partial.enabled.unwrap_or(false)
        };
        if !enabled {
            return None;
        }
        let defaults = MotorConfig::default();
        Some(MotorConfig {
            force: partial.force.unwrap_or(defaults.force),
            attach_rate: partial.attach_rate.unwrap_or(defaults.attach_rate),
            detach_rate: partial.detach_rate.unwrap_or(defaults.detach_rate),
        })
    }

    fn merge_output(args: &OutputArgs, partial: PartialOutputConfig) -> Result<OutputPlan> {
        let directory = args
            .output_dir
            .clone()
            .or(partial.directory)
            .unwrap_or_else(|| PathBuf::from("."));
        if !directory.is_dir() {
            return Err(CliError::Config(format!(
                "Output directory does not exist: {}",
                directory.display()
            )));
        }
        Ok(OutputPlan {
            directory,
            positions: args.positions.clone().or(partial.positions),
            stress: args.stress.clone().or(partial.stress),
            energy: args.energy.clone().or(partial.energy),
            nonaffinity: args.nonaffinity.clone().or(partial.nonaffinity),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "seed" => self.seed = Some(parse_value(key, value)?),

                "lattice.size" => {
                    self.lattice.get_or_insert_with(Default::default).size =
                        Some(parse_value(key, value)?)
                }
                "lattice.bond-probability" => {
                    self.lattice.get_or_insert_with(Default::default).bond_probability =
                        Some(parse_value(key, value)?)
                }
                "lattice.youngs-modulus" => {
                    self.lattice.get_or_insert_with(Default::default).youngs_modulus =
                        Some(parse_value(key, value)?)
                }
                "lattice.rest-length" => {
                    self.lattice.get_or_insert_with(Default::default).rest_length =
                        Some(parse_value(key, value)?)
                }

                "dynamics.strain-amplitude" => {
                    self.dynamics.get_or_insert_with(Default::default).strain_amplitude =
                        Some(parse_value(key, value)?)
                }
                "dynamics.frequency" => {
                    self.dynamics.get_or_insert_with(Default::default).frequency =
                        Some(parse_value(key, value)?)
                }
                "dynamics.num-oscillations" => {
                    self.dynamics.get_or_insert_with(Default::default).num_oscillations =
                        Some(parse_value(key, value)?)
                }
                "dynamics.outputs-per-oscillation" => {
                    self.dynamics
                        .get_or_insert_with(Default::default)
                        .outputs_per_oscillation = Some(parse_value(key, value)?)
                }
                "dynamics.temperature" => {
                    self.dynamics.get_or_insert_with(Default::default).temperature =
                        Some(parse_value(key, value)?)
                }
                "dynamics.viscosity" => {
                    self.dynamics.get_or_insert_with(Default::default).viscosity =
                        Some(parse_value(key, value)?)
                }
                "dynamics.drag-radius" => {
                    self.dynamics.get_or_insert_with(Default::default).drag_radius =
                        Some(parse_value(key, value)?)
                }
                "dynamics.drag-coefficient" => {
                    self.dynamics.get_or_insert_with(Default::default).drag_coefficient =
                        Some(parse_value(key, value)?)
                }
                "dynamics.max-time-step" => {
                    self.dynamics.get_or_insert_with(Default::default).max_time_step =
                        Some(parse_value(key, value)?)
                }
                "dynamics.viscous-stress" => {
                    self.dynamics.get_or_insert_with(Default::default).viscous_stress =
                        Some(parse_value(key, value)?)
                }
                "dynamics.force-cutoff" => {
                    self.dynamics.get_or_insert_with(Default::default).force_cutoff =
                        Some(parse_value(key, value)?)
                }

                "motors.enabled" => {
                    self.motors.get_or_insert_with(Default::default).enabled =
                        Some(parse_value(key, value)?)
                }
                "motors.force" => {
                    self.motors.get_or_insert_with(Default::default).force =
                        Some(parse_value(key, value)?)
                }
                "motors.attach-rate" => {
                    self.motors.get_or_insert_with(Default::default).attach_rate =
                        Some(parse_value(key, value)?)
                }
                "motors.detach-rate" => {
                    self.motors.get_or_insert_with(Default::default).detach_rate =
                        Some(parse_value(key, value)?)
                }

                "minimizer.strain" => {
                    self.minimizer.get_or_insert_with(Default::default).strain =
                        Some(parse_value(key, value)?)
                }
                "minimizer.ftol" => {
                    self.minimizer.get_or_insert_with(Default::default).ftol =
                        Some(parse_value(key, value)?)
                }
                "minimizer.gtol" => {
                    self.minimizer.get_or_insert_with(Default::default).gtol =
                        Some(parse_value(key, value)?)
                }
                "minimizer.line-tolerance" => {
                    self.minimizer.get_or_insert_with(Default::default).line_tolerance =
                        Some(parse_value(key, value)?)
                }
                "minimizer.max-iterations" => {
                    self.minimizer.get_or_insert_with(Default::default).max_iterations =
                        Some(parse_value(key, value)?)
                }

                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value))
                }
                "output.positions" => {
                    self.output.get_or_insert_with(Default::default).positions =
                        Some(value.to_string())
                }
                "output.stress" => {
                    self.output.get_or_insert_with(Default::default).stress =
                        Some(value.to_string())
                }
                "output.energy" => {
                    self.output.get_or_insert_with(Default::default).energy =
                        Some(value.to_string())
                }
                "output.nonaffinity" => {
                    self.output.get_or_insert_with(Default::default).nonaffinity =
                        Some(value.to_string())
                }

                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
