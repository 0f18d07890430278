use crate::cli::OscillateArgs;
use crate::config::{OutputPlan, PartialConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use springnet::core::io::OutputError;
use springnet::core::io::printers::{
    NonaffinityWriter, append_energy, write_positions, write_stress_series,
};
use springnet::core::io::records::{EnergyRecord, SnapshotHeader};
use springnet::engine::config::OscillationConfig;
use springnet::engine::error::EngineError;
use springnet::engine::progress::ProgressReporter;
use springnet::workflows::oscillate::{self, Frame, FrameSink, OscillationResult};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use tracing::info;

/// Writes position snapshots and non-affinity rows while the run is in progress.
struct CsvFrameSink<'a> {
    plan: &'a OutputPlan,
    youngs_modulus: f64,
    bond_probability: f64,
    nonaffinity: Option<NonaffinityWriter<BufWriter<File>>>,
}

impl<'a> CsvFrameSink<'a> {
    fn new(plan: &'a OutputPlan, config: &OscillationConfig) -> Result<Self> {
        let nonaffinity = match &plan.nonaffinity {
            Some(stem) => Some(NonaffinityWriter::new(BufWriter::new(File::create(
                plan.file(stem),
            )?))),
            None => None,
        };
        Ok(Self {
            plan,
            youngs_modulus: config.lattice.youngs_modulus,
            bond_probability: config.lattice.bond_probability,
            nonaffinity,
        })
    }

    fn finish(self) -> Result<()> {
        if let Some(mut writer) = self.nonaffinity {
            writer.flush()?;
        }
        Ok(())
    }
}

impl FrameSink for CsvFrameSink<'_> {
    fn record(&mut self, frame: &Frame<'_>) -> std::result::Result<(), EngineError> {
        if let Some(stem) = &self.plan.positions {
            let file = File::create(self.plan.frame_file(stem, frame.index))
                .map_err(OutputError::from)?;
            let header = SnapshotHeader {
                size: frame.network.geometry().size(),
                strain: frame.strain,
                modulus: self.youngs_modulus,
                probability: self.bond_probability,
            };
            write_positions(BufWriter::new(file), frame.network, &header)?;
        }
        if let Some(writer) = self.nonaffinity.as_mut() {
            writer.write(&frame.nonaffinity_sample())?;
        }
        Ok(())
    }
}

pub async fn run(args: OscillateArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let (config, plan) = partial_config.merge_oscillation(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let mut sink = CsvFrameSink::new(&plan, &config)?;

    println!(
        "Shearing a {n}x{n} network (p = {p}) at ω = {w}, γ₀ = {g}...",
        n = config.lattice.size,
        p = config.lattice.bond_probability,
        w = config.dynamics.frequency,
        g = config.dynamics.strain_amplitude,
    );
    info!("Invoking the core oscillation workflow...");

    let result = tokio::task::block_in_place(|| oscillate::run(&config, &reporter, &mut sink))?;
    sink.finish()?;

    write_results(&plan, &config, &result)?;
    println!(
        "✓ Recorded {} frame(s); final elastic energy {:.6e}.",
        result.stress_samples.len(),
        result.final_energy
    );
    Ok(())
}

fn write_results(
    plan: &OutputPlan,
    config: &OscillationConfig,
    result: &OscillationResult,
) -> Result<()> {
    if let Some(stem) = &plan.stress {
        let path = plan.file(stem);
        info!("Writing stress series to {:?}", &path);
        write_stress_series(BufWriter::new(File::create(&path)?), &result.stress_samples)?;
    }
    if let Some(stem) = &plan.energy {
        let path = plan.file(stem);
        info!("Appending final energy to {:?}", &path);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        append_energy(
            file,
            &EnergyRecord {
                energy: result.final_energy,
                probability: config.lattice.bond_probability,
                strain: result.shear.strain(result.network.geometry()),
            },
        )?;
    }
    Ok(())
}
