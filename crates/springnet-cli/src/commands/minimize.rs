use crate::cli::MinimizeArgs;
use crate::config::{OutputPlan, PartialConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use springnet::core::io::printers::{append_energy, write_positions};
use springnet::core::io::records::{EnergyRecord, SnapshotHeader};
use springnet::engine::config::MinimizationConfig;
use springnet::engine::progress::ProgressReporter;
use springnet::workflows::minimize::{self, MinimizationResult};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use tracing::info;

pub async fn run(args: MinimizeArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let (config, plan) = partial_config.merge_minimization(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Relaxing a {n}x{n} network (p = {p}) at γ = {g}...",
        n = config.lattice.size,
        p = config.lattice.bond_probability,
        g = config.strain,
    );
    info!("Invoking the core minimization workflow...");

    let result = tokio::task::block_in_place(|| minimize::run(&config, &reporter))?;

    write_results(&plan, &config, &result)?;
    print_summary(&result);
    Ok(())
}

fn write_results(
    plan: &OutputPlan,
    config: &MinimizationConfig,
    result: &MinimizationResult,
) -> Result<()> {
    if let Some(stem) = &plan.positions {
        let path = plan.file(stem);
        info!("Writing relaxed positions to {:?}", &path);
        let header = SnapshotHeader {
            size: config.lattice.size,
            strain: config.strain,
            modulus: config.lattice.youngs_modulus,
            probability: config.lattice.bond_probability,
        };
        write_positions(BufWriter::new(File::create(&path)?), &result.network, &header)?;
    }
    if let Some(stem) = &plan.energy {
        let path = plan.file(stem);
        info!("Appending minimized energy to {:?}", &path);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        append_energy(
            file,
            &EnergyRecord {
                energy: result.energy,
                probability: config.lattice.bond_probability,
                strain: config.strain,
            },
        )?;
    }
    Ok(())
}

fn print_summary(result: &MinimizationResult) {
    println!(
        "✓ Converged after {} iteration(s) ({:?}).",
        result.report.iterations, result.report.termination
    );
    println!("  Energy: {:.6e}", result.energy);
    println!("  Stress: {:.6e}", result.stress);
    match (result.modulus_from_stress, result.modulus_from_energy) {
        (Some(from_stress), Some(from_energy)) => {
            println!("  Shear modulus (σ/γ):     {from_stress:.6}");
            println!("  Shear modulus (2E/Aγ²):  {from_energy:.6}");
        }
        _ => println!("  Shear modulus: undefined at zero strain"),
    }
}
