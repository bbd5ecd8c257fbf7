use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ra::{Simulation, SimulationConfig};

/// Stochastic ray-tracing room acoustics.
#[derive(Parser)]
#[command(name = "ra", version, about)]
struct Cli {
    /// JSON simulation configuration.
    #[arg(short, long)]
    config: PathBuf,

    /// Number of worker threads (default: one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Log progress every N traced rays (0 disables it).
    #[arg(long, default_value_t = 0)]
    progress_every: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("failed to configure the thread pool")?;
    }

    let config = SimulationConfig::from_json_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let sim = Simulation::new(&config).context("invalid simulation setup")?;

    let result = sim.run_with_progress(cli.progress_every, |p| {
        log::info!(
            "{}/{} rays, {} crossings",
            p.rays_done,
            p.total_rays,
            p.crossings
        );
    });

    println!(
        "c0 = {:.2} m/s, max reflection order = {}, bands = {:?} Hz",
        sim.air().c0,
        result.max_reflection_order,
        config.controls.freq
    );
    println!(
        "{} rays traced, {} receiver crossings",
        result.traces.len(),
        result.num_crossings()
    );
    for (reason, count) in result.termination_counts() {
        println!("{reason:?}: {count} rays");
    }
    for s in 0..result.num_sources {
        for r in 0..result.num_receivers {
            let arrivals = result.arrivals(s, r);
            let reflected: Vec<f64> = (0..config.num_bands())
                .map(|b| arrivals.iter().filter_map(|a| a.intensity.get(b)).sum())
                .collect();
            match result.direct(s, r) {
                Some(d) => println!(
                    "S{s} -> R{r}: direct at {:.2} ms {:?} W/m^2, {} reflections {:?} W/m^2",
                    d.time * 1e3,
                    d.intensity,
                    arrivals.len(),
                    reflected
                ),
                None => println!(
                    "S{s} -> R{r}: no line of sight, {} reflections {:?} W/m^2",
                    arrivals.len(),
                    reflected
                ),
            }
        }
    }
    Ok(())
}
