//! Synthetic Telemetry CLI
//!
//! Flies a mission through the flight-dynamics integrator, derives sensor
//! readings for every state, and exports them.
//!
//! Usage:
//!   synth-telemetry --steps 600 --seed 42 \
//!                   --burn 0,5000,0 --burn-steps 30 \
//!                   --fail gyroscope_x \
//!                   --output telemetry.csv --trajectory trajectory.csv

use anyhow::{Context, Result};
use clap::Parser;
use flight_dynamics::{MissionParameters, Simulation};
use nalgebra::Vector3;
use sensor_synth::{ExportFormat, SensorEngine};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "synth-telemetry",
    about = "Generate synthetic spacecraft telemetry from a simulated flight"
)]
struct Args {
    /// Mission parameters JSON file (missing fields keep their defaults)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Override a parameter, e.g. --set time_step=0.5 (repeatable)
    #[arg(long = "set", value_parser = parse_key_value)]
    overrides: Vec<(String, f64)>,

    /// Steps to run (default: the whole mission)
    #[arg(short, long)]
    steps: Option<usize>,

    /// RNG seed for reproducible sensor output
    #[arg(long, env = "MISSION_SEED")]
    seed: Option<u64>,

    /// Readings output file
    #[arg(short, long, default_value = "telemetry.csv")]
    output: PathBuf,

    /// Readings format: csv, json or bin
    #[arg(short, long, default_value = "csv")]
    format: ExportFormat,

    /// Also write the trajectory as CSV
    #[arg(long)]
    trajectory: Option<PathBuf>,

    /// Thrust command applied from the first step, as x,y,z in newtons
    #[arg(long, value_parser = parse_vector, allow_hyphen_values = true)]
    burn: Option<Vector3<f64>>,

    /// Number of steps the burn lasts
    #[arg(long, default_value_t = 60)]
    burn_steps: usize,

    /// Sensor to fail halfway through the run (repeatable)
    #[arg(long)]
    fail: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for {key}: {e}"))?;
    Ok((key.trim().to_string(), value))
}

fn parse_vector(s: &str) -> std::result::Result<Vector3<f64>, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("bad vector component in {s:?}: {e}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got {s:?}")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "synth_telemetry=debug,sensor_synth=debug,flight_dynamics=debug"
    } else {
        "synth_telemetry=info,sensor_synth=info,flight_dynamics=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Synthetic Telemetry Generator");
    info!("{}", "=".repeat(60));

    // Parameters
    let mut params = match &args.params {
        Some(path) => MissionParameters::from_json_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => MissionParameters::default(),
    };
    params
        .apply_updates(args.overrides.iter().map(|(k, v)| (k.as_str(), *v)))
        .context("invalid --set override")?;

    // Fly
    let mut sim = Simulation::new(params.clone()).context("invalid mission parameters")?;
    let profile = args
        .burn
        .map(|burn| vec![burn; args.burn_steps])
        .unwrap_or_default();
    let states = sim.run_simulation(args.steps, &profile).to_vec();
    info!("Simulated {} states", states.len());

    // Sense
    let mut sensors = match args.seed {
        Some(seed) => SensorEngine::with_seed(params, seed),
        None => SensorEngine::new(params),
    };
    let split = states.len() / 2;
    sensors.generate_batch_data(&states[..split]);
    for id in &args.fail {
        sensors
            .simulate_sensor_failure(id)
            .with_context(|| format!("--fail {id}"))?;
    }
    sensors.generate_batch_data(&states[split..]);

    // Export
    let rows = sensors
        .export_data(&args.output, args.format)
        .with_context(|| format!("exporting readings to {}", args.output.display()))?;
    if rows == 0 {
        warn!("No readings written; was the step count zero?");
    }

    if let Some(path) = &args.trajectory {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for row in sim.trajectory_data() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        info!("Wrote trajectory to {:?}", path);
    }

    // Summary
    let stats = sim.stats();
    info!("\n{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Mission time: {:.1} s over {} states", stats.total_time, stats.total_steps);
    info!(
        "Altitude: {:.1} - {:.1} km",
        stats.min_altitude / 1000.0,
        stats.max_altitude / 1000.0
    );
    info!("Fuel consumed: {:.2} kg", stats.fuel_consumed);
    if stats.orbital_elements.is_bound() {
        info!(
            "Orbit: a = {:.1} km, e = {:.5}, period {:.1} min",
            stats.orbital_elements.semi_major_axis / 1000.0,
            stats.orbital_elements.eccentricity,
            stats.orbital_elements.period / 60.0
        );
    } else {
        warn!("Trajectory is unbound");
    }
    if !stats.is_active {
        info!("Mission inactive at t = {:.1} s", stats.total_time);
    }

    for (id, summary) in sensors.summary() {
        let status = if summary.is_functional { "OK" } else { "FAILED" };
        info!(
            "  {:22} | {:>6} | mean {:>14.4} {:8} | drift {:+.5}",
            id.as_str(),
            status,
            summary.mean,
            summary.unit,
            summary.drift_offset
        );
    }

    Ok(())
}
