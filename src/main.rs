use std::{fs::read_to_string, path::PathBuf};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use dentate_gyrus::{
    config::RunConfig,
    error::{DentateGyrusError, SweepError},
    sweep::{parse_assignments, SweepDriver, SweepPlan},
};


#[derive(Parser)]
#[command(name = "dentate_sweep")]
#[command(about = "Runs dentate gyrus network simulations over parameter overrides", long_about = None)]
struct Cli {
    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the full sprouting sweep, trailing overrides apply to every run
    #[arg(short, long)]
    figure: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Overrides as `name=value`, for example `sprout=0.6 Vhalfmn=2`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    overrides: Vec<String>,
}

fn main() -> Result<(), DentateGyrusError> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = match &cli.config {
        Some(path) => {
            let contents = read_to_string(path)
                .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))?;

            RunConfig::from_toml(&contents)?
        },
        None => RunConfig::default(),
    };

    let assignments = parse_assignments(&cli.overrides)?;

    let plan = if cli.figure {
        let mut plan = SweepPlan::sprouting_figure();
        for run in plan.runs.iter_mut() {
            let mut combined = assignments.clone();
            combined.append(run);
            *run = combined;
        }

        plan
    } else {
        SweepPlan::single(assignments)
    };

    let driver = SweepDriver::new(config);
    let reports = driver.run_plan(&plan)?;

    for report in reports.iter() {
        info!(
            "{}: {} spikes over {} ms",
            report.spike_file.display(), report.summary.spikes, report.summary.time,
        );
    }

    Ok(())
}
