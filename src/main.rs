use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use round_gbdt_tuner::cli::Cli;
use round_gbdt_tuner::error::Result;
use round_gbdt_tuner::{RunConfig, TrialRunner};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = RunConfig {
        workspace_root: std::env::current_dir()?,
        train_path: cli.train,
        val_path: cli.val,
        num_trials: cli.num_trials as usize,
        ..RunConfig::default()
    };

    let report = TrialRunner::new(config).run_default()?;
    println!(
        "Best model (trial #{:03}) saved to {}",
        report.publication.best_trial,
        report.publication.promoted_model.display()
    );
    Ok(())
}
