use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use serde::de::DeserializeOwned;

use horizon_core::model::{
    CapitalizationInput, MonteCarloInput, MonteCarloResult, RetirementMonteCarloInput,
    RetirementMonteCarloResult, SavingsOptimizationInput,
};
use horizon_core::{
    ProgressReporter, ProgressSink, ProgressUpdate, RecommendedSavingsResult, RunControl,
    monte_carlo_capitalization_with_progress, monte_carlo_retirement_with_progress,
    optimize_savings_with_progress, simulate_capitalization,
};

mod logging;
mod report;

#[derive(Parser, Debug)]
#[command(name = "horizon")]
#[command(about = "Retirement projection and savings optimization")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deterministic capitalization preview (expected returns, no draws)
    Preview {
        /// YAML scenario file
        input: PathBuf,
    },
    /// Monte Carlo capitalization simulation
    Capitalization {
        input: PathBuf,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
    /// Monte Carlo retirement simulation
    Retirement {
        input: PathBuf,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
    /// Minimum-savings recommendation
    Optimize {
        input: PathBuf,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
}

/// Progress sink that forwards engine updates to the log.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, update: &ProgressUpdate) {
        if update.done {
            tracing::info!(step = %update.step_name, "{}", update.message);
        } else {
            tracing::debug!(
                step = %update.step_name,
                percent = update.percent,
                "{}",
                update.message
            );
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    logging::init(&args.log_level);

    let sink = LogProgress;
    let control = RunControl::new();

    match args.command {
        Command::Preview { input } => {
            let scenario: CapitalizationInput = load_scenario(&input)?;
            let result = simulate_capitalization(&scenario)?;
            report::preview(&result);
        }
        Command::Capitalization { input, seed } => {
            let scenario: MonteCarloInput = load_scenario(&input)?;
            let reporter = ProgressReporter::new(&sink, &control, "capitalization");
            let result: MonteCarloResult =
                monte_carlo_capitalization_with_progress(&scenario, seed, &reporter)?;
            report::capitalization(&result);
        }
        Command::Retirement { input, seed } => {
            let scenario: RetirementMonteCarloInput = load_scenario(&input)?;
            let reporter = ProgressReporter::new(&sink, &control, "retirement");
            let result: RetirementMonteCarloResult =
                monte_carlo_retirement_with_progress(&scenario, seed, &reporter)?;
            report::retirement(&result);
        }
        Command::Optimize { input, seed } => {
            let scenario: SavingsOptimizationInput = load_scenario(&input)?;
            let reporter = ProgressReporter::new(&sink, &control, "optimization");
            let result: RecommendedSavingsResult =
                optimize_savings_with_progress(&scenario, seed, &reporter)?;
            report::recommendation(&result);
        }
    }

    Ok(())
}

fn load_scenario<T: DeserializeOwned>(path: &Path) -> color_eyre::Result<T> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read scenario file {}", path.display()))?;
    serde_saphyr::from_str(&content)
        .map_err(|err| color_eyre::eyre::eyre!("invalid scenario {}: {err}", path.display()))
}
