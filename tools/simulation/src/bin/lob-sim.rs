// Synthetic market simulator CLI
// Runs a configuration, batches of seeds, or prints a report digest

use clap::{Parser, Subcommand};
use simulation::config::SimConfig;
use simulation::export::{build_export, write_to_file};
use simulation::monte_carlo::run_batch;
use simulation::replay::verify_determinism;
use simulation::runner::run_with_metrics;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use types::errors::SimError;

#[derive(Parser)]
#[command(name = "lob-sim")]
#[command(version = simulation::VERSION)]
#[command(about = "Synthetic limit order book market simulator", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides the config's log_level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and write the per-tick CSV report
    Run {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: String,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the configured output file
        #[arg(short, long)]
        output: Option<String>,

        /// Also write a JSON run summary here
        #[arg(long)]
        summary: Option<String>,
    },

    /// Run several seeds in parallel and print aggregate metrics
    Batch {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: String,

        /// Number of runs, seeded seed, seed + 1, ...
        #[arg(short, long, default_value = "8")]
        runs: usize,
    },

    /// Print the report digest and check that a rerun reproduces it
    Digest {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: String,
    },
}

impl Commands {
    fn config_path(&self) -> &str {
        match self {
            Commands::Run { config, .. } | Commands::Batch { config, .. } | Commands::Digest { config } => config,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Load config before logging so its log_level applies
    let config = match SimConfig::from_file(cli.command.config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lob-sim: {}", e);
            std::process::exit(2);
        }
    };

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Err(e) = execute(cli.command, config) {
        error!(error = %e, "lob-sim failed");
        std::process::exit(1);
    }
}

fn execute(command: Commands, config: SimConfig) -> Result<(), SimError> {
    match command {
        Commands::Run {
            seed,
            output,
            summary,
            ..
        } => {
            let config = match seed {
                Some(seed) => config.with_seed(seed),
                None => config,
            };
            let (report, metrics) = run_with_metrics(&config)?;

            if let Some(path) = output.or_else(|| config.output_file.clone()) {
                report.save_csv(&path)?;
                info!(path = %path, rows = report.len(), "Report written");
            }
            if let Some(path) = summary {
                write_to_file(&build_export(&config, &report, &metrics), &path)?;
                info!(path = %path, "Summary written");
            }
            println!("{}", metrics.summary());
        }

        Commands::Batch { runs, .. } => {
            let summary = run_batch(&config, runs)?;
            for run in &summary.runs {
                println!(
                    "run {:>3}  seed {:>8}  volume {:>8}  final {}  {}",
                    run.index,
                    run.seed,
                    run.metrics.traded_volume,
                    run.final_price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                    run.digest,
                );
            }
            println!("{}", summary.aggregate.summary());
        }

        Commands::Digest { .. } => {
            let check = verify_determinism(&config)?;
            println!("{}", check.digest_a);
            if !check.matches {
                return Err(SimError::Report {
                    message: format!("rerun diverged: {} != {}", check.digest_a, check.digest_b),
                });
            }
        }
    }
    Ok(())
}
