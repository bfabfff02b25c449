//! prisoners CLI - Monte Carlo simulation of the 100 prisoners problem.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use prisoners::models::default_open_limit;
use prisoners::{
    Config, ExperimentRunner, ExperimentStats, ProgressReporter, Reporters, TracingReporter,
    asymptotic_success_rate, group_success_probability,
};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prisoners")]
#[command(version)]
#[command(about = "Simulate the 100 prisoners problem with the cycle-following strategy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v per-trial lines, -vv every opened box)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run(RunArgs),

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,

    /// Print the exact probability that the group goes free
    Odds {
        /// Number of prisoners
        #[arg(short, long, default_value = "100")]
        prisoners: usize,

        /// Boxes each prisoner may open (default: prisoners / 2)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// How many times to run the scenario
    #[arg(short, long)]
    runs: Option<u64>,

    /// How many prisoners in the scenario
    #[arg(short, long)]
    prisoners: Option<usize>,

    /// Boxes each prisoner may open (default: prisoners / 2)
    #[arg(long)]
    limit: Option<usize>,

    /// Base seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Keep per-prisoner open counts (shown with -v)
    #[arg(long)]
    diagnostics: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl RunArgs {
    /// CLI flags win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(runs) = self.runs {
            config.simulation.runs = runs;
        }
        if let Some(prisoners) = self.prisoners {
            config.simulation.prisoners = prisoners;
        }
        if let Some(limit) = self.limit {
            config.simulation.open_limit = Some(limit);
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }
        if let Some(workers) = self.workers {
            config.execution.workers = workers;
        }
        if self.diagnostics {
            config.simulation.diagnostics = true;
        }
        if self.json {
            config.output.json = true;
        }
        if self.no_progress {
            config.output.progress = false;
        }
    }
}

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config from {:?}", path))
}

fn print_summary(stats: &ExperimentStats) {
    println!("\n=== Simulation Complete ===");
    println!("Runs:        {}", stats.tally.total_trials);
    println!("Prisoners:   {}", stats.prisoners);
    println!("Open limit:  {}", stats.open_limit);
    println!("Successes:   {}", stats.tally.successes);
    println!(
        "Percentage:  {:.1}% (± {:.1})",
        stats.success_percentage(),
        stats.standard_error * 100.0
    );
    println!("Expected:    {:.1}%", stats.expected_rate * 100.0);
    println!("Seed:        {}", stats.seed);
    println!("Workers:     {}", stats.workers);
    println!("Runtime:     {:.2}s", stats.runtime_secs);
    println!("Throughput:  {:.0} trials/s", stats.trials_per_sec);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Example => {
            println!("{}", Config::example());
        }

        Commands::Validate => {
            let config = load_config(cli.config.as_deref())?;
            config.validate().context("Invalid configuration")?;

            info!("Configuration is valid");
            info!("  Runs: {}", config.simulation.runs);
            info!("  Prisoners: {}", config.simulation.prisoners);
            info!("  Open limit: {}", config.open_limit());
            info!(
                "  Seed: {}",
                config
                    .simulation
                    .seed
                    .map_or_else(|| "random".to_string(), |s| s.to_string())
            );
            info!("  Workers: {}", config.execution.workers);
        }

        Commands::Odds { prisoners, limit } => {
            let limit = limit.unwrap_or_else(|| default_open_limit(prisoners));
            let p = group_success_probability(prisoners, limit);
            println!("Prisoners:   {prisoners}");
            println!("Open limit:  {limit}");
            println!("P(success):  {:.4}%", p * 100.0);
            println!("1 - ln 2:    {:.4}%", asymptotic_success_rate() * 100.0);
        }

        Commands::Run(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            args.apply(&mut config);

            let runner = ExperimentRunner::from_config(&config).context("Invalid configuration")?;

            let mut reporters = Reporters::new().with(TracingReporter);
            // debug output and the bar fight over stderr
            if config.output.progress && cli.verbose == 0 {
                reporters = reporters.with(ProgressReporter::new());
            }

            let stats = runner.run(&mut reporters).await?;

            if config.output.json {
                let json =
                    serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?;
                println!("{json}");
            } else {
                print_summary(&stats);
            }
        }
    }

    Ok(())
}
