//! `wordbug`: run DeepWordBug against a text classifier.
//!
//! Usage:
//!   wordbug attack "The movie was bad"
//!   wordbug run --dataset reviews.jsonl --output results/report.json
//!   WORDBUG_CONFIG=wordbug.yaml wordbug run --dataset reviews.jsonl

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use wordbug_attack::{DeepWordBug, OracleStats};
use wordbug_cli::config::resolve_config;
use wordbug_cli::dataset::DatasetLoader;
use wordbug_cli::report::{format_attack_result, format_query_stats, AttackReport};
use wordbug_cli::runner::AttackRunner;
use wordbug_cli::shutdown::{shutdown_signal, ShutdownCoordinator};
use wordbug_cli::build_oracle;
use wordbug_core::{Oracle, RecipeConfig, Text, WordbugConfig};

#[derive(Parser)]
#[command(name = "wordbug", version, about = "DeepWordBug adversarial text attack runner")]
struct Cli {
    /// YAML config file (falls back to $WORDBUG_CONFIG, then defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at info level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    recipe: RecipeOverrides,

    #[command(subcommand)]
    command: Command,
}

/// Command-line overrides for the recipe section.
#[derive(clap::Args)]
struct RecipeOverrides {
    /// Use character substitution only instead of all four operators.
    #[arg(long, global = true)]
    substitution_only: bool,

    /// Maximum Levenshtein distance from the original text.
    #[arg(long, global = true)]
    max_edit_distance: Option<f64>,

    /// Seed for the randomized operators.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Maximum number of perturbed words.
    #[arg(long, global = true)]
    max_depth: Option<usize>,
}

impl RecipeOverrides {
    fn apply(&self, recipe: &mut RecipeConfig) {
        if self.substitution_only {
            recipe.use_all_transformations = false;
        }
        if let Some(budget) = self.max_edit_distance {
            recipe.max_edit_distance = budget;
        }
        if let Some(seed) = self.seed {
            recipe.seed = seed;
        }
        if self.max_depth.is_some() {
            recipe.max_depth = self.max_depth;
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Attack every sample of a JSON or JSON Lines dataset.
    Run {
        /// Dataset file.
        #[arg(long)]
        dataset: PathBuf,

        /// Where to write the JSON report.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Attack a single text and print the result.
    Attack {
        /// The text to attack.
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = resolve_config(cli.config)?;
    cli.recipe.apply(&mut config.recipe);
    config.validate()?;

    match cli.command {
        Command::Run { dataset, output } => run_dataset(&config, dataset, output).await,
        Command::Attack { text } => attack_text(&config, &text).await,
    }
}

async fn run_dataset(
    config: &WordbugConfig,
    dataset: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let samples = DatasetLoader::load_from_file(&dataset).map_err(anyhow::Error::msg)?;
    let searcher = DeepWordBug::build(&config.recipe)?;
    let oracle = Arc::new(OracleStats::new(build_oracle(&config.oracle)?));

    let coordinator = ShutdownCoordinator::new();
    tokio::spawn(shutdown_signal(coordinator.clone()));

    let runner = AttackRunner::new(
        searcher,
        Arc::clone(&oracle) as Arc<dyn Oracle>,
        config,
        coordinator.clone(),
    );
    let records = runner.run(samples).await;

    let report = AttackReport::new(oracle.name(), &config.recipe, oracle.stats(), records);
    println!("\n{}", report.summary.to_table());
    println!("{}", format_query_stats(&report.query_stats));

    if let Some(path) = output {
        report.save(&path)?;
        println!("Report written to {}", path.display());
    }
    if coordinator.is_shutting_down() {
        eprintln!(
            "Interrupted: {} of {} attacks cancelled",
            report.summary.cancelled,
            report.summary.total()
        );
    }
    Ok(())
}

async fn attack_text(config: &WordbugConfig, text: &str) -> anyhow::Result<()> {
    let searcher = DeepWordBug::build(&config.recipe)?;
    let oracle = OracleStats::new(build_oracle(&config.oracle)?);

    let coordinator = ShutdownCoordinator::new();
    tokio::spawn(shutdown_signal(coordinator.clone()));

    let result = searcher
        .attack_with_cancellation(&oracle, &Text::new(text), &coordinator.token())
        .await?;
    println!("{}", format_attack_result(&result, &config.oracle));
    println!("{}", format_query_stats(&oracle.stats()));
    Ok(())
}
