//! Quine CLI - evolutionary search for a faster sort.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quine_ai::LlmMutator;
use quine_core::{format_latency, CandidateSource, QuineConfig, RunId, Workload, ORIGIN_SOURCE};
use quine_eval::{EvaluationPipeline, Evaluator};
use quine_evolution::EvolutionController;
use quine_storage::{ArtifactStore, FsArtifactStore};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quine")]
#[command(about = "Evolutionary search for a faster sort", long_about = None)]
struct Cli {
    /// Config file (defaults to ./quine.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the live candidate and backups
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the evolutionary search
    Run {
        /// Last generation to run
        #[arg(long)]
        generations: Option<u32>,
    },
    /// Put the origin bubble sort back into the live slot
    Reset,
    /// List runs, or the accepted generations of one run
    History {
        /// Run ID
        #[arg(long)]
        run: Option<String>,
    },
    /// Evaluate one source file against the workload and print the outcome
    Evaluate {
        /// Candidate source file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = QuineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let generations = match &cli.command {
        Commands::Run { generations } => *generations,
        _ => None,
    };
    let config = apply_overrides(config, cli.root, generations)?;

    match cli.command {
        Commands::Run { .. } => {
            run(config).await?;
        }
        Commands::Reset => {
            let mut store = FsArtifactStore::new(&config.storage.root).await?;
            match store.reset_to_origin().await? {
                Some(saved) => println!("Previous live source saved to {}", saved.display()),
                None => println!("No live source to save"),
            }
            println!("Live slot reset to the origin bubble sort");
        }
        Commands::History { run } => {
            let store = FsArtifactStore::new(&config.storage.root).await?;
            match run {
                Some(id) => {
                    let run_id: RunId = id.parse().map_err(|_| anyhow::anyhow!("Invalid run ID: {}", id))?;
                    let records = store.list_generations(run_id).await?;
                    println!("Run {} ({} accepted)", run_id, records.len());
                    for record in records {
                        println!(
                            "  gen {:>4} | {:>10} | {} | {}",
                            record.generation,
                            format_latency(record.latency()),
                            if record.improvement { "improvement" } else { "neutral" },
                            record.accepted_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
                None => {
                    let runs = store.list_runs().await?;
                    println!("Runs ({})", runs.len());
                    for run_id in runs {
                        let records = store.list_generations(run_id).await?;
                        let best = records.last().map(|r| format_latency(r.latency()));
                        println!(
                            "  {} | {} accepted | best {}",
                            run_id,
                            records.len(),
                            best.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
        }
        Commands::Evaluate { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let workload = workload(&config);
            let pipeline = EvaluationPipeline::new(&config);
            let outcome = pipeline.evaluate(&CandidateSource::initial(text), &workload).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

/// Apply command-line overrides and check the result again.
fn apply_overrides(
    mut config: QuineConfig,
    root: Option<PathBuf>,
    generations: Option<u32>,
) -> Result<QuineConfig> {
    if let Some(root) = root {
        config.storage.root = root;
    }
    if let Some(generations) = generations {
        config.evolution.max_generations = generations;
    }
    config.validate().context("invalid command-line override")?;
    Ok(config)
}

fn workload(config: &QuineConfig) -> Workload {
    let settings = &config.workload;
    Workload::generate(settings.seed, settings.size, settings.bound)
}

async fn run(config: QuineConfig) -> Result<()> {
    let mut store = FsArtifactStore::new(&config.storage.root).await?;
    let initial = match store.load_live().await? {
        Some(text) => CandidateSource::initial(text),
        None => {
            info!("No live source found, starting from the origin bubble sort");
            store.save_live(ORIGIN_SOURCE).await?;
            CandidateSource::origin()
        }
    };

    let workload = workload(&config);
    info!(
        "Run {}: {} generations, workload of {} values (seed {})",
        store.run_id(),
        config.evolution.max_generations,
        workload.len(),
        workload.seed()
    );
    if config.proposer.api_key.is_none() {
        warn!("API_KEY is not set");
    }

    let pipeline = EvaluationPipeline::new(&config);
    let mutator = LlmMutator::new(&config.proposer)?;
    let mut controller = EvolutionController::start(
        pipeline,
        mutator,
        store,
        workload,
        config.evolution.clone(),
        initial,
    )
    .await?;

    let summary = controller.run().await?;
    println!("{}", summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from(["quine", "run", "--generations", "5", "--root", "/tmp/q"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/q")));
        assert!(matches!(cli.command, Commands::Run { generations: Some(5) }));
    }

    #[test]
    fn test_parse_history_and_evaluate() {
        let cli = Cli::try_parse_from(["quine", "-v", "history", "--run", "01ARZ3NDEKTSV4RRFFQ69G5FAV"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::History { run: Some(_) }));

        let cli = Cli::try_parse_from(["quine", "evaluate", "candidate.rs"]).unwrap();
        assert!(matches!(cli.command, Commands::Evaluate { file } if file == PathBuf::from("candidate.rs")));
    }

    #[test]
    fn test_overrides_are_applied_and_validated() {
        let config = apply_overrides(QuineConfig::default(), Some(PathBuf::from("/tmp/q")), Some(7)).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/tmp/q"));
        assert_eq!(config.evolution.max_generations, 7);

        let config = apply_overrides(QuineConfig::default(), None, None).unwrap();
        assert_eq!(config, QuineConfig::default());

        assert!(apply_overrides(QuineConfig::default(), Some(PathBuf::new()), None).is_err());
    }

    #[test]
    fn test_evaluate_requires_file() {
        assert!(Cli::try_parse_from(["quine", "evaluate"]).is_err());
    }
}
