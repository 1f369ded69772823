// GutenKu CLI entry point.
//
// Two subcommands:
//   train   Build a Markov model from chapter text and save it as JSON.
//   evolve  Extract verse pools from chapters, run the GA, print the haiku
//           and its metric breakdown (or JSON with --json).
//
// Usage:
//   gutenku train --chapters <dir|file>... --out <model.json> [--workers N]
//     [--config <ga.json>] [--sequential]
//   gutenku evolve --chapters <dir|file>... [--model <model.json>]
//     [--config <ga.json>] [--population N] [--generations N]
//     [--crossover R] [--mutation R] [--seed N] [--no-early-stop]
//     [--max-evaluations N] [--return-count N] [--time-limit SECS] [--json]
//
// A directory contributes one chapter per .txt file; a single file is split
// on CHAPTER heading lines. Logging goes to stderr via tracing; set RUST_LOG
// to change the level (default: info). Any error exits with status 1.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use gutenku_engine::corpus::load_chapters;
use gutenku_engine::evolution::{DecodedHaiku, Evolution, StopReason, StopSignal, decode};
use gutenku_engine::trainer::{DEFAULT_YIELD_EVERY, ParallelTrainer, train_sequential};
use gutenku_engine::{GaConfig, MarkovEvaluator, ModelNotReadyPolicy, Result, VersePools};

const MIN_POPULATION: usize = 10;
const MIN_GENERATIONS: u32 = 5;

#[derive(Parser, Debug)]
#[command(name = "gutenku", about = "Evolve haiku from public-domain books")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a Markov model from chapter text.
    Train(TrainArgs),
    /// Evolve haiku from chapter text.
    Evolve(EvolveArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Chapter files or directories of .txt chapters.
    #[arg(long, required = true, num_args = 1..)]
    chapters: Vec<PathBuf>,

    /// Where to write the model JSON.
    #[arg(long)]
    out: PathBuf,

    /// Worker threads. Overrides `worker_count` from --config (default: CPUs - 1).
    #[arg(long)]
    workers: Option<usize>,

    /// GA config JSON; only `worker_count` is used here.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Train in this thread instead of spawning workers.
    #[arg(long)]
    sequential: bool,
}

#[derive(Args, Debug)]
struct EvolveArgs {
    /// Chapter files or directories of .txt chapters.
    #[arg(long, required = true, num_args = 1..)]
    chapters: Vec<PathBuf>,

    /// Trained model JSON. Without one, Markov flow scores are neutral.
    #[arg(long)]
    model: Option<PathBuf>,

    /// GA config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    population: Option<usize>,

    #[arg(long)]
    generations: Option<u32>,

    /// Crossover rate in [0, 1].
    #[arg(long)]
    crossover: Option<f64>,

    /// Mutation rate in [0, 1].
    #[arg(long)]
    mutation: Option<f64>,

    #[arg(long)]
    seed: Option<u32>,

    /// Run every generation even after convergence. Also lifts the
    /// evaluation budget.
    #[arg(long)]
    no_early_stop: bool,

    /// Metric computations after which an early-stopping run ends.
    #[arg(long)]
    max_evaluations: Option<u64>,

    #[arg(long)]
    return_count: Option<usize>,

    /// Stop after this many seconds, keeping the best so far.
    #[arg(long, value_name = "SECS")]
    time_limit: Option<u64>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Train(args) => run_train(args),
        Command::Evolve(args) => run_evolve(args),
    };
    exit_code(outcome, &mut std::io::stderr())
}

/// Report a failed command once on `err` and map the outcome to a status.
fn exit_code(outcome: Result<()>, err: &mut impl Write) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Worker count from --workers, else the config file, else the default.
fn build_trainer(args: &TrainArgs) -> Result<ParallelTrainer> {
    let mut config = match &args.config {
        Some(path) => GaConfig::from_json_file(path)?,
        None => GaConfig::default(),
    };
    if args.workers.is_some() {
        config.worker_count = args.workers;
    }
    Ok(ParallelTrainer::from_config(&config.sanitized()))
}

fn run_train(args: TrainArgs) -> Result<()> {
    let chapters = load_chapters(&args.chapters)?;
    let model = if args.sequential {
        train_sequential(&chapters, DEFAULT_YIELD_EVERY, |_, _| {})
    } else {
        let trainer = build_trainer(&args)?;
        info!(workers = trainer.worker_count(), "training markov model");
        trainer.train(&chapters, |done, total| {
            info!(done, total, "training batch finished");
        })?
    };
    model.save(&args.out)?;

    let stats = model.stats();
    println!("Chapters:       {}", chapters.len());
    println!("Vocabulary:     {}", stats.vocabulary);
    println!("Bigram keys:    {} ({} transitions)", stats.bigram_keys, stats.total_bigrams);
    println!("Trigram keys:   {} ({} transitions)", stats.trigram_keys, stats.total_trigrams);
    println!("Saved to {}", args.out.display());
    Ok(())
}

/// Merge CLI overrides onto the file config (or defaults) and clamp.
fn build_config(args: &EvolveArgs) -> Result<GaConfig> {
    let mut config = match &args.config {
        Some(path) => GaConfig::from_json_file(path)?,
        None => GaConfig::default(),
    };
    if let Some(population) = args.population {
        config.population_size = population;
    }
    if let Some(generations) = args.generations {
        config.max_generations = generations;
    }
    if let Some(rate) = args.crossover {
        config.crossover_rate = rate;
    }
    if let Some(rate) = args.mutation {
        config.mutation_rate = rate;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_early_stop {
        config.early_stop = false;
    }
    if args.max_evaluations.is_some() {
        config.max_evaluations = args.max_evaluations;
    }
    if let Some(count) = args.return_count {
        config.return_count = count;
    }
    config.population_size = config.population_size.max(MIN_POPULATION);
    config.max_generations = config.max_generations.max(MIN_GENERATIONS);
    Ok(config.sanitized())
}

#[derive(Serialize)]
struct EvolveOutput {
    seed: u32,
    generations_run: u32,
    stop_reason: StopReason,
    converged: bool,
    stopped_early: bool,
    evaluations: u64,
    haiku: Vec<DecodedHaiku>,
}

fn run_evolve(args: EvolveArgs) -> Result<()> {
    let config = build_config(&args)?;
    let chapters = load_chapters(&args.chapters)?;
    let pools = VersePools::from_chapters(&chapters);
    info!(
        five = pools.five.len(),
        seven = pools.seven.len(),
        "verse pools ready"
    );
    let markov = match &args.model {
        Some(path) => Some(MarkovEvaluator::load(path, ModelNotReadyPolicy::Fail)?),
        None => None,
    };

    let stop = StopSignal::new();
    if let Some(secs) = args.time_limit {
        let timer = stop.clone();
        let _timer = thread::Builder::new()
            .name("time-limit".into())
            .spawn(move || {
                thread::sleep(Duration::from_secs(secs));
                timer.stop();
            })?;
    }

    let result = Evolution::run(&pools, markov.as_ref(), &config, Some(&stop))?;
    let haiku = result
        .best_chromosomes
        .iter()
        .map(|c| decode(c, &pools))
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        let output = EvolveOutput {
            seed: result.seed,
            generations_run: result.generations_run,
            stop_reason: result.stop_reason,
            converged: result.converged(),
            stopped_early: result.stopped_early(),
            evaluations: result.evaluations,
            haiku,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Seed {} | {} generations | {} evaluations | stopped by {}",
        result.seed,
        result.generations_run,
        result.evaluations,
        result.stop_reason.as_str(),
    );
    for (rank, decoded) in haiku.iter().enumerate() {
        println!();
        println!("#{} (fitness {:.3})", rank + 1, decoded.fitness.unwrap_or(f64::NAN));
        for line in &decoded.verses {
            println!("    {line}");
        }
        if let Some(m) = &decoded.metrics {
            println!(
                "  nature {} | repeated {} | weak starts {} | proper nouns {}",
                m.nature_words, m.repeated_words, m.weak_starts, m.proper_nouns
            );
            println!(
                "  sentiment {:.2} | grammar {:.2} | markov {:.2} | trigram {:.2}",
                m.sentiment, m.grammar, m.markov_flow, m.trigram_flow
            );
            println!(
                "  uniqueness {:.2} | alliteration {:.2} | distance {:.2} | balance {:.2}",
                m.uniqueness, m.alliteration, m.verse_distance, m.line_length_balance
            );
            println!(
                "  imagery {:.2} | coherence {:.2} | verbs {:.2}",
                m.imagery_density, m.semantic_coherence, m.verb_presence
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_are_clamped() {
        let cli = Cli::parse_from([
            "gutenku",
            "evolve",
            "--chapters",
            "book.txt",
            "--population",
            "3",
            "--generations",
            "1",
            "--crossover",
            "1.5",
            "--seed",
            "7",
            "--no-early-stop",
        ]);
        let Command::Evolve(args) = cli.command else {
            panic!("expected evolve");
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.population_size, 10);
        assert_eq!(config.max_generations, 5);
        assert_eq!(config.crossover_rate, 1.0);
        assert_eq!(config.seed, Some(7));
        assert!(!config.early_stop);
        assert_eq!(config.mutation_rate, 0.12);
        assert_eq!(config.evaluation_budget(), None);
    }

    #[test]
    fn max_evaluations_flag_sets_the_budget() {
        let cli = Cli::parse_from([
            "gutenku",
            "evolve",
            "--chapters",
            "book.txt",
            "--max-evaluations",
            "900",
        ]);
        let Command::Evolve(args) = cli.command else {
            panic!("expected evolve");
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.max_evaluations, Some(900));
        assert_eq!(config.evaluation_budget(), Some(900));
    }

    #[test]
    fn trainer_workers_come_from_flag_then_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ga.json");
        std::fs::write(&path, r#"{ "worker_count": 3 }"#).unwrap();
        let config_arg = path.to_str().unwrap();

        let parse = |extra: &[&str]| {
            let mut argv = vec!["gutenku", "train", "--chapters", "a", "--out", "m.json"];
            argv.extend_from_slice(extra);
            let Command::Train(args) = Cli::parse_from(argv).command else {
                panic!("expected train");
            };
            build_trainer(&args).unwrap().worker_count()
        };
        assert_eq!(parse(&["--config", config_arg]), 3);
        assert_eq!(parse(&["--config", config_arg, "--workers", "2"]), 2);
        assert_eq!(parse(&[]), GaConfig::default().workers());
    }

    #[test]
    fn failures_are_reported_once() {
        let mut err = Vec::new();
        assert_eq!(exit_code(Ok(()), &mut err), ExitCode::SUCCESS);
        assert!(err.is_empty());

        let failure = Err(gutenku_engine::EngineError::InvalidConfig("bad".into()));
        assert_eq!(exit_code(failure, &mut err), ExitCode::FAILURE);
        let text = String::from_utf8(err).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("error: "), "{text}");
    }

    #[test]
    fn train_requires_chapters_and_out() {
        assert!(Cli::try_parse_from(["gutenku", "train", "--out", "m.json"]).is_err());
        let cli = Cli::try_parse_from([
            "gutenku", "train", "--chapters", "a", "b", "--out", "m.json", "--workers", "3",
        ])
        .unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.chapters.len(), 2);
        assert_eq!(args.workers, Some(3));
        assert!(!args.sequential);
    }
}
