mod config;
mod http;
mod labeler;
mod scrape;

use clap::{Parser, Subcommand};
use config::Config;
use glyphmatch::classify::Classifier;
use glyphmatch::io::{load_corpus_dir, save_example};
use glyphmatch::segment::segment_payload;
use glyphmatch::session::collect_examples;
use glyphmatch::{
    AttackLoop, AttackOutcome, CorpusReport, PipelineConfig, Solver, StopReason,
    TemplateStore,
};
use http::HttpChallengeSource;
use labeler::PromptLabeler;
use scrape::Scraper;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Template-matching challenge solver (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve challenges from the server until the target score is reached.
    Solve,
    /// Label challenges from the server interactively and save them to the corpus.
    Train {
        /// Stop after this many labeled examples.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Solve a base64 payload stored in a file and print the per-glyph ranking.
    Recognize {
        /// File holding the base64 image payload.
        payload: PathBuf,
        /// Number of ranked candidates to print per glyph.
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
    /// Build templates from the corpus and print the ingestion report.
    Corpus,
}

#[derive(Debug, Serialize)]
struct AttackRecord {
    stop: String,
    successes: u32,
    attempts: u32,
    failures: u32,
    success_ratio: f64,
    elapsed_secs: f64,
    token: Option<String>,
}

impl From<AttackOutcome> for AttackRecord {
    fn from(value: AttackOutcome) -> Self {
        let stop = match &value.stop {
            StopReason::TargetReached => "target_reached".to_string(),
            StopReason::TimeBudgetExhausted => "time_budget_exhausted".to_string(),
            StopReason::SourceExhausted => "source_exhausted".to_string(),
            StopReason::Aborted(err) => format!("aborted: {err}"),
        };
        Self {
            stop,
            successes: value.score.successes,
            attempts: value.score.attempts,
            failures: value.score.failures,
            success_ratio: value.score.success_ratio(),
            elapsed_secs: value.elapsed.as_secs_f64(),
            token: value.token,
        }
    }
}

#[derive(Debug, Serialize)]
struct CorpusRecord {
    examples: usize,
    accepted: usize,
    dropped_mismatch: usize,
    dropped_decode: usize,
    templates: usize,
}

impl From<CorpusReport> for CorpusRecord {
    fn from(value: CorpusReport) -> Self {
        Self {
            examples: value.examples(),
            accepted: value.accepted,
            dropped_mismatch: value.dropped_mismatch,
            dropped_decode: value.dropped_decode,
            templates: value.templates_added,
        }
    }
}

#[derive(Debug, Serialize)]
struct CandidateRecord {
    label: char,
    similarity: f64,
}

#[derive(Debug, Serialize)]
struct GlyphRecord {
    start_column: usize,
    width: usize,
    candidates: Vec<CandidateRecord>,
}

#[derive(Debug, Serialize)]
struct RecognizeRecord {
    answer: String,
    glyphs: Vec<GlyphRecord>,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_config(cli: &Cli) -> CliResult<Config> {
    if !cli.config.exists() {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let config_text = fs::read_to_string(&cli.config)?;
    Ok(serde_json::from_str(&config_text)?)
}

fn build_store(config: &Config) -> CliResult<(TemplateStore, CorpusReport)> {
    let corpus = load_corpus_dir(&config.corpus_dir)?;
    let pipeline = PipelineConfig::from(&config.pipeline);
    let (store, report) = TemplateStore::build_with_report(corpus, pipeline);
    tracing::info!(
        templates = store.len(),
        accepted = report.accepted,
        dropped = report.dropped_mismatch + report.dropped_decode,
        "templates loaded"
    );
    Ok((store, report))
}

fn http_source(config: &Config) -> CliResult<HttpChallengeSource> {
    let scraper = Scraper::new(&config.markers)?;
    Ok(HttpChallengeSource::new(
        config.server_url.clone(),
        config.submit_url(),
        config.answer_field.clone(),
        Duration::from_secs(config.request_timeout_secs),
        scraper,
    )?)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive("glyphmatch=info".parse()?)
                    .add_directive("glyphmatch_cli=info".parse()?),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config = load_config(&cli)?;
    let Some(command) = &cli.command else {
        return Err("no command given; see --help".into());
    };

    match command {
        Command::Solve => {
            let (store, _) = build_store(&config)?;
            if store.is_empty() {
                return Err(format!("no usable templates in {}", config.corpus_dir).into());
            }
            let solver = Solver::new(&store).with_config(config.solve.to_solve_config()?);
            let mut source = http_source(&config)?;
            let outcome =
                AttackLoop::new(solver, config.attack.to_attack_config()).run(&mut source)?;
            print_json(&AttackRecord::from(outcome))?;
        }
        Command::Train { limit } => {
            let mut source = http_source(&config)?;
            let stdin = std::io::stdin();
            let mut labeler = PromptLabeler::new(stdin.lock(), std::io::stderr());
            let corpus_dir = PathBuf::from(&config.corpus_dir);
            let report = collect_examples(&mut source, &mut labeler, *limit, |example| {
                let path = save_example(&corpus_dir, &example)?;
                tracing::info!(path = %path.display(), "example saved");
                Ok(())
            })?;
            tracing::info!(
                fetched = report.fetched,
                labeled = report.labeled,
                skipped = report.skipped,
                undecodable = report.undecodable,
                "labeling finished"
            );
        }
        Command::Recognize { payload, top } => {
            let (store, _) = build_store(&config)?;
            let payload = fs::read(payload)?;
            let solve_cfg = config.solve.to_solve_config()?;
            let glyphs = segment_payload(&payload, store.pipeline())?;
            let answer = Solver::new(&store).with_config(solve_cfg).answer_glyphs(&glyphs);
            let classifier = Classifier::new(&store).with_min_similarity(solve_cfg.min_similarity);
            let glyphs = glyphs
                .iter()
                .map(|glyph| GlyphRecord {
                    start_column: glyph.start_column(),
                    width: glyph.width(),
                    candidates: classifier
                        .rank(glyph)
                        .into_iter()
                        .take(*top)
                        .map(|c| CandidateRecord {
                            label: c.label,
                            similarity: c.similarity(),
                        })
                        .collect(),
                })
                .collect();
            print_json(&RecognizeRecord {
                answer: answer.text,
                glyphs,
            })?;
        }
        Command::Corpus => {
            let (_, report) = build_store(&config)?;
            print_json(&CorpusRecord::from(report))?;
        }
    }

    Ok(())
}
