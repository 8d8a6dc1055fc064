use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod classify;
mod error;
mod loader;
mod models;
mod names;
mod pipeline;
mod posterior;
mod report;
mod significance;

use classify::{classify_individual, TeamStrategy};
use models::Metric;
use names::NameGenderIndex;
use pipeline::{ReportConfig, ReportPipeline};

#[derive(Parser)]
#[command(name = "debate-gender-stats")]
#[command(about = "Gender-correlated performance statistics for debate tournament tabs", long_about = None)]
struct Cli {
    /// Log pipeline progress at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a speaker tab (one row per competitor)
    Speakers {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Analyse a team tab (one row per team with two debater columns)
    Teams {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Classify names against the reference table
    Lookup {
        #[arg(long)]
        names: PathBuf,
        #[arg(required = true)]
        full_names: Vec<String>,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    #[arg(long)]
    tab: PathBuf,
    /// Name frequency table with Name, Gender and Frequency columns
    #[arg(long)]
    names: PathBuf,
    /// Tournament name used in the report heading
    #[arg(long, default_value = "Tournament")]
    title: String,
    #[arg(long, value_delimiter = ',', default_value = "Speaks,Ranks,Wins")]
    metrics: Vec<String>,
    #[arg(long, default_value = "Speaks")]
    test_metric: String,
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,
    #[arg(long, default_value_t = significance::DEFAULT_ITERATIONS)]
    iterations: usize,
    #[arg(long, default_value_t = 80.0)]
    score_threshold: f64,
    /// Keep competitors whose speaks are exactly zero
    #[arg(long)]
    include_zero_scores: bool,
    #[arg(long, default_value_t = 60.0)]
    team_score_floor: f64,
    #[arg(long, value_enum, default_value_t = TeamStrategy::Lenient)]
    team_strategy: TeamStrategy,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1)]
    workers: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

impl AnalysisArgs {
    fn config(&self) -> anyhow::Result<ReportConfig> {
        let metrics = self
            .metrics
            .iter()
            .map(|name| name.parse::<Metric>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReportConfig {
            metrics,
            test_metric: self.test_metric.parse()?,
            significance_threshold: self.alpha,
            bootstrap_iterations: self.iterations,
            score_threshold: self.score_threshold,
            zero_score_exclusion: !self.include_zero_scores,
            team_score_floor: self.team_score_floor,
            team_strategy: self.team_strategy,
            seed: self.seed,
            workers: self.workers.max(1),
            rounds: None,
        })
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_index(path: &Path) -> anyhow::Result<NameGenderIndex> {
    let records = loader::load_names(path)
        .with_context(|| format!("failed to load name table {}", path.display()))?;
    let index = NameGenderIndex::build(&records);
    if index.is_empty() {
        warn!("name table is empty, every competitor will be unclassified");
    } else {
        info!(names = index.len(), "built name index");
    }
    Ok(index)
}

fn emit(out: Option<&Path>, body: String) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Speakers { analysis } => {
            let mut config = analysis.config()?;
            let index = load_index(&analysis.names)?;
            let tab = loader::load_speaker_tab(&analysis.tab)
                .context("speaker tab could not be loaded")?;
            config.rounds = (tab.rounds > 0).then_some(tab.rounds);

            let report = ReportPipeline::new(&index, &config)
                .speakers(&tab)
                .await
                .context("speaker analysis failed")?;
            let body = match analysis.format {
                OutputFormat::Markdown => report::render_speaker_report(&analysis.title, &report),
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
            };
            emit(analysis.out.as_deref(), body)?;
        }
        Commands::Teams { analysis } => {
            let config = analysis.config()?;
            let index = load_index(&analysis.names)?;
            let tab = loader::load_team_tab(&analysis.tab)
                .context("team tab could not be loaded")?;

            let report = ReportPipeline::new(&index, &config)
                .teams(&tab)
                .await
                .context("team analysis failed")?;
            let body = match analysis.format {
                OutputFormat::Markdown => report::render_team_report(&analysis.title, &report),
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
            };
            emit(analysis.out.as_deref(), body)?;
        }
        Commands::Lookup { names, full_names } => {
            let index = load_index(&names)?;
            for full_name in &full_names {
                println!("{full_name}: {}", classify_individual(full_name, &index));
            }
        }
    }

    Ok(())
}
