//! keyplan: command-line runner for the cluster, keyword, and taxonomy stages.
//!
//! Every subcommand prints pretty JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyplan_cluster::{build_taxonomy, cluster_totals};
use keyplan_core::{location_code, Cluster, KeywordRow, RunInput, StatusKind};
use keyplan_inference::OpenAIBackend;
use keyplan_pipeline::{ClusterGenerator, KeywordPipeline, TaxonomyRun};
use keyplan_provider::{DataForSeoClient, RequestScheduler, SchedulerConfig};

#[derive(Parser)]
#[command(name = "keyplan")]
#[command(author, version, about = "Keyword clusters and enriched keyword plans")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate candidate clusters for a run
    Clusters {
        /// Run input JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Enrich selected clusters with keyword metrics
    Keywords {
        /// Run input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Clusters JSON file (a list, or the output of `clusters`)
        #[arg(short, long)]
        clusters: PathBuf,

        /// Cluster ids to keep (default: all)
        #[arg(short, long, num_args = 1..)]
        select: Vec<String>,
    },

    /// Build a topic taxonomy
    Taxonomy {
        /// Keyword file, one keyword per line
        #[arg(short, long, required_unless_present = "input", conflicts_with = "input")]
        keywords: Option<PathBuf>,

        /// Run input JSON file; expands its seed families first
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Total search volume per cluster
    Totals {
        /// Clusters JSON file
        #[arg(short, long)]
        clusters: PathBuf,

        /// Keyword rows JSON file (a list, or the output of `keywords`)
        #[arg(short, long)]
        rows: PathBuf,
    },

    /// Check that the metrics provider answers with data
    ProviderCheck {
        /// Country code (US or UK)
        #[arg(short, long, default_value = keyplan_core::defaults::DEFAULT_COUNTRY)]
        country: String,
    },
}

/// Initialize tracing on stderr.
///
/// `LOG_FORMAT` selects `json` or `text` (default); `RUST_LOG` overrides the
/// default `keyplan=info` filter.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "keyplan=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Clusters { input } => cmd_clusters(&input).await,
        Commands::Keywords {
            input,
            clusters,
            select,
        } => cmd_keywords(&input, &clusters, &select).await,
        Commands::Taxonomy { keywords, input } => match (keywords, input) {
            (Some(keywords), _) => cmd_taxonomy_file(&keywords),
            (None, Some(input)) => cmd_taxonomy_run(&input).await,
            (None, None) => anyhow::bail!("either --keywords or --input is required"),
        },
        Commands::Totals { clusters, rows } => cmd_totals(&clusters, &rows),
        Commands::ProviderCheck { country } => cmd_provider_check(&country).await,
    }
}

// =============================================================================
// FILE LOADING
// =============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// A bare list, or a stage output object carrying the list under a key.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClustersFile {
    Wrapped { clusters: Vec<Cluster> },
    Bare(Vec<Cluster>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowsFile {
    Wrapped { rows: Vec<KeywordRow> },
    Bare(Vec<KeywordRow>),
}

fn load_clusters(path: &Path) -> Result<Vec<Cluster>> {
    Ok(match read_json::<ClustersFile>(path)? {
        ClustersFile::Wrapped { clusters } | ClustersFile::Bare(clusters) => clusters,
    })
}

fn load_rows(path: &Path) -> Result<Vec<KeywordRow>> {
    Ok(match read_json::<RowsFile>(path)? {
        RowsFile::Wrapped { rows } | RowsFile::Bare(rows) => rows,
    })
}

fn load_input(path: &Path) -> Result<RunInput> {
    let input: RunInput = read_json(path)?;
    anyhow::ensure!(!input.target_url.trim().is_empty(), "targetUrl is required");
    Ok(input)
}

/// One keyword per non-blank line.
fn load_keywords(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn provider_client() -> Result<DataForSeoClient> {
    let scheduler = RequestScheduler::start(SchedulerConfig::from_env());
    Ok(DataForSeoClient::from_env(scheduler)?)
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn cmd_clusters(input: &Path) -> Result<ExitCode> {
    let input = load_input(input)?;
    let generator = ClusterGenerator::new(Arc::new(OpenAIBackend::from_env()?));
    let generation = generator.generate(&input).await;
    print_json(&generation)?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_keywords(input: &Path, clusters: &Path, select: &[String]) -> Result<ExitCode> {
    let input = load_input(input)?;
    let clusters = load_clusters(clusters)?;
    let pipeline = KeywordPipeline::new(Arc::new(provider_client()?));

    let run = pipeline.run(&input, &clusters, select).await;
    print_json(&run)?;
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct TaxonomyOutput<'a> {
    #[serde(flatten)]
    build: &'a keyplan_core::TaxonomyBuild,
    flat: Vec<keyplan_core::FlatTaxonomyNode<'a>>,
}

fn cmd_taxonomy_file(keywords: &Path) -> Result<ExitCode> {
    let keywords = load_keywords(keywords)?;
    let build = build_taxonomy(&keywords);
    print_json(&TaxonomyOutput {
        flat: build.taxonomy.flatten(),
        build: &build,
    })?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_taxonomy_run(input: &Path) -> Result<ExitCode> {
    let input = load_input(input)?;
    let run = TaxonomyRun::new(
        Arc::new(OpenAIBackend::from_env()?),
        Arc::new(provider_client()?),
    );
    let report = run.run(&input).await;
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_totals(clusters: &Path, rows: &Path) -> Result<ExitCode> {
    let clusters = load_clusters(clusters)?;
    let rows = load_rows(rows)?;
    print_json(&cluster_totals(&clusters, &rows))?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_provider_check(country: &str) -> Result<ExitCode> {
    let client = provider_client()?;
    let check = client.check(location_code(country)).await;
    print_json(&check)?;
    Ok(if check.status == StatusKind::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
