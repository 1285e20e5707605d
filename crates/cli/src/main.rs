use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_retrieval::{
    Candidate, LexicalScorer, PipelineConfig, RetrievalPipeline, SearchFilters,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod corpus;

#[derive(Parser)]
#[command(name = "context-retrieve")]
#[command(about = "Deduplicate, expand and rerank retrieval candidates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked retrieval: search, expand, rerank, expand again
    Ranked(RankedArgs),

    /// Broad retrieval: deduplicated similarity hits, no reranking
    Collect(SourceArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Corpus JSON: {"documents":[{"doc_id":..., "chunks":[...]}]}
    #[arg(long)]
    corpus: PathBuf,

    /// Search query
    #[arg(long, short = 'q')]
    query: String,

    /// Pipeline config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only documents under these prefixes (repeatable)
    #[arg(long = "include-doc")]
    include_docs: Vec<String>,

    /// Skip documents under these prefixes (repeatable)
    #[arg(long = "exclude-doc")]
    exclude_docs: Vec<String>,

    /// Substring or glob the doc_id must match
    #[arg(long)]
    doc_pattern: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct RankedArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Number of reranked results to keep
    #[arg(long, short = 'n', default_value_t = 10)]
    limit: usize,
}

impl SourceArgs {
    fn filters(&self) -> SearchFilters {
        SearchFilters {
            include_docs: self.include_docs.clone(),
            exclude_docs: self.exclude_docs.clone(),
            doc_pattern: self.doc_pattern.clone(),
        }
    }
}

#[derive(Serialize)]
struct RetrievalOutput<'a> {
    query: &'a str,
    pipeline: &'static str,
    results: Vec<Candidate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling in-flight query");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Ranked(args) => run_ranked(args, &cancel).await?,
        Commands::Collect(args) => run_collect(args, &cancel).await?,
    }

    Ok(())
}

async fn run_ranked(args: RankedArgs, cancel: &CancellationToken) -> Result<()> {
    let source = &args.source;
    let pipeline = build_pipeline(source)?;
    let results = pipeline
        .run_ranked(&source.query, args.limit, &source.filters(), cancel)
        .await
        .context("Ranked retrieval failed")?;
    print_output(source, "ranked", results)
}

async fn run_collect(args: SourceArgs, cancel: &CancellationToken) -> Result<()> {
    let pipeline = build_pipeline(&args)?;
    let results = pipeline
        .run_collect(&args.query, &args.filters(), cancel)
        .await
        .context("Collect retrieval failed")?;
    print_output(&args, "collect", results)
}

fn build_pipeline(source: &SourceArgs) -> Result<RetrievalPipeline> {
    let config = load_config(source.config.as_deref())?;
    let index = corpus::load_index(&source.corpus)?;
    RetrievalPipeline::new(Arc::new(index), Arc::new(LexicalScorer::default()), config)
        .context("Invalid pipeline configuration")
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            PipelineConfig::from_toml_str(&raw)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn print_output(source: &SourceArgs, pipeline: &'static str, results: Vec<Candidate>) -> Result<()> {
    let output = RetrievalOutput {
        query: &source.query,
        pipeline,
        results,
    };
    let rendered = if source.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}
