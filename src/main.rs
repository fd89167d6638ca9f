//! Corpus-Harvest main entry point
//!
//! This is the command-line interface for the Corpus-Harvest document crawler.

use anyhow::{Context, Result};
use clap::Parser;
use corpus_harvest::checkpoint::CheckpointStore;
use corpus_harvest::config::{load_config_with_hash, Config};
use corpus_harvest::crawler::{run_crawl, JsonMetadataCatalog, MetadataFilter, MetadataSource};
use corpus_harvest::model::{Metadata, SentenceEntityAnnotation};
use corpus_harvest::output::{
    analyze_corpus, annotate_chapters, export_tasks, load_statistics, print_corpus_statistics,
    print_statistics, FileOutputHandler,
};
use corpus_harvest::Selection;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Corpus-Harvest: a checkpointed corpus crawler
///
/// Corpus-Harvest crawls the documents listed in a metadata file, splits
/// them into sentence-level chapter trees and writes each chapter as XML
/// and JSON. Interrupted runs resume from the checkpoint file.
#[derive(Parser, Debug)]
#[command(name = "corpus-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A checkpointed corpus crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["status", "annotate", "analyze", "export_tasks"])]
    dry_run: bool,

    /// Show progress from the checkpoint file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "annotate", "analyze", "export_tasks"])]
    status: bool,

    /// Apply a JSON file of entity annotations to chapters already written
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["dry_run", "status", "analyze", "export_tasks"]
    )]
    annotate: Option<PathBuf>,

    /// Count pages, sentences and words of the chapters already written
    #[arg(long, conflicts_with = "export_tasks")]
    analyze: bool,

    /// Write one labeling task per sentence of every written chapter into DIR
    #[arg(long, value_name = "DIR")]
    export_tasks: Option<PathBuf>,

    /// Restrict --export-tasks to one genre directory (e.g. newTestament)
    #[arg(long, value_name = "GENRE", requires = "export_tasks")]
    genre: Option<String>,

    /// Crawl every document again, including completed ones
    #[arg(long, conflicts_with = "only")]
    force_all: bool,

    /// Crawl exactly these document ids (comma separated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    only: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.force_all {
        config.checkpoint.force_all = true;
    }
    if !cli.only.is_empty() {
        config.checkpoint.force_ids = cli.only.clone();
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.status {
        handle_status(&config)
    } else if let Some(path) = &cli.annotate {
        handle_annotate(&config, path)
    } else if cli.analyze {
        handle_analyze(&config)
    } else if let Some(dir) = &cli.export_tasks {
        handle_export_tasks(&config, dir, cli.genre.as_deref())
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_harvest=info,warn"),
            1 => EnvFilter::new("corpus_harvest=debug,info"),
            2 => EnvFilter::new("corpus_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
///
/// Never creates the checkpoint file.
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== Corpus-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Name: {}", config.crawler.name);
    println!(
        "  Domain: {} / {}",
        config.crawler.domain, config.crawler.sub_domain
    );
    println!("  Task timeout: {}s", config.crawler.timeout_secs);
    println!(
        "  Formats: {}",
        config
            .crawler
            .formats
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(", ")
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nPaths:");
    println!("  Metadata: {}", config.paths.metadata_path.display());
    println!("  Checkpoint: {}", config.checkpoint_path().display());
    println!("  Output: {}", config.paths.output_dir.display());

    let filter = MetadataFilter::from(&config.selection);
    let rows = JsonMetadataCatalog::new(&config.paths.metadata_path)
        .with_filter(move |meta| filter.matches(meta))
        .load()
        .context("Failed to load metadata")?;

    let checkpoint_path = config.checkpoint_path();
    let pending: Vec<&Metadata> = if checkpoint_path.exists() {
        let store = CheckpointStore::<Metadata>::open(&checkpoint_path)?;
        let selection = Selection {
            force_all: config.checkpoint.force_all,
            force_ids: config.checkpoint.force_ids.clone(),
        };
        let ids: Vec<String> = store
            .view(None, None, &selection)
            .into_iter()
            .map(|c| c.id)
            .collect();
        rows.iter().filter(|m| ids.contains(&m.document_id)).collect()
    } else {
        rows.iter().collect()
    };

    println!("\nDocuments ({} selected, {} to crawl):", rows.len(), pending.len());
    for meta in &pending {
        println!(
            "  - {} {} ({})",
            meta.document_id,
            meta.title,
            if meta.has_chapters { "chapters" } else { "single" }
        );
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --status mode: shows progress from the checkpoint file
fn handle_status(config: &Config) -> Result<()> {
    let path = config.checkpoint_path();
    println!("Checkpoint: {}\n", path.display());

    if !path.exists() {
        println!("No crawl has been started yet.");
        return Ok(());
    }

    let store = CheckpointStore::<Metadata>::open(&path)?;
    print_statistics(&load_statistics(store.all()));
    Ok(())
}

/// Handles the --annotate mode: re-renders written chapters with annotations
fn handle_annotate(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotations {}", path.display()))?;
    let annotations: Vec<SentenceEntityAnnotation> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid annotations file {}", path.display()))?;

    let handler = FileOutputHandler::new(&config.paths.output_dir);
    let report = annotate_chapters(&handler, &annotations, &config.crawler.formats)?;

    println!(
        "✓ {} chapters annotated, {} skipped, {} annotations ignored",
        report.chapters_updated, report.chapters_skipped, report.annotations_ignored
    );
    Ok(())
}

/// Handles the --analyze mode: corpus size of the written chapters
fn handle_analyze(config: &Config) -> Result<()> {
    let stats = analyze_corpus(&config.paths.output_dir)?;
    print_corpus_statistics(&stats);
    Ok(())
}

/// Handles the --export-tasks mode: one JSON task file per written chapter
fn handle_export_tasks(config: &Config, dir: &Path, genre: Option<&str>) -> Result<()> {
    let report = export_tasks(&config.paths.output_dir, dir, genre)?;
    println!(
        "✓ {} tasks from {} chapters written to {}, {} files skipped",
        report.tasks_written,
        report.chapters_exported,
        dir.display(),
        report.files_skipped
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<()> {
    if config.checkpoint.force_all {
        tracing::info!("Re-crawling every document");
    } else if !config.checkpoint.force_ids.is_empty() {
        tracing::info!("Crawling only: {}", config.checkpoint.force_ids.join(", "));
    }

    match run_crawl(config).await {
        Ok(report) => {
            if report.documents_failed > 0 {
                tracing::warn!(
                    "{} documents left incomplete; re-run to retry them",
                    report.documents_failed
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
