//! concord CLI: fact extraction and cross-document conflict detection.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use concord::config::ConcordConfig;
use concord::export;
use concord::extract::{Extractor, FactFamily};
use concord::ingest::{Ingestor, conflict_summaries};
use concord::normalize::Normalizer;
use concord::store::KnowledgeBase;

#[derive(Parser)]
#[command(name = "concord", version, about = "Fact extraction and conflict detection")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest CSV documents as one batch and report conflicts.
    Check {
        /// CSV files, ingested in the order given.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the knowledge-base snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the facts extracted from one text unit.
    Extract {
        text: String,
    },

    /// Print the canonical form of an expression.
    Normalize {
        expr: String,

        /// Fail instead of falling back to the trimmed input.
        #[arg(long)]
        strict: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConcordConfig::load(path)?,
        None => ConcordConfig::default(),
    };

    match cli.command {
        Commands::Check { files, json } => {
            let ingestor = Ingestor::new(&config);
            let mut kb = KnowledgeBase::new();
            let report = ingestor.run_files(&mut kb, &files)?;

            if json {
                println!("{}", export::to_json(&kb).into_diagnostic()?);
                return Ok(());
            }

            for skip in report.skipped() {
                println!("skipped: {skip}");
            }

            if kb.has_conflicts() {
                println!("Conflict(s) detected between documents!");
                for line in conflict_summaries(&kb) {
                    println!("  - {line}");
                }
            }

            println!(
                "{} document(s), {} fact(s), {} conflict(s)",
                report.outcomes.len(),
                kb.len(),
                kb.conflict_log().len()
            );
        }

        Commands::Extract { text } => {
            let extractor = Extractor::new(&config);
            let facts = extractor.extract(&text);
            if facts.is_empty() {
                println!("No facts found.");
            }
            for (key, value) in &facts {
                println!("[{}] {key} = {value}", FactFamily::of_key(key));
            }
        }

        Commands::Normalize { expr, strict } => {
            let normalizer = Normalizer::new(config.normalizer.clone());
            if strict {
                println!("{}", normalizer.try_normalize(&expr)?);
            } else {
                println!("{}", normalizer.normalize(&expr));
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
