use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use docgen_splitter::config::{Config, DEFAULT_CONFIG_FILE};
use docgen_splitter::indexer::Indexer;
use docgen_splitter::provider::project::Project;

#[derive(Parser)]
#[command(name = "docgen", version, about = "Generate documentation for your project")]
struct Cli {
    /// Config file (defaults to docgen.json in the project root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or update the documentation index
    Index {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also extract declarations inside function bodies
        #[arg(long)]
        deep: bool,

        /// Print the chunks as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Index { path, deep, json } => {
            let config_path = cli
                .config
                .unwrap_or_else(|| path.join(DEFAULT_CONFIG_FILE));
            let mut config = Config::load(&config_path)?;
            config.deep |= deep;
            config.validate().context("invalid configuration")?;

            let project = Project::load(&path, &config)
                .with_context(|| format!("failed to load project at {}", path.display()))?;
            let report = Indexer::new(&project, config.splitter_options())
                .fail_fast(config.fail_fast)
                .index_project()?;

            if json {
                let out = serde_json::to_string_pretty(&report.chunks)
                    .context("failed to serialize chunks")?;
                println!("{out}");
            } else if report.chunks.is_empty() {
                warn!(
                    "No code chunks found. Make sure you have source files in your {} directory.",
                    config.source_root
                );
            } else {
                println!(
                    "Found {} code chunks{} across {} files",
                    report.chunks.len(),
                    if config.deep { " (deep mode)" } else { "" },
                    report.files_seen()
                );
            }

            for failure in &report.failed {
                eprintln!("skipped {}: {}", failure.path.display(), failure.error);
            }
        }
    }

    Ok(())
}
