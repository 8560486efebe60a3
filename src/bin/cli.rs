//! issue-harvest CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use issue_harvest::{
    error::Result,
    models::Config,
    pipeline::{self, RetryPolicy},
    services::{JiraClient, Normalizer},
    storage::{CheckpointStore, load_checkpoint},
};

/// issue-harvest - resumable Jira issue scraper
#[derive(Parser, Debug)]
#[command(
    name = "issue-harvest",
    version,
    about = "Scrape Jira projects into per-project JSONL files"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "harvest.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every issue of the given projects, resuming from the checkpoint
    Scrape {
        /// Project keys, e.g. HADOOP SPARK KAFKA
        #[arg(long, num_args = 1.., required = true)]
        projects: Vec<String>,

        /// Issues per request (maxResults)
        #[arg(long, alias = "max-results", value_parser = clap::value_parser!(u64).range(1..))]
        page_size: Option<u64>,

        /// Maximum concurrent HTTP requests
        #[arg(long, value_parser = parse_positive)]
        concurrency: Option<usize>,

        /// Directory for JSONL output
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Checkpoint file path
        #[arg(long)]
        checkpoint_file: Option<PathBuf>,
    },

    /// Show checkpoint entries
    Status {
        /// Checkpoint file path
        #[arg(long)]
        checkpoint_file: Option<PathBuf>,
    },

    /// Forget checkpoint entries so projects start again from offset 0
    Reset {
        /// Project keys to reset
        #[arg(required = true)]
        projects: Vec<String>,

        /// Checkpoint file path
        #[arg(long)]
        checkpoint_file: Option<PathBuf>,
    },

    /// Fetch a single issue and print its normalized record
    Issue {
        /// Issue key, e.g. HADOOP-1234
        key: String,
    },

    /// Validate configuration
    Validate,
}

fn parse_positive(raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Scrape {
            projects,
            page_size,
            concurrency,
            output_dir,
            checkpoint_file,
        } => {
            if let Some(n) = page_size {
                config.scrape.page_size = n;
            }
            if let Some(n) = concurrency {
                config.client.max_concurrent = n;
            }
            if let Some(dir) = output_dir {
                config.scrape.output_dir = dir;
            }
            if let Some(path) = checkpoint_file {
                config.scrape.checkpoint_file = path;
            }

            let summary = pipeline::run_harvest(&config, &projects).await?;
            summary.into_result()?;
            log::info!("Harvest complete!");
        }

        Command::Status { checkpoint_file } => {
            let path = checkpoint_file.unwrap_or(config.scrape.checkpoint_file);
            let checkpoint = load_checkpoint(&path).await;
            if checkpoint.is_empty() {
                log::info!("No checkpoint entries in {}", path.display());
            }
            for (project, entry) in checkpoint.iter() {
                log::info!(
                    "{}: next offset {}, {}",
                    project,
                    entry.last_start_at,
                    if entry.completed {
                        "completed"
                    } else {
                        "in progress"
                    }
                );
            }
        }

        Command::Reset {
            projects,
            checkpoint_file,
        } => {
            let path = checkpoint_file.unwrap_or(config.scrape.checkpoint_file);
            let store = CheckpointStore::open(&path).await;
            let removed = store.reset(&projects).await?;
            log::info!(
                "Reset {} of {} project(s) in {}",
                removed,
                projects.len(),
                path.display()
            );
        }

        Command::Issue { key } => {
            config.validate()?;
            let client = JiraClient::new(&config)?;
            let normalizer = Normalizer::new(&config.client.base_url()?);
            let policy = RetryPolicy::from_config(&config.retry);

            let raw = policy
                .run(&key, || client.fetch_issue(&key))
                .await?;
            let record = normalizer.normalize(&raw);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
