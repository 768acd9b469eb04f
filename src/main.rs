//! FAQ Forge main entry point
//!
//! This is the command-line interface for FAQ Forge. Every subcommand goes
//! through `ForgeService`; commands that start background work wait for it to
//! finish before exiting.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use faq_forge::config::{load_config_or_default, Config};
use faq_forge::output::{
    print_faqs, print_job_status, print_jobs, print_page, print_pages, write_export,
};
use faq_forge::storage::{FaqFilter, FaqUpdate};
use faq_forge::ForgeService;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pages shown by `pages` when no job is given
const RECENT_PAGES_LIMIT: u32 = 100;

/// FAQ Forge: turn a website into a reviewed FAQ
///
/// FAQ Forge crawls a single site breadth-first, extracts readable content
/// from each page, and asks a text-generation service to draft question and
/// answer pairs that can be reviewed, published, and exported.
#[derive(Parser, Debug)]
#[command(name = "faq-forge")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a site and generate FAQs from its content", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site starting from a seed URL
    Crawl {
        /// Seed URL; only pages on the same host are followed
        url: String,
    },

    /// Show a job and its latest run
    Status { job_id: i64 },

    /// List all jobs, newest first
    Jobs,

    /// List the pages crawled for a job, or the most recent pages of all jobs
    Pages { job_id: Option<i64> },

    /// Show one crawled page in full
    Page { page_id: i64 },

    /// Generate FAQs from crawled content
    #[command(subcommand)]
    Generate(GenerateCommand),

    /// Review, edit, and export generated FAQs
    #[command(subcommand)]
    Faqs(FaqsCommand),

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[derive(Subcommand, Debug)]
enum GenerateCommand {
    /// Generate FAQs for a single page
    Page { page_id: i64 },

    /// Generate FAQs for every crawled page of a job that has none yet
    Job { job_id: i64 },
}

#[derive(Subcommand, Debug)]
enum FaqsCommand {
    /// List FAQs, newest first
    List(FilterArgs),

    /// Edit a FAQ or change its published flag
    Update {
        faq_id: i64,

        #[arg(long)]
        question: Option<String>,

        #[arg(long)]
        answer: Option<String>,

        #[arg(long, conflicts_with = "unpublish")]
        publish: bool,

        #[arg(long)]
        unpublish: bool,
    },

    /// Delete a FAQ
    Delete { faq_id: i64 },

    /// Write the filtered FAQs to a JSON file
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Directory the export file is written to
        #[arg(long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Only FAQs generated from this job
    #[arg(long)]
    job: Option<i64>,

    /// Only published (true) or unpublished (false) FAQs
    #[arg(long)]
    published: Option<bool>,
}

impl From<&FilterArgs> for FaqFilter {
    fn from(args: &FilterArgs) -> Self {
        FaqFilter {
            job_id: args.job,
            published: args.published,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Default configuration is invalid".to_string(),
    })?;

    if let Command::CheckConfig = cli.command {
        handle_check_config(&config);
        return Ok(());
    }

    tracing::debug!("Opening database: {}", config.output.database_path);
    let service = ForgeService::open(config).context("Failed to open the database")?;

    match cli.command {
        Command::Crawl { url } => handle_crawl(&service, &url).await,
        Command::Status { job_id } => {
            print_job_status(&service.job_status(job_id)?);
            Ok(())
        }
        Command::Jobs => {
            print_jobs(&service.list_jobs()?);
            Ok(())
        }
        Command::Pages { job_id } => {
            let pages = match job_id {
                Some(job_id) => service.list_pages(job_id)?,
                None => service.list_recent_pages(RECENT_PAGES_LIMIT)?,
            };
            print_pages(&pages);
            Ok(())
        }
        Command::Page { page_id } => {
            print_page(&service.get_page(page_id)?);
            Ok(())
        }
        Command::Generate(command) => handle_generate(&service, command).await,
        Command::Faqs(command) => handle_faqs(&service, command),
        Command::CheckConfig => Ok(()),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the command-line flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "faq_forge=info,warn",
            1 => "faq_forge=debug,info",
            2 => "faq_forge=trace,debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `check-config`: shows the effective settings
fn handle_check_config(config: &Config) {
    println!("=== FAQ Forge Configuration ===\n");

    println!("Crawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);

    println!("\nUser Agent:");
    println!("  Signature: {}", config.user_agent.signature());

    println!("\nGeneration:");
    println!("  API base URL: {}", config.generation.api_base_url);
    println!("  API key variable: {}", config.generation.api_key_env);
    println!("  Model: {}", config.generation.model);
    println!(
        "  Request timeout: {}s",
        config.generation.request_timeout_secs
    );
    println!("  Chunk size: {} chars", config.generation.chunk_size);
    println!(
        "  Minimum content: {} chars",
        config.generation.min_content_length
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles `crawl`: triggers a crawl and waits for the background task
async fn handle_crawl(service: &ForgeService, url: &str) -> anyhow::Result<()> {
    let trigger = service.trigger_crawl(url)?;
    println!(
        "✓ Crawl accepted: job {} (run {}), {} / {}",
        trigger.job_id, trigger.run_id, trigger.job_state, trigger.run_state
    );

    let job_id = trigger.job_id;
    match trigger.handle.await.context("Crawl task panicked")? {
        Ok(summary) => {
            println!(
                "✓ Crawl finished: {} pages crawled, {} failed",
                summary.pages_crawled, summary.pages_failed
            );
        }
        Err(e) => {
            tracing::error!(job_id, "Crawl failed: {}", e);
        }
    }

    print_job_status(&service.job_status(job_id)?);
    Ok(())
}

/// Handles `generate page` and `generate job`
async fn handle_generate(service: &ForgeService, command: GenerateCommand) -> anyhow::Result<()> {
    match command {
        GenerateCommand::Page { page_id } => {
            let result = service.generate_for_page(page_id).await?;
            if result.success {
                println!("✓ {}", result.message);
                print_faqs(&result.faqs);
            } else {
                println!("✗ {}", result.message);
            }
        }
        GenerateCommand::Job { job_id } => {
            let trigger = service.generate_for_job(job_id)?;
            println!(
                "✓ Generation started for job {} ({} pages)",
                trigger.job_id, trigger.pages
            );

            let summary = trigger
                .handle
                .await
                .context("Generation task panicked")??;
            println!(
                "✓ Generated {} FAQs ({} pages skipped, {} with too little content, {} failed)",
                summary.faqs_generated,
                summary.pages_skipped,
                summary.pages_insufficient,
                summary.pages_failed
            );
        }
    }

    Ok(())
}

/// Handles the `faqs` subcommands
fn handle_faqs(service: &ForgeService, command: FaqsCommand) -> anyhow::Result<()> {
    match command {
        FaqsCommand::List(filter) => {
            print_faqs(&service.list_faqs(FaqFilter::from(&filter))?);
        }
        FaqsCommand::Update {
            faq_id,
            question,
            answer,
            publish,
            unpublish,
        } => {
            let published = match (publish, unpublish) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let faq = service.update_faq(
                faq_id,
                FaqUpdate {
                    question,
                    answer,
                    published,
                },
            )?;
            println!("✓ Updated FAQ {}", faq.id);
            print_faqs(std::slice::from_ref(&faq));
        }
        FaqsCommand::Delete { faq_id } => {
            service.delete_faq(faq_id)?;
            println!("✓ Deleted FAQ {}", faq_id);
        }
        FaqsCommand::Export { filter, dir } => {
            let export = service.export_faqs(FaqFilter::from(&filter))?;
            let path = write_export(&export, &dir)
                .with_context(|| format!("Failed to write export to {}", dir.display()))?;
            println!("✓ Exported {} FAQs to: {}", export.total_faqs, path.display());
        }
    }

    Ok(())
}
