//! Command-line front end for leadscout.
//!
//! Runs the scrape/enrich/save pipeline and manages the lead store.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use leadscout::config::LeadscoutConfig;
use leadscout::crawl::{EmailExtractor, HttpFetcher, LoggingCrawlObserver};
use leadscout::enrichment::{EnrichmentRetrier, GroqChatClient};
use leadscout::model::LeadRecord;
use leadscout::observability::init_tracing;
use leadscout::pipeline::{LeadPipeline, PipelineSummary};
use leadscout::store::LeadStore;

#[derive(Debug, Parser)]
#[command(name = "leadscout")]
#[command(about = "Find email leads on the web and enrich them with an LLM")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a URL or search query, enrich the leads and save them
    Run {
        /// A URL to crawl, or a search query
        input: String,

        /// Outbound links to follow from each page
        #[arg(long)]
        max_links: Option<usize>,

        /// Save leads without calling the enrichment endpoint
        #[arg(long)]
        no_enrich: bool,
    },

    /// List stored leads, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one stored lead
    Show { id: i64 },

    /// Delete one stored lead
    Delete { id: i64 },

    /// Delete every stored lead
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = LeadscoutConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(db) = &cli.db {
        config.store.path.clone_from(db);
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    init_tracing(&config.logging).context("Failed to initialise logging")?;

    let mut store = LeadStore::open(&config.store.path)
        .with_context(|| format!("Failed to open {}", config.store.path.display()))?;

    match cli.command {
        Commands::Run {
            input,
            max_links,
            no_enrich,
        } => {
            if let Some(max_links) = max_links {
                config.crawl.extraction.max_links = max_links;
            }
            let summary = run(&config, &input, no_enrich, &mut store).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if let Some(err) = &summary.store_error {
                bail!("Leads were not saved: {err}");
            }
        }
        Commands::List { json } => {
            let leads = store.fetch_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&leads)?);
            } else {
                print_table(&leads);
            }
        }
        Commands::Show { id } => match store.get(id)? {
            Some(lead) => println!("{}", serde_json::to_string_pretty(&lead)?),
            None => bail!("No lead with id {id}"),
        },
        Commands::Delete { id } => {
            if store.delete(id)? {
                println!("Deleted lead {id}");
            } else {
                println!("No lead with id {id}");
            }
        }
        Commands::Clear => {
            let removed = store.delete_all()?;
            println!("Deleted {removed} leads");
        }
    }

    Ok(())
}

async fn run(
    config: &LeadscoutConfig,
    input: &str,
    no_enrich: bool,
    store: &mut LeadStore,
) -> Result<PipelineSummary> {
    let fetcher = HttpFetcher::new(config.crawl.fetch.clone())?;
    let extractor = EmailExtractor::with_config(fetcher, config.crawl.extraction.clone())
        .with_observer(std::sync::Arc::new(LoggingCrawlObserver));

    let pipeline = if no_enrich {
        LeadPipeline::<_, GroqChatClient>::without_enrichment(extractor)
    } else {
        let enrichment = &config.enrichment;
        let client = GroqChatClient::new(enrichment.require_api_key()?)?
            .with_model(&enrichment.model)
            .with_base_url(&enrichment.base_url);
        LeadPipeline::new(
            extractor,
            EnrichmentRetrier::new(client, enrichment.retry_policy()),
        )
    };

    tracing::info!(input = %input, "Starting run");
    Ok(pipeline.run(input, store).await)
}

fn print_table(leads: &[LeadRecord]) {
    if leads.is_empty() {
        println!("No leads stored");
        return;
    }

    println!("{:>6}  {:<40}  {:<40}  EMAILS", "ID", "TITLE", "URL");
    for lead in leads {
        println!(
            "{:>6}  {:<40}  {:<40}  {}",
            lead.id.unwrap_or_default(),
            truncate(lead.title_or_placeholder(), 40),
            truncate(lead.url_or_placeholder(), 40),
            lead.emails_joined()
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
