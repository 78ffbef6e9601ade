//! CLI parser and command implementations.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::gateway::{
    GatewayError, SearchGateway, SearchQuery, SearchResultPage, SortKey, SortOrder,
    DEFAULT_PAGE_SIZE,
};

#[derive(Parser)]
#[command(name = "codeq-search")]
#[command(about = "Quota-aware search client for the CodeQ question index")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key for the search provider (raises the request quota)
    #[arg(short, long, global = true, env = "CODEQ_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Search questions on the configured site
    Search {
        /// Free-text query
        query: String,

        /// Result page to fetch (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Results per page
        #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
        pagesize: u32,

        /// Sort key
        #[arg(short, long, value_enum, default_value_t = SortKey::Activity)]
        sort: SortKey,

        /// Sort order
        #[arg(short, long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,

        /// Restrict results to questions carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Print the result page as JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config,
}

/// Parse arguments and dispatch to the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(key) = cli.key {
        settings.gateway.key = Some(key);
    }

    match cli.command {
        Commands::Search {
            query,
            page,
            pagesize,
            sort,
            order,
            tag,
            json,
        } => {
            let mut search = SearchQuery::new(query)
                .page(page)
                .page_size(pagesize)
                .sort(sort)
                .order(order);
            if let Some(tag) = tag {
                search = search.tagged(tag);
            }
            cmd_search(&settings, &search, json).await
        }
        Commands::Config => cmd_config(&settings),
    }
}

/// Run one search call and render the result page.
async fn cmd_search(settings: &Settings, query: &SearchQuery, json: bool) -> anyhow::Result<()> {
    let gateway = SearchGateway::new(settings.gateway.clone())?;

    let spinner = if json {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        bar.set_message(format!("searching {}...", settings.gateway.site));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    };

    let result = gateway.search(query).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match result {
        Ok(page) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_page(&page);
            }
            Ok(())
        }
        Err(GatewayError::RateLimited(secs)) => {
            eprintln!(
                "{} rate limited, wait {}s before retrying",
                style("!").yellow().bold(),
                secs
            );
            Err(GatewayError::RateLimited(secs).into())
        }
        Err(e) => {
            eprintln!("{} search failed: {}", style("✗").red().bold(), e);
            Err(e.into())
        }
    }
}

/// Render a result page for the terminal.
fn print_page(page: &SearchResultPage) {
    if page.items.is_empty() {
        println!("{}", style("No results.").dim());
    }

    for item in &page.items {
        let marker = if item.accepted_answer_id.is_some() {
            style("✓").green().bold()
        } else if item.is_answered {
            style("✓").green()
        } else {
            style("·").dim()
        };

        println!("{} {:>5}  {}", marker, item.score, style(&item.title).bold());
        println!("         {}", style(&item.link).blue().underlined());

        let mut meta = Vec::new();
        if !item.tags.is_empty() {
            meta.push(format!("[{}]", item.tags.join("] [")));
        }
        meta.push(format!("{} answers", item.answer_count));
        meta.push(format!("{} views", item.view_count));
        if let Some(owner) = item.owner.as_ref().and_then(|o| o.display_name.as_deref()) {
            meta.push(format!("by {}", owner));
        }
        println!("         {}", style(meta.join("  ")).dim());
    }

    let mut footer = Vec::new();
    if page.has_more {
        footer.push("more results available (use --page)".to_string());
    }
    if let Some(quota) = page.quota_remaining {
        footer.push(format!("quota remaining: {}", quota));
    }
    if let Some(secs) = page.backoff_seconds {
        footer.push(format!("upstream backoff: {}s", secs));
    }
    if !footer.is_empty() {
        println!();
        println!("{}", style(footer.join("  |  ")).dim());
    }
}

/// Print the resolved configuration with the API key masked.
fn cmd_config(settings: &Settings) -> anyhow::Result<()> {
    let mut masked = settings.clone();
    if masked.gateway.key.is_some() {
        masked.gateway.key = Some("********".to_string());
    }
    print!("{}", toml::to_string_pretty(&masked)?);
    Ok(())
}
