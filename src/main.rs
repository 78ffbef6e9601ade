//! codeq-search - quota-aware search client for the CodeQ question index.
//!
//! Thin binary wrapper: loads the environment, initializes logging, and
//! hands off to the CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeq_search::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "codeq_search=info"
    } else {
        "codeq_search=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
