mod arxiv;
mod config;
mod digest;
mod llm;
mod mail;
mod run;

pub const USER_AGENT: &str = concat!("arxiv-digest/", env!("CARGO_PKG_VERSION"));

use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use reqwest::Client;
use tracing::info;

use crate::arxiv::ArxivClient;
use crate::config::Config;
use crate::llm::OpenAiClient;
use crate::mail::{SmtpNotifier, StdoutNotifier};

/// Daily arXiv keyword digest: search, LLM-translated abstracts, email delivery.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Target date (YYYY-MM-DD); defaults to yesterday
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the digest to stdout instead of sending mail
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("arxiv_digest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let http = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let source = ArxivClient::new(http.clone());
    let enricher = OpenAiClient::new(
        http,
        &config.openai_api_key,
        &config.openai_model,
        &config.openai_api_base,
    );

    let date = cli.date.unwrap_or_else(run::yesterday);
    info!(%date, keywords = config.search_terms.len(), "starting digest run");

    let summary = if cli.dry_run {
        run::run(
            &source,
            &enricher,
            &StdoutNotifier,
            &config.search_terms,
            date,
            config.max_results,
        )
        .await
    } else {
        let notifier = SmtpNotifier::new(
            &config.smtp_server,
            config.smtp_port,
            &config.sender_email,
            config.sender_name.as_deref(),
            &config.sender_password,
            &config.recipients,
        );
        run::run(
            &source,
            &enricher,
            &notifier,
            &config.search_terms,
            date,
            config.max_results,
        )
        .await
    };

    // Both outcomes exit normally; delivery status is log-only.
    info!(
        unique = summary.unique_papers,
        delivered = summary.delivered,
        "run complete"
    );
    Ok(())
}
