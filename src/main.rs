//! # arxiv_notify
//!
//! A keyword feed monitor for the arXiv search API. Each run searches the feed
//! once per configured keyword, keeps the papers updated within a recent
//! window, groups them under the subject tags the reader cares about and
//! delivers the result as an HTML report.
//!
//! ## Usage
//!
//! ```sh
//! arxiv_notify -c ./arxiv_notify.yaml
//! arxiv_notify -c ./arxiv_notify.yaml --dry-run -o ./reports
//! ```
//!
//! ## Pipeline
//!
//! 1. **Fetching**: page through the search feed for each keyword, one
//!    request at a time, until a record falls outside the history window
//! 2. **Normalizing**: turn raw feed entries into [`models::ArticleRecord`]s
//! 3. **Aggregating**: merge records across keywords by link and bucket them
//!    by tag of interest
//! 4. **Assembling**: render each bucket, listing papers already shown under
//!    an earlier tag as cross-references
//! 5. **Delivery**: send the document to every configured Telegram chat,
//!    optionally keeping an HTML and JSON copy on disk

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregate;
mod cli;
mod config;
mod delivery;
mod error;
mod feed;
mod models;
mod outputs;
mod utils;

use aggregate::aggregate;
use cli::Cli;
use config::{AppConfig, ConfigOverrides};
use delivery::{Deliver, TelegramDelivery};
use feed::fetcher::{HttpTransport, PageFetcher};
use models::{ArticleRecord, Keyword};
use outputs::html::{self, Assembled};
use outputs::json::{self, RunSnapshot};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("arxiv_notify starting up");

    let args = Cli::parse();
    debug!(config = %args.config.display(), output_dir = ?args.output_dir, dry_run = args.dry_run, "Parsed CLI arguments");

    let overrides = ConfigOverrides {
        telegram_bot_token: args.telegram_bot_token.clone(),
        require_delivery: !args.dry_run,
    };
    let config = match AppConfig::load(&args.config, &overrides) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Early check: a bad output path should fail before any request is made
    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Fetch every keyword, one request at a time ----
    let mut fetcher = PageFetcher::new(
        HttpTransport::new()?,
        config.feed.api_base.clone(),
        config.feed.max_pages,
    );
    let mut per_keyword: Vec<(Keyword, Vec<ArticleRecord>)> = Vec::with_capacity(config.keywords.len());
    let mut failed_keywords: Vec<Keyword> = Vec::new();

    for keyword in &config.keywords {
        let report = fetcher
            .fetch(std::slice::from_ref(keyword), config.history_days)
            .await;
        let failed = report.error().is_some();
        if failed {
            failed_keywords.push(keyword.clone());
        }
        info!(%keyword, count = report.records.len(), pages = report.pages, failed, "Fetched keyword");
        per_keyword.push((keyword.clone(), report.records));
    }

    let aggregation = aggregate(&per_keyword, &config.tags);
    info!(
        unique_records = aggregation.unique_records,
        tags_seen = aggregation.all_tags.len(),
        failed_keywords = failed_keywords.len(),
        "Aggregation complete"
    );

    // ---- Assemble ----
    let date = Local::now().date_naive();

    if let Some(dir) = &args.output_dir {
        let snapshot = RunSnapshot {
            date,
            generated_at: Utc::now(),
            keywords: &config.keywords,
            failed_keywords: failed_keywords.clone(),
            aggregation: &aggregation,
        };
        if let Err(e) = json::write_snapshot(&snapshot, dir).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    }

    let report = match html::assemble(&aggregation, date) {
        Assembled::Report(report) => report,
        Assembled::NoContent => {
            info!(
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "No new papers for the configured tags; nothing to deliver"
            );
            return Ok(());
        }
    };
    let document = html::render_document(&report);

    if let Some(dir) = &args.output_dir {
        if let Err(e) = json::write_document(&document, date, dir).await {
            error!(error = %e, "Failed to write HTML document");
        }
    }

    // ---- Delivery ----
    match &config.telegram {
        Some(telegram) if !args.dry_run => {
            let delivery = TelegramDelivery::new(telegram)?;
            if let Err(e) = delivery.deliver(&report.subject, &document).await {
                error!(subject = %report.subject, error = %e, "Delivery failed");
                return Err(e.into());
            }
        }
        _ => warn!(subject = %report.subject, "Dry run; report not delivered"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = report.total_articles,
        failed_keywords = failed_keywords.len(),
        "Execution complete"
    );

    Ok(())
}
