//! Paginated retrieval of the search feed for one keyword set.
//!
//! # Ordering contract
//!
//! The fetcher asks the API for results sorted by `lastUpdatedDate`,
//! descending, and relies on the feed honoring that order: every page is
//! assumed to be no newer than the oldest record of the page before it. This
//! is what makes it safe to stop at the first record older than the cutoff.
//!
//! When the feed breaks that contract the behavior is still defined: each
//! record newer than its predecessor is counted in
//! [`FetchReport::order_violations`] and logged, and pagination still stops at
//! the first stale record in feed order. In-window records that arrive after
//! it are not collected.
//!
//! # Politeness
//!
//! After every non-empty page the fetcher sleeps [`POLITENESS_DELAY`] before
//! going on, and no request is issued less than [`POLITENESS_DELAY`] after the
//! previous one from the same fetcher. A run uses a single fetcher for all of
//! its keywords, so the spacing holds across keywords too.

use crate::error::FeedError;
use crate::feed::atom::parse_feed;
use crate::feed::normalize::{normalize, parse_timestamp};
use crate::feed::query::page_url;
use crate::models::{ArticleRecord, Keyword};
use crate::utils::truncate_for_log;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Number of results requested per page.
pub const PAGE_SIZE: usize = 30;

/// Pause between successive requests to the API.
pub const POLITENESS_DELAY: Duration = Duration::from_secs(3);

/// Client identification sent with every request.
pub const USER_AGENT: &str = concat!("arxiv_notify/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_API_BASE: &str = "http://export.arxiv.org/api/query";

/// Default bound on the number of pages fetched for one keyword.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Source of raw feed pages.
pub trait FeedTransport {
    /// Fetch the body of one page.
    async fn get(&self, url: &Url) -> Result<String, FeedError>;
}

impl<T: FeedTransport + ?Sized> FeedTransport for &T {
    async fn get(&self, url: &Url) -> Result<String, FeedError> {
        (**self).get(url).await
    }
}

/// [`FeedTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl FeedTransport for HttpTransport {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &Url) -> Result<String, FeedError> {
        let t0 = std::time::Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&body, 300),
                "Feed request rejected"
            );
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched feed page"
        );
        Ok(body)
    }
}

/// Pagination state for one keyword set.
#[derive(Debug)]
pub enum FetchState {
    /// Next page to request.
    Fetching { page: usize },
    Done,
    Failed(FeedError),
}

/// Everything collected for one keyword set.
#[derive(Debug)]
pub struct FetchReport {
    /// Normalized records in feed order, including the first stale one.
    pub records: Vec<ArticleRecord>,
    /// Pages successfully retrieved and decoded.
    pub pages: usize,
    /// Entries dropped by the normalizer.
    pub skipped_entries: usize,
    /// Records that were newer than the record before them.
    pub order_violations: usize,
    /// Feed `updated` of the first page minus the history window.
    pub cutoff: Option<DateTime<Utc>>,
    pub state: FetchState,
}

impl Default for FetchReport {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            pages: 0,
            skipped_entries: 0,
            order_violations: 0,
            cutoff: None,
            state: FetchState::Fetching { page: 0 },
        }
    }
}

impl FetchReport {
    pub fn error(&self) -> Option<&FeedError> {
        match &self.state {
            FetchState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Walks the result pages of the search feed.
pub struct PageFetcher<T> {
    transport: T,
    api_base: String,
    max_pages: usize,
    last_request: Option<Instant>,
}

impl<T: FeedTransport> PageFetcher<T> {
    pub fn new(transport: T, api_base: impl Into<String>, max_pages: usize) -> Self {
        Self {
            transport,
            api_base: api_base.into(),
            max_pages,
            last_request: None,
        }
    }

    /// Collect every record updated within `history_days` of the feed's own
    /// timestamp, plus the first record past that boundary.
    ///
    /// # Arguments
    ///
    /// * `keywords` - Search terms, OR-joined into one query
    /// * `history_days` - Length of the reporting window, counted back from
    ///   the feed-level `updated` of the first page
    ///
    /// # Returns
    ///
    /// A [`FetchReport`] whose `state` is [`FetchState::Done`] or
    /// [`FetchState::Failed`]. Never returns an error directly: a failed
    /// request ends pagination in `Failed` and the records gathered before it
    /// are kept. The failure is logged here at `error`.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&mut self, keywords: &[Keyword], history_days: u32) -> FetchReport {
        let window = TimeDelta::days(i64::from(history_days));
        let mut report = FetchReport::default();

        while let FetchState::Fetching { page } = report.state {
            let next = self.step(keywords, page, window, &mut report).await;
            report.state = next;
        }

        match &report.state {
            FetchState::Failed(e) => error!(
                error = %e,
                pages = report.pages,
                kept = report.records.len(),
                "Pagination aborted"
            ),
            _ => info!(
                pages = report.pages,
                count = report.records.len(),
                skipped = report.skipped_entries,
                order_violations = report.order_violations,
                cutoff = ?report.cutoff,
                "Pagination complete"
            ),
        }
        report
    }

    async fn step(
        &mut self,
        keywords: &[Keyword],
        page: usize,
        window: TimeDelta,
        report: &mut FetchReport,
    ) -> FetchState {
        if page >= self.max_pages {
            warn!(max_pages = self.max_pages, "Page limit reached; stopping");
            return FetchState::Done;
        }

        let offset = page * PAGE_SIZE;
        let url = match page_url(&self.api_base, keywords, offset, PAGE_SIZE) {
            Ok(url) => url,
            Err(e) => return FetchState::Failed(e.into()),
        };

        self.pace().await;
        debug!(page, offset, "Requesting page");
        let body = match self.transport.get(&url).await {
            Ok(body) => body,
            Err(e) => return FetchState::Failed(e),
        };
        let feed = match parse_feed(&body) {
            Ok(feed) => feed,
            Err(e) => {
                warn!(page, preview = %truncate_for_log(&body, 200), "Undecodable page");
                return FetchState::Failed(e);
            }
        };
        report.pages += 1;

        if feed.entries.is_empty() {
            debug!(page, "Empty page");
            return FetchState::Done;
        }

        let cutoff = match report.cutoff {
            Some(cutoff) => cutoff,
            None => match feed.updated.as_deref().and_then(parse_timestamp) {
                Some(feed_updated) => {
                    // A window reaching past the calendar keeps every record.
                    let cutoff = feed_updated
                        .checked_sub_signed(window)
                        .unwrap_or(DateTime::<Utc>::MIN_UTC);
                    report.cutoff = Some(cutoff);
                    cutoff
                }
                None => return FetchState::Failed(FeedError::MissingFeedTimestamp),
            },
        };

        sleep(POLITENESS_DELAY).await;

        for raw in feed.entries {
            let record = match normalize(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(page, error = %e, "Skipping malformed entry");
                    report.skipped_entries += 1;
                    continue;
                }
            };

            if report
                .records
                .last()
                .is_some_and(|prev| record.updated > prev.updated)
            {
                report.order_violations += 1;
                warn!(link = %record.link, updated = %record.updated, "Feed out of descending order");
            }

            let stale = record.updated < cutoff;
            report.records.push(record);
            if stale {
                debug!(page, %cutoff, "Crossed cutoff");
                return FetchState::Done;
            }
        }

        FetchState::Fetching { page: page + 1 }
    }

    async fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < POLITENESS_DELAY {
                sleep(POLITENESS_DELAY - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
